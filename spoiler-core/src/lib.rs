use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};
use thiserror::Error;

pub mod names;
pub mod placement;
pub mod prefix;
pub mod report;
pub mod spoiler;
pub mod tables;

pub use placement::{encode, ItemArray, ItemCode, LookupWarning, Placement, Sentinel, SLOT_COUNT};
pub use prefix::{encode_prefix, SettingsPrefix};
pub use spoiler::SpoilerLog;
pub use tables::{describe_location, CanonicalIndexTable, ItemTable, LocationTable};

use placement::UnmappedReport;
use report::{write_artifacts, Artifacts, WarningLog, PREFIX_TXT};

pub const ITEM_TABLE_FILE: &str = "itemNameToFullItemMap.json";
pub const LOCATION_TABLE_FILE: &str = "spoilerToDetailedMap.json";
pub const CANONICAL_TABLE_FILE: &str = "detailedMap.json";

#[derive(Debug, Error)]
pub enum SpoilerError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
    #[error("invalid input: {0}")]
    InvalidInput(String),
    #[error("unmapped {field} value '{value}'")]
    UnmappedCategory { field: &'static str, value: String },
}

pub type Result<T> = std::result::Result<T, SpoilerError>;

/// Where the three lookup tables live on disk.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TablePaths {
    pub items: PathBuf,
    pub locations: PathBuf,
    /// Only needed for labelling unfilled slots.
    pub canonical: Option<PathBuf>,
}

impl TablePaths {
    /// The upstream file names inside `dir`. The canonical table is used only
    /// if it exists.
    pub fn in_dir(dir: &Path) -> Self {
        let canonical = dir.join(CANONICAL_TABLE_FILE);
        Self {
            items: dir.join(ITEM_TABLE_FILE),
            locations: dir.join(LOCATION_TABLE_FILE),
            canonical: canonical.exists().then_some(canonical),
        }
    }
}

/// Lookup tables for one encoding run.
#[derive(Debug, Clone, Default)]
pub struct Tables {
    pub items: ItemTable,
    pub locations: LocationTable,
    pub canonical: Option<CanonicalIndexTable>,
}

impl Tables {
    pub fn load(paths: &TablePaths) -> Result<Self> {
        let items = ItemTable::from_json_str(&read_input(&paths.items)?)?;
        let locations = LocationTable::from_json_str(&read_input(&paths.locations)?)?;
        let canonical = match &paths.canonical {
            Some(path) => Some(CanonicalIndexTable::from_json_str(&read_input(path)?)?),
            None => None,
        };

        tracing::debug!(
            items = items.len(),
            locations = locations.len(),
            canonical = canonical.as_ref().map_or(0, CanonicalIndexTable::len),
            "loaded lookup tables"
        );

        Ok(Self {
            items,
            locations,
            canonical,
        })
    }
}

fn read_input(path: &Path) -> Result<String> {
    if !path.exists() {
        return Err(SpoilerError::InvalidInput(format!(
            "Input path does not exist: {}",
            path.display()
        )));
    }
    Ok(fs::read_to_string(path)?)
}

pub fn load_spoiler_log(path: &Path) -> Result<SpoilerLog> {
    SpoilerLog::from_json_str(&read_input(path)?)
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct EncoderSettings {
    pub spoiler_log_path: PathBuf,
    pub tables: TablePaths,
    pub output_path: PathBuf,
    pub sentinel: Sentinel,
}

/// Everything a caller needs to report on a finished run.
///
/// A prefix failure does not stop the item array from being written; it is
/// carried here so the caller can report it after the artifacts exist.
#[derive(Debug)]
pub struct RunSummary {
    pub placement: Placement,
    pub prefix: Result<SettingsPrefix>,
    pub unmapped: UnmappedReport,
    pub artifacts: Artifacts,
    /// Set only when the prefix was encoded and written.
    pub prefix_path: Option<PathBuf>,
}

/// Encodes a spoiler log from disk and writes every artifact into
/// `settings.output_path`, rendering unfilled slots with `settings.sentinel`.
pub fn run(settings: EncoderSettings) -> Result<RunSummary> {
    let log = load_spoiler_log(&settings.spoiler_log_path)?;
    let tables = Tables::load(&settings.tables)?;

    tracing::info!(sections = log.len(), "generating from spoiler log");

    let placement = encode(&log, &tables.items, &tables.locations, settings.sentinel);
    let unmapped = placement.unmapped_report(tables.canonical.as_ref());
    let warnings = WarningLog::new(placement.warnings.clone());

    let artifacts = write_artifacts(&settings.output_path, &placement.items, &unmapped, &warnings)?;

    tracing::info!(
        placed = placement.items.placed_count(),
        warnings = placement.warnings.len(),
        "item array generated"
    );

    let prefix = encode_prefix(&log);
    let path = settings.output_path.join(PREFIX_TXT);
    let prefix_path = match &prefix {
        Ok(prefix) => {
            fs::write(&path, prefix.as_str())?;
            Some(path)
        }
        Err(err) => {
            tracing::error!("settings prefix not generated: {err}");
            // A prefix left over from an earlier run would not match this log.
            if path.exists() {
                fs::remove_file(&path)?;
            }
            None
        }
    };

    Ok(RunSummary {
        placement,
        prefix,
        unmapped,
        artifacts,
        prefix_path,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn write_json(dir: &Path, name: &str, value: serde_json::Value) -> PathBuf {
        let path = dir.join(name);
        fs::write(&path, value.to_string()).unwrap();
        path
    }

    fn fixture(dir: &Path) -> PathBuf {
        write_json(
            dir,
            ITEM_TABLE_FILE,
            json!({
                "Progressive Sword": { "id": 153, "longName": "Progressive Sword" },
                "Bow": { "id": 11, "longName": "Bow" }
            }),
        );
        write_json(
            dir,
            LOCATION_TABLE_FILE,
            json!({
                "Link's House": { "detailedMapValue": 0 },
                "Sanctuary": { "detailedMapValue": 9 }
            }),
        );
        write_json(
            dir,
            CANONICAL_TABLE_FILE,
            json!({ "Link's House": 0, "Sanctuary": 9, "Pyramid": 153 }),
        );
        write_json(
            dir,
            "spoiler.json",
            json!({
                "meta": { "mode": "inverted", "goal": "triforce" },
                "Special": { "Misery Mire Medallion:1": "Quake Medallion:1" },
                "Light World": {
                    "Link's House:1": "Progressive Sword:1",
                    "Sanctuary:1": "Bow:1",
                    "Hidden Grotto:1": "Bow:1"
                }
            }),
        )
    }

    #[test]
    fn run_writes_artifacts_and_prefix() {
        let dir = tempfile::tempdir().unwrap();
        let spoiler_log_path = fixture(dir.path());
        let output_path = dir.path().join("hotfix");

        let summary = run(EncoderSettings {
            spoiler_log_path,
            tables: TablePaths::in_dir(dir.path()),
            output_path: output_path.clone(),
            sentinel: Sentinel::Numeric,
        })
        .unwrap();

        assert_eq!(summary.placement.items.placed_count(), 2);
        assert_eq!(summary.placement.warnings.len(), 1);
        let prefix = summary.prefix.as_ref().unwrap();
        assert_eq!(prefix.settings(), "00030020020");
        assert_eq!(
            fs::read_to_string(summary.prefix_path.as_ref().unwrap()).unwrap(),
            prefix.as_str()
        );
        assert_eq!(
            summary.unmapped.unmapped_locations[151].detailed_map_name,
            "Pyramid"
        );
        assert!(output_path.join(report::ITEM_ARRAY_JS).exists());
    }

    #[test]
    fn log_without_meta_still_writes_item_array() {
        let dir = tempfile::tempdir().unwrap();
        fixture(dir.path());
        let spoiler_log_path = write_json(
            dir.path(),
            "no_meta.json",
            json!({ "Light World": { "Sanctuary:1": "Bow:1" } }),
        );
        let output_path = dir.path().join("out");
        fs::create_dir_all(&output_path).unwrap();
        fs::write(output_path.join(PREFIX_TXT), "stale").unwrap();

        let summary = run(EncoderSettings {
            spoiler_log_path,
            tables: TablePaths::in_dir(dir.path()),
            output_path: output_path.clone(),
            sentinel: Sentinel::Numeric,
        })
        .unwrap();

        assert!(matches!(summary.prefix, Err(SpoilerError::InvalidInput(_))));
        assert!(summary.prefix_path.is_none());
        assert!(!output_path.join(PREFIX_TXT).exists());

        let array: serde_json::Value =
            serde_json::from_str(&fs::read_to_string(&summary.artifacts.item_array_json).unwrap())
                .unwrap();
        assert_eq!(array[9], json!("011"));
        assert!(summary.artifacts.warnings.exists());
    }

    #[test]
    fn run_renders_the_requested_sentinel() {
        let dir = tempfile::tempdir().unwrap();
        let spoiler_log_path = fixture(dir.path());

        let summary = run(EncoderSettings {
            spoiler_log_path,
            tables: TablePaths::in_dir(dir.path()),
            output_path: dir.path().join("memory"),
            sentinel: Sentinel::Zeros,
        })
        .unwrap();

        let array: serde_json::Value =
            serde_json::from_str(&fs::read_to_string(&summary.artifacts.item_array_json).unwrap())
                .unwrap();
        assert_eq!(array[1], json!("000"));
        assert_eq!(array[0], json!("153"));
    }

    #[test]
    fn missing_table_is_reported() {
        let dir = tempfile::tempdir().unwrap();
        let spoiler_log_path = fixture(dir.path());
        fs::remove_file(dir.path().join(LOCATION_TABLE_FILE)).unwrap();

        let err = run(EncoderSettings {
            spoiler_log_path,
            tables: TablePaths::in_dir(dir.path()),
            output_path: dir.path().join("out"),
            sentinel: Sentinel::Numeric,
        })
        .unwrap_err();
        assert!(matches!(err, SpoilerError::InvalidInput(_)));
    }

    #[test]
    fn table_paths_skip_missing_canonical_table() {
        let dir = tempfile::tempdir().unwrap();
        assert!(TablePaths::in_dir(dir.path()).canonical.is_none());

        fixture(dir.path());
        assert!(TablePaths::in_dir(dir.path()).canonical.is_some());
    }
}
