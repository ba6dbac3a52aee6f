use chrono::{SecondsFormat, Utc};
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};

use crate::placement::{ItemArray, LookupWarning, UnmappedReport};
use crate::Result;

pub const ITEM_ARRAY_JSON: &str = "itemArray.json";
pub const ITEM_ARRAY_JS: &str = "itemArray.js";
pub const UNMAPPED_LOCATIONS_JSON: &str = "unmapped_item_locations.json";
pub const WARNINGS_JSON: &str = "unmapped_location_warnings.json";
pub const PREFIX_TXT: &str = "seedMetadataPrefix.txt";

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct WarningSummary {
    pub total_warnings: usize,
    pub timestamp: String,
}

/// Persisted form of the lookup warnings from one run.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct WarningLog {
    pub summary: WarningSummary,
    pub warnings: Vec<LookupWarning>,
}

impl WarningLog {
    pub fn new(warnings: Vec<LookupWarning>) -> Self {
        Self {
            summary: WarningSummary {
                total_warnings: warnings.len(),
                timestamp: Utc::now().to_rfc3339_opts(SecondsFormat::Millis, true),
            },
            warnings,
        }
    }
}

/// CommonJS module exporting the array, for clients that `require` it.
pub fn item_array_module(array: &ItemArray) -> Result<String> {
    let body = serde_json::to_string_pretty(&array.to_json_value())?;
    let sentinel = array.sentinel().render();
    Ok(format!(
        "// Item array where index corresponds to detailedMapValue and value is item ID\n\
         // {sentinel} indicates no item found at that location\n\
         const itemArray = {body};\n\
         \n\
         module.exports = itemArray;\n"
    ))
}

/// Paths written by [`write_artifacts`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Artifacts {
    pub item_array_json: PathBuf,
    pub item_array_js: PathBuf,
    pub unmapped_locations: PathBuf,
    pub warnings: PathBuf,
}

/// Writes the item array and its companion diagnostics into `dir`.
pub fn write_artifacts(
    dir: &Path,
    array: &ItemArray,
    unmapped: &UnmappedReport,
    warnings: &WarningLog,
) -> Result<Artifacts> {
    fs::create_dir_all(dir)?;

    let artifacts = Artifacts {
        item_array_json: dir.join(ITEM_ARRAY_JSON),
        item_array_js: dir.join(ITEM_ARRAY_JS),
        unmapped_locations: dir.join(UNMAPPED_LOCATIONS_JSON),
        warnings: dir.join(WARNINGS_JSON),
    };

    fs::write(
        &artifacts.unmapped_locations,
        serde_json::to_string_pretty(unmapped)?,
    )?;
    fs::write(&artifacts.warnings, serde_json::to_string_pretty(warnings)?)?;
    fs::write(
        &artifacts.item_array_json,
        serde_json::to_string_pretty(&array.to_json_value())?,
    )?;
    fs::write(&artifacts.item_array_js, item_array_module(array)?)?;

    Ok(artifacts)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::placement::{encode, Sentinel, SLOT_COUNT};
    use crate::spoiler::SpoilerLog;
    use crate::tables::{ItemTable, LocationTable};
    use serde_json::{json, Value};

    #[test]
    fn module_mentions_sentinel_and_exports_array() {
        let array = ItemArray::new(Sentinel::Numeric);
        let module = item_array_module(&array).unwrap();
        assert!(module.starts_with("// Item array where index"));
        assert!(module.contains("// -1 indicates no item found"));
        assert!(module.trim_end().ends_with("module.exports = itemArray;"));
    }

    #[test]
    fn writes_all_artifacts() {
        let dir = tempfile::tempdir().unwrap();

        let spoiler: SpoilerLog = json!({
            "Light World": { "Sanctuary:1": "Bow:1", "Secret Cave:1": "Bow:1" }
        })
        .to_string()
        .parse()
        .unwrap();
        let items: ItemTable = json!({ "Bow": { "id": 11 } }).to_string().parse().unwrap();
        let locations: LocationTable = json!({ "Sanctuary": { "detailedMapValue": 9 } })
            .to_string()
            .parse()
            .unwrap();

        let placement = encode(&spoiler, &items, &locations, Sentinel::Numeric);
        let unmapped = placement.unmapped_report(None);
        let warnings = WarningLog::new(placement.warnings.clone());

        let out = dir.path().join("out");
        let artifacts = write_artifacts(&out, &placement.items, &unmapped, &warnings).unwrap();

        let array: Value =
            serde_json::from_str(&fs::read_to_string(&artifacts.item_array_json).unwrap()).unwrap();
        assert_eq!(array.as_array().unwrap().len(), SLOT_COUNT);
        assert_eq!(array[9], json!("011"));
        assert_eq!(array[0], json!(-1));

        let report: Value =
            serde_json::from_str(&fs::read_to_string(&artifacts.unmapped_locations).unwrap())
                .unwrap();
        assert_eq!(report["summary"]["mappedCount"], json!(1));
        assert_eq!(report["unmappedLocations"][0]["detailedMapName"], json!("Unknown"));

        let saved: WarningLog =
            serde_json::from_str(&fs::read_to_string(&artifacts.warnings).unwrap()).unwrap();
        assert_eq!(saved.summary.total_warnings, 1);
        assert_eq!(saved.warnings[0].location_name, "Secret Cave");
        assert!(saved.summary.timestamp.ends_with('Z'));

        assert!(artifacts.item_array_js.exists());
    }
}
