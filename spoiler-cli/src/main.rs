use clap::{Parser, Subcommand, ValueEnum};
use std::fs;
use std::path::{Path, PathBuf};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

use spoiler_core::{
    describe_location, encode, encode_prefix, load_spoiler_log, run, EncoderSettings, ItemTable,
    RunSummary, Sentinel, SpoilerError, SpoilerLog, TablePaths, Tables, ITEM_TABLE_FILE,
};

mod config;

use config::{load_config, save_config, CliConfig, StoredLog};

const DEFAULT_TABLES_DIR: &str = "hotfix";

#[derive(Debug, Parser)]
#[command(
    name = "z3r-spoiler",
    version,
    about = "Encode ALttP randomizer spoiler logs for the Z3R simulator"
)]
struct Args {
    #[arg(long, global = true, default_value_t = false)]
    debug: bool,

    #[command(subcommand)]
    command: Command,
}

#[derive(Copy, Clone, Debug, Eq, PartialEq, ValueEnum)]
enum SentinelArg {
    /// Unfilled slots are -1 (file artifacts)
    Numeric,
    /// Unfilled slots are "000" (in-memory client)
    Zeros,
}

impl From<SentinelArg> for Sentinel {
    fn from(arg: SentinelArg) -> Self {
        match arg {
            SentinelArg::Numeric => Sentinel::Numeric,
            SentinelArg::Zeros => Sentinel::Zeros,
        }
    }
}

#[derive(Debug, Subcommand)]
enum Command {
    /// Encode a spoiler log into the item array and write all artifacts
    Encode {
        /// Spoiler log JSON; the stored log is used when omitted
        #[arg(long)]
        spoiler_log: Option<PathBuf>,

        /// Directory holding the three lookup tables
        #[arg(long)]
        tables: Option<PathBuf>,

        /// Directory for the artifacts; defaults to the tables directory
        #[arg(long)]
        output: Option<PathBuf>,

        #[arg(long, value_enum, default_value_t = SentinelArg::Numeric)]
        sentinel: SentinelArg,

        /// Remember --tables and --output for later runs
        #[arg(long, default_value_t = false)]
        remember: bool,
    },

    /// Print the 40-character settings prefix
    Prefix {
        #[arg(long)]
        spoiler_log: Option<PathBuf>,
    },

    /// Rewrite the item table ordered by ascending id
    SortItems {
        /// Item table JSON; defaults to the one in the tables directory
        #[arg(long)]
        items: Option<PathBuf>,
    },

    /// Show which item the spoiler log places at a canonical index
    Describe {
        index: usize,

        #[arg(long)]
        spoiler_log: Option<PathBuf>,

        #[arg(long)]
        tables: Option<PathBuf>,
    },

    /// Manage the stored spoiler log
    Store {
        #[command(subcommand)]
        action: StoreAction,
    },
}

#[derive(Debug, Subcommand)]
enum StoreAction {
    /// Copy a spoiler log into the store
    Save { path: PathBuf },
    /// Report whether a spoiler log is stored
    Status,
    /// Delete the stored spoiler log
    Clear,
}

fn init_tracing(debug: bool) {
    let default = if debug {
        "spoiler_core=debug,z3r_spoiler=debug"
    } else {
        "spoiler_core=info,z3r_spoiler=info"
    };

    tracing_subscriber::registry()
        .with(EnvFilter::try_from_default_env().unwrap_or_else(|_| default.into()))
        .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
        .init();
}

fn tables_dir(flag: Option<PathBuf>, cfg: &CliConfig) -> PathBuf {
    flag.or_else(|| cfg.tables_dir.clone())
        .unwrap_or_else(|| PathBuf::from(DEFAULT_TABLES_DIR))
}

fn stored_log() -> Result<StoredLog, SpoilerError> {
    StoredLog::locate().ok_or_else(|| {
        SpoilerError::InvalidInput("no data directory available for the stored log".to_string())
    })
}

/// An explicit path wins; otherwise fall back to the stored log.
fn spoiler_log_path(flag: Option<PathBuf>) -> Result<PathBuf, SpoilerError> {
    if let Some(path) = flag {
        return Ok(path);
    }

    let stored = stored_log()?;
    if stored.exists() {
        tracing::info!("using stored spoiler log {}", stored.path().display());
        return Ok(stored.path().clone());
    }

    Err(SpoilerError::InvalidInput(
        "no --spoiler-log given and no stored log; run `store save <path>` first".to_string(),
    ))
}

fn print_summary(summary: &RunSummary) {
    let array = &summary.placement.items;

    println!("Item array generated successfully!");
    println!("Array length: {}", array.len());
    println!("Items placed: {}", array.placed_count());
    println!("Empty slots: {}", summary.unmapped.summary.unmapped_count);
    match &summary.prefix {
        Ok(prefix) => println!("Seed metadata prefix: {prefix}"),
        Err(err) => println!("Seed metadata prefix not generated: {err}"),
    }

    let top: Vec<String> = array
        .distribution()
        .into_iter()
        .take(10)
        .map(|(code, n)| format!("{code}: {n}"))
        .collect();
    if !top.is_empty() {
        println!("Item distribution (top 10): {}", top.join(", "));
    }

    if !summary.unmapped.unmapped_locations.is_empty() {
        println!();
        println!("Unmapped locations:");
        for loc in &summary.unmapped.unmapped_locations {
            println!("  Index {}: {}", loc.index, loc.detailed_map_name);
        }
    }

    if !summary.placement.warnings.is_empty() {
        println!();
        println!("Lookup warnings:");
        for (i, warning) in summary.placement.warnings.iter().enumerate() {
            println!("{}. [{}] {}", i + 1, warning.section, warning.message);
            println!("   Item: {}", warning.item_name);
        }
    }

    let artifacts = &summary.artifacts;
    println!();
    println!("Output files:");
    let written = [
        Some(&artifacts.item_array_json),
        Some(&artifacts.item_array_js),
        Some(&artifacts.unmapped_locations),
        Some(&artifacts.warnings),
        summary.prefix_path.as_ref(),
    ];
    for path in written.into_iter().flatten() {
        println!("  - {}", path.display());
    }
}

fn sort_items(path: &Path) -> Result<(), SpoilerError> {
    let table = ItemTable::from_json_str(&fs::read_to_string(path)?)?;
    fs::write(path, table.to_json_pretty()?)?;

    let sorted = table.sorted_by_id();
    let show = |name: &str, id: Option<i64>| match id {
        Some(id) => println!("  {id}: {name}"),
        None => println!("  ?: {name}"),
    };

    println!("Item map sorted by id (ascending)");
    println!("Total items: {}", sorted.len());
    println!("First few items:");
    for &(name, record) in sorted.iter().take(5) {
        show(name, record.id());
    }
    println!("Last few items:");
    for &(name, record) in sorted.iter().skip(sorted.len().saturating_sub(5)) {
        show(name, record.id());
    }
    Ok(())
}

fn dispatch(args: Args) -> Result<(), SpoilerError> {
    let mut cfg = load_config();

    match args.command {
        Command::Encode {
            spoiler_log,
            tables,
            output,
            sentinel,
            remember,
        } => {
            let tables = tables_dir(tables, &cfg);
            let output = output
                .or_else(|| cfg.output_dir.clone())
                .unwrap_or_else(|| tables.clone());

            if remember {
                cfg.tables_dir = Some(tables.clone());
                cfg.output_dir = Some(output.clone());
                save_config(&cfg)?;
            }

            let summary = run(EncoderSettings {
                spoiler_log_path: spoiler_log_path(spoiler_log)?,
                tables: TablePaths::in_dir(&tables),
                output_path: output,
                sentinel: sentinel.into(),
            })?;
            print_summary(&summary);
            summary.prefix?;
        }

        Command::Prefix { spoiler_log } => {
            let log = load_spoiler_log(&spoiler_log_path(spoiler_log)?)?;
            println!("{}", encode_prefix(&log)?);
        }

        Command::SortItems { items } => {
            let path = items.unwrap_or_else(|| tables_dir(None, &cfg).join(ITEM_TABLE_FILE));
            sort_items(&path)?;
        }

        Command::Describe {
            index,
            spoiler_log,
            tables,
        } => {
            let log = load_spoiler_log(&spoiler_log_path(spoiler_log)?)?;
            let tables = Tables::load(&TablePaths::in_dir(&tables_dir(tables, &cfg)))?;
            let placement = encode(&log, &tables.items, &tables.locations, Sentinel::Zeros);
            let details =
                describe_location(index, &placement.items, &tables.items, &tables.locations);

            println!("Index: {}", details.index);
            println!("Location: {}", details.location_name);
            println!("Item id: {}", details.item_code.as_deref().unwrap_or("-"));
            println!("Item: {}", details.item_name);
        }

        Command::Store { action } => {
            let stored = stored_log()?;
            match action {
                StoreAction::Save { path } => {
                    let text = fs::read_to_string(&path)?;
                    // Refuse to store something the encoders cannot read.
                    SpoilerLog::from_json_str(&text)?;
                    stored.save(&text)?;
                    println!("Spoiler log saved to {}", stored.path().display());
                }
                StoreAction::Status => {
                    if stored.exists() {
                        println!("Stored spoiler log: {}", stored.path().display());
                    } else {
                        println!("No spoiler log stored");
                    }
                }
                StoreAction::Clear => {
                    if stored.clear()? {
                        println!("Stored spoiler log cleared");
                    } else {
                        println!("No spoiler log stored");
                    }
                }
            }
        }
    }

    Ok(())
}

fn main() {
    let args = Args::parse();
    init_tracing(args.debug);

    if let Err(err) = dispatch(args) {
        eprintln!("Error: {err}");
        std::process::exit(1);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_encode_flags() {
        let args = Args::try_parse_from([
            "z3r-spoiler",
            "encode",
            "--spoiler-log",
            "log.json",
            "--tables",
            "hotfix",
            "--sentinel",
            "zeros",
        ])
        .unwrap();

        match args.command {
            Command::Encode {
                spoiler_log,
                tables,
                output,
                sentinel,
                remember,
            } => {
                assert_eq!(spoiler_log, Some(PathBuf::from("log.json")));
                assert_eq!(tables, Some(PathBuf::from("hotfix")));
                assert_eq!(output, None);
                assert_eq!(Sentinel::from(sentinel), Sentinel::Zeros);
                assert!(!remember);
            }
            other => panic!("unexpected command {other:?}"),
        }
    }

    #[test]
    fn tables_dir_prefers_flag_then_config() {
        let cfg = CliConfig {
            tables_dir: Some(PathBuf::from("/saved")),
            output_dir: None,
        };
        assert_eq!(tables_dir(Some(PathBuf::from("/flag")), &cfg), PathBuf::from("/flag"));
        assert_eq!(tables_dir(None, &cfg), PathBuf::from("/saved"));
        assert_eq!(
            tables_dir(None, &CliConfig::default()),
            PathBuf::from(DEFAULT_TABLES_DIR)
        );
    }

    #[test]
    fn sort_items_rewrites_in_id_order() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join(ITEM_TABLE_FILE);
        fs::write(
            &path,
            r#"{"Sword": {"id": 153}, "Retired": null, "Bow": {"id": 11}, "Bombs": {"id": 8}}"#,
        )
        .unwrap();

        sort_items(&path).unwrap();

        let text = fs::read_to_string(&path).unwrap();
        let bombs = text.find("Bombs").unwrap();
        let bow = text.find("Bow").unwrap();
        let sword = text.find("Sword").unwrap();
        assert!(bombs < bow && bow < sword);
        assert!(sword < text.find("Retired").unwrap());
    }
}
