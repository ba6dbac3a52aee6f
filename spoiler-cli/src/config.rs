use serde::{Deserialize, Serialize};
use std::fs;
use std::io;
use std::path::PathBuf;

const APP_DIR: &str = "Z3RSpoiler";
const CONFIG_FILE: &str = "config.json";
const STORED_LOG_FILE: &str = "spoiler_log.json";

/// Directories remembered between runs.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct CliConfig {
    #[serde(default)]
    pub tables_dir: Option<PathBuf>,
    #[serde(default)]
    pub output_dir: Option<PathBuf>,
}

fn config_path() -> Option<PathBuf> {
    let mut base = dirs::config_dir().or_else(dirs::data_dir)?;
    base.push(APP_DIR);
    base.push(CONFIG_FILE);
    Some(base)
}

pub fn load_config() -> CliConfig {
    if let Some(path) = config_path() {
        if let Ok(data) = fs::read_to_string(&path) {
            match serde_json::from_str::<CliConfig>(&data) {
                Ok(cfg) => return cfg,
                Err(err) => tracing::warn!("ignoring unreadable config {}: {err}", path.display()),
            }
        }
    }
    CliConfig::default()
}

pub fn save_config(cfg: &CliConfig) -> io::Result<()> {
    let Some(path) = config_path() else {
        return Err(io::Error::new(
            io::ErrorKind::NotFound,
            "no config directory on this platform",
        ));
    };
    if let Some(parent) = path.parent() {
        fs::create_dir_all(parent)?;
    }
    let data = serde_json::to_string_pretty(cfg).map_err(io::Error::other)?;
    fs::write(path, data)
}

/// A spoiler log kept in the user's data directory, so later runs can omit
/// `--spoiler-log`.
pub struct StoredLog {
    path: PathBuf,
}

impl StoredLog {
    pub fn locate() -> Option<Self> {
        let mut path = dirs::data_dir().or_else(dirs::config_dir)?;
        path.push(APP_DIR);
        path.push(STORED_LOG_FILE);
        Some(Self { path })
    }

    #[cfg(test)]
    fn at(path: PathBuf) -> Self {
        Self { path }
    }

    pub fn path(&self) -> &PathBuf {
        &self.path
    }

    pub fn exists(&self) -> bool {
        self.path.exists()
    }

    pub fn save(&self, text: &str) -> io::Result<()> {
        if let Some(parent) = self.path.parent() {
            fs::create_dir_all(parent)?;
        }
        fs::write(&self.path, text)
    }

    /// Removes the stored log. Returns false if there was none.
    pub fn clear(&self) -> io::Result<bool> {
        match fs::remove_file(&self.path) {
            Ok(()) => Ok(true),
            Err(err) if err.kind() == io::ErrorKind::NotFound => Ok(false),
            Err(err) => Err(err),
        }
    }
}
