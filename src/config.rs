//! Snapshot location and connection settings.

use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

/// Environment variable overriding [`DatabaseConfig::data_dir`].
pub const DATA_DIR_ENV: &str = "SQLITE_CATALOG_DATA_DIR";
/// Environment variable overriding [`DatabaseConfig::foreign_keys`].
pub const FOREIGN_KEYS_ENV: &str = "SQLITE_CATALOG_FOREIGN_KEYS";

/// Where snapshot files live and how connections to them are set up.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct DatabaseConfig {
    /// Directory holding `<dataset>-<label>.<extension>` snapshot files
    pub data_dir: PathBuf,
    /// Snapshot file extension, without the dot
    pub extension: String,
    /// Foreign key enforcement, applied with `PRAGMA foreign_keys` on every open.
    /// Off unless requested, whatever the engine was compiled with.
    pub foreign_keys: bool,
}

impl Default for DatabaseConfig {
    fn default() -> Self {
        Self {
            data_dir: PathBuf::from("data"),
            extension: "sqlite3".to_string(),
            foreign_keys: false,
        }
    }
}

impl DatabaseConfig {
    /// Create a config rooted at `data_dir` with default settings otherwise.
    pub fn new(data_dir: impl Into<PathBuf>) -> Self {
        Self {
            data_dir: data_dir.into(),
            ..Self::default()
        }
    }

    /// Defaults, overridden by `SQLITE_CATALOG_DATA_DIR` and `SQLITE_CATALOG_FOREIGN_KEYS`.
    pub fn from_env() -> Self {
        let mut config = Self::default();
        if let Ok(dir) = std::env::var(DATA_DIR_ENV) {
            config.data_dir = PathBuf::from(dir);
        }
        if let Ok(flag) = std::env::var(FOREIGN_KEYS_ENV) {
            config.foreign_keys = parse_flag(&flag);
        }
        config
    }

    pub fn with_foreign_keys(mut self, enabled: bool) -> Self {
        self.foreign_keys = enabled;
        self
    }

    pub fn data_dir(&self) -> &Path {
        &self.data_dir
    }

    /// Path of the snapshot for `dataset` at stage `label`.
    pub fn snapshot_path(&self, dataset: &str, label: &str) -> PathBuf {
        self.data_dir
            .join(format!("{dataset}-{label}.{}", self.extension))
    }
}

fn parse_flag(value: &str) -> bool {
    matches!(
        value.trim().to_ascii_lowercase().as_str(),
        "1" | "true" | "on" | "yes"
    )
}
