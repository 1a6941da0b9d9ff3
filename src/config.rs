use clap::ValueEnum;
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};

use crate::app_dirs::AppDirs;

pub const DEFAULT_TICK_RATE_MS: u64 = 16;

/// Where the counting session is persisted
#[derive(
    Debug, Copy, Clone, Default, PartialEq, Eq, Serialize, Deserialize, ValueEnum, strum_macros::Display,
)]
#[serde(rename_all = "lowercase")]
#[strum(serialize_all = "lowercase")]
pub enum StorageBackend {
    #[default]
    Json,
    Sqlite,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct Config {
    pub storage: StorageBackend,
    /// Overrides the backend's default file under the state directory
    pub data_path: Option<PathBuf>,
    pub tick_rate_ms: u64,
    pub celebrate: bool,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            storage: StorageBackend::Json,
            data_path: None,
            tick_rate_ms: DEFAULT_TICK_RATE_MS,
            celebrate: true,
        }
    }
}

impl Config {
    /// Data file for the chosen backend
    pub fn resolved_data_path(&self) -> PathBuf {
        match (&self.data_path, self.storage) {
            (Some(p), _) => p.clone(),
            (None, StorageBackend::Json) => AppDirs::session_json_path(),
            (None, StorageBackend::Sqlite) => AppDirs::session_db_path(),
        }
    }

    pub fn tick_rate_ms(&self) -> u64 {
        self.tick_rate_ms.clamp(1, 1000)
    }
}

pub trait ConfigStore {
    fn load(&self) -> Config;
    fn save(&self, cfg: &Config) -> std::io::Result<()>;
}

#[derive(Debug, Clone)]
pub struct FileConfigStore {
    path: PathBuf,
}

impl FileConfigStore {
    pub fn new() -> Self {
        Self {
            path: AppDirs::config_path(),
        }
    }

    pub fn with_path<P: AsRef<Path>>(p: P) -> Self {
        Self {
            path: p.as_ref().to_path_buf(),
        }
    }
}

impl Default for FileConfigStore {
    fn default() -> Self {
        Self::new()
    }
}

impl ConfigStore for FileConfigStore {
    fn load(&self) -> Config {
        if let Ok(bytes) = fs::read(&self.path) {
            if let Ok(cfg) = serde_json::from_slice::<Config>(&bytes) {
                return cfg;
            }
        }
        Config::default()
    }

    fn save(&self, cfg: &Config) -> std::io::Result<()> {
        if let Some(parent) = self.path.parent() {
            fs::create_dir_all(parent)?;
        }
        let data = serde_json::to_vec_pretty(cfg).map_err(std::io::Error::other)?;
        fs::write(&self.path, data)
    }
}
