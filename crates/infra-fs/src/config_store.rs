// JSON file ConfigStore

use crate::write::write_atomic;
use cmdrelay_core::domain::RelayConfig;
use cmdrelay_core::error::{AppError, Result};
use cmdrelay_core::port::ConfigStore;
use std::path::{Path, PathBuf};

pub const CONFIG_FILE_NAME: &str = "config.json";

/// `config.json` in the data directory, pretty-printed with camelCase keys
pub struct JsonFileConfigStore {
    path: PathBuf,
}

impl JsonFileConfigStore {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    pub fn in_dir(data_dir: &Path) -> Self {
        Self::new(data_dir.join(CONFIG_FILE_NAME))
    }

    pub fn path(&self) -> &Path {
        &self.path
    }
}

impl ConfigStore for JsonFileConfigStore {
    fn load(&self) -> Result<Option<RelayConfig>> {
        let raw = match std::fs::read_to_string(&self.path) {
            Ok(raw) => raw,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => return Ok(None),
            Err(e) => return Err(e.into()),
        };
        let config = serde_json::from_str(&raw).map_err(|e| {
            AppError::Config(format!("{}: {}", self.path.display(), e))
        })?;
        Ok(Some(config))
    }

    fn save(&self, config: &RelayConfig) -> Result<()> {
        let json = serde_json::to_vec_pretty(config)?;
        write_atomic(&self.path, &json)
            .map_err(|e| AppError::Persistence(format!("{}: {}", self.path.display(), e)))
    }
}
