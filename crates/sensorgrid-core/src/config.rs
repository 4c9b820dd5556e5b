//! sensorgrid.toml configuration parser.

use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

use crate::keys::KeyPolicy;
use crate::table::DEFAULT_SCAN_PAGE_SIZE;

/// Table name used when none is configured.
pub const DEFAULT_TABLE: &str = "SensorData";

/// File name of the database inside `store.data_dir`.
pub const DATABASE_FILE: &str = "sensorgrid.redb";

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SensorGridConfig {
    pub store: StoreConfig,
    pub ingest: IngestConfig,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct StoreConfig {
    pub data_dir: PathBuf,
    pub table: String,
    pub scan_page_size: usize,
}

impl Default for StoreConfig {
    fn default() -> Self {
        Self {
            data_dir: PathBuf::from("./data"),
            table: DEFAULT_TABLE.to_string(),
            scan_page_size: DEFAULT_SCAN_PAGE_SIZE,
        }
    }
}

impl StoreConfig {
    pub fn database_path(&self) -> PathBuf {
        self.data_dir.join(DATABASE_FILE)
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct IngestConfig {
    pub key_policy: KeyPolicy,
}

impl SensorGridConfig {
    pub fn from_file(path: &Path) -> anyhow::Result<Self> {
        let content = std::fs::read_to_string(path)?;
        let config: SensorGridConfig = toml::from_str(&content)?;
        config.validate()?;
        Ok(config)
    }

    pub fn to_toml_string(&self) -> anyhow::Result<String> {
        Ok(toml::to_string_pretty(self)?)
    }

    pub fn validate(&self) -> anyhow::Result<()> {
        if self.store.table.trim().is_empty() {
            anyhow::bail!("store.table must not be empty");
        }
        if self.store.scan_page_size == 0 {
            anyhow::bail!("store.scan_page_size must be at least 1");
        }
        Ok(())
    }
}
