//! Entity key strategy.
//!
//! The partition key is always the sensor name. The row key depends on the
//! [`KeyPolicy`] chosen for the ingestion call:
//!
//! - `Append`: `{yyyyMMddHHmmssfff}-{128-bit random token, lowercase hex}`.
//!   Unique even for concurrent writers in the same millisecond, and
//!   lexicographic order within a partition equals chronological order.
//! - `Upsert`: the reading's external id in decimal. Re-ingesting the same
//!   `(name, id)` replaces the stored entity.
//!
//! Both policies share the storage path; they differ only in the key and
//! in the [`WriteMode`] handed to the table.

use std::fmt;
use std::str::FromStr;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::types::{Reading, StoredEntity};

/// Separator between the timestamp prefix and the random token.
pub const ROW_KEY_SEPARATOR: char = '-';

/// Fixed-width, sortable UTC timestamp format used as the row key prefix.
pub const ROW_KEY_TIME_FORMAT: &str = "%Y%m%d%H%M%S%3f";

/// How an ingestion call derives its row key.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum KeyPolicy {
    /// New entity per call; full history retained.
    #[default]
    Append,
    /// Replace any entity with the same `(name, id)`.
    Upsert,
}

/// Whether the table may overwrite an existing entity at the same key.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum WriteMode {
    InsertOnly,
    Overwrite,
}

/// Keys and write mode derived for one reading.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EntityKey {
    pub partition_key: String,
    pub row_key: String,
    pub mode: WriteMode,
}

impl KeyPolicy {
    pub fn write_mode(self) -> WriteMode {
        match self {
            KeyPolicy::Append => WriteMode::InsertOnly,
            KeyPolicy::Upsert => WriteMode::Overwrite,
        }
    }

    /// Derive the storage key for `reading` ingested at `now`.
    pub fn derive(self, reading: &Reading, now: DateTime<Utc>) -> EntityKey {
        let row_key = match self {
            KeyPolicy::Append => append_row_key(now),
            KeyPolicy::Upsert => reading.id.to_string(),
        };
        EntityKey {
            partition_key: reading.name.clone(),
            row_key,
            mode: self.write_mode(),
        }
    }

    /// Build the entity to persist for `reading`, stamped with `now`.
    pub fn entity(self, reading: &Reading, now: DateTime<Utc>) -> (StoredEntity, WriteMode) {
        let key = self.derive(reading, now);
        let entity = StoredEntity {
            partition_key: key.partition_key,
            row_key: key.row_key,
            sensor_id: reading.id,
            sensor_name: reading.name.clone(),
            temperature: reading.temperature,
            humidity: reading.humidity,
            timestamp: now,
        };
        (entity, key.mode)
    }

    pub fn as_str(self) -> &'static str {
        match self {
            KeyPolicy::Append => "append",
            KeyPolicy::Upsert => "upsert",
        }
    }
}

impl FromStr for KeyPolicy {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "append" => Ok(KeyPolicy::Append),
            "upsert" => Ok(KeyPolicy::Upsert),
            other => Err(format!("unknown key policy '{other}' (expected append or upsert)")),
        }
    }
}

impl fmt::Display for KeyPolicy {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Row key for the append policy.
pub fn append_row_key(now: DateTime<Utc>) -> String {
    format!(
        "{}{}{}",
        now.format(ROW_KEY_TIME_FORMAT),
        ROW_KEY_SEPARATOR,
        Uuid::new_v4().simple()
    )
}
