//! Domain types shared by ingestion, storage, and queries.
//!
//! Stored values and query responses are serde-serializable; response
//! shapes use camelCase field names.

use std::fmt;
use std::str::FromStr;

use chrono::{DateTime, TimeDelta, Utc};
use serde::{Deserialize, Serialize};

/// Sensor name; doubles as the partition key.
pub type SensorName = String;

// ── Ingress ───────────────────────────────────────────────────────

/// A validated inbound reading. Not persisted verbatim.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Reading {
    /// External identifier supplied by the sensor.
    pub id: i64,
    /// Identity of the logical source. Never empty.
    pub name: SensorName,
    pub temperature: f64,
    /// Percentage; 0-100 expected but not enforced.
    pub humidity: i32,
}

// ── Stored ────────────────────────────────────────────────────────

/// One persisted reading inside a sensor partition.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StoredEntity {
    pub partition_key: String,
    pub row_key: String,
    pub sensor_id: i64,
    pub sensor_name: SensorName,
    pub temperature: f64,
    pub humidity: i32,
    /// Server-assigned UTC ingestion instant.
    pub timestamp: DateTime<Utc>,
}

/// Result of a single write.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum WriteOutcome {
    Created,
    Replaced,
}

/// Acknowledgement returned for a successful ingestion.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct IngestAck {
    pub table: String,
    pub partition_key: String,
    pub row_key: String,
    pub outcome: WriteOutcome,
}

impl fmt::Display for IngestAck {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.outcome {
            WriteOutcome::Created => {
                write!(f, "new sensor reading added to table '{}'", self.table)
            }
            WriteOutcome::Replaced => {
                write!(f, "sensor reading replaced in table '{}'", self.table)
            }
        }
    }
}

// ── Windows ───────────────────────────────────────────────────────

/// A trailing time window anchored at a captured "now".
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Window {
    Hour,
    Day,
}

impl Window {
    /// Interpret a period token: `"hour"` in any case selects the hourly
    /// window, every other token falls back to a day.
    pub fn from_period(token: &str) -> Self {
        if token.trim().eq_ignore_ascii_case("hour") {
            Window::Hour
        } else {
            Window::Day
        }
    }

    pub fn span(self) -> TimeDelta {
        match self {
            Window::Hour => TimeDelta::hours(1),
            Window::Day => TimeDelta::days(1),
        }
    }

    /// Earliest instant included in this window ending at `now`.
    pub fn cutoff(self, now: DateTime<Utc>) -> DateTime<Utc> {
        now - self.span()
    }

    pub fn as_str(self) -> &'static str {
        match self {
            Window::Hour => "hour",
            Window::Day => "day",
        }
    }
}

impl FromStr for Window {
    type Err = std::convert::Infallible;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Ok(Window::from_period(s))
    }
}

impl fmt::Display for Window {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

// ── Query responses ───────────────────────────────────────────────

/// Mean temperature and humidity over one window. `None` means the
/// window held no readings, which is distinct from a computed zero.
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct WindowAverage {
    pub temperature: Option<f64>,
    pub humidity: Option<f64>,
}

impl WindowAverage {
    pub fn is_empty(&self) -> bool {
        self.temperature.is_none() && self.humidity.is_none()
    }
}

/// Averages over the last hour and last day for one sensor.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SensorAverages {
    pub sensor_name: SensorName,
    pub avg_last_hour: WindowAverage,
    pub avg_last_day: WindowAverage,
}

/// One point of a sensor time series.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TimeSeriesPoint {
    pub timestamp: DateTime<Utc>,
    pub temperature: f64,
    pub humidity: i32,
}

impl From<StoredEntity> for TimeSeriesPoint {
    fn from(entity: StoredEntity) -> Self {
        Self {
            timestamp: entity.timestamp,
            temperature: entity.temperature,
            humidity: entity.humidity,
        }
    }
}
