//! Inbound reading validation.
//!
//! Payloads are JSON objects whose field names match case-insensitively
//! (`Name`, `NAME` and `name` are the same field). `name` is required and
//! must be a non-empty string without control characters. Numeric fields
//! are lenient: a missing or `null` value defaults to zero and the reading
//! is still accepted. A numeric field of the wrong type is rejected.

use serde::Deserialize;
use serde_json::{Map, Value};
use tracing::warn;

use crate::error::{SensorError, SensorResult};
use crate::types::Reading;

/// Wire shape after key normalization. Every field is optional so the
/// leniency policy lives in one place ([`RawReading::into_reading`]).
#[derive(Debug, Default, Deserialize)]
#[serde(default)]
struct RawReading {
    id: Option<i64>,
    name: Option<String>,
    temperature: Option<f64>,
    humidity: Option<i32>,
}

impl RawReading {
    fn into_reading(self) -> SensorResult<Reading> {
        let name = self
            .name
            .ok_or_else(|| invalid("missing required field `name`"))?;
        validate_name(&name)?;
        Ok(Reading {
            id: self.id.unwrap_or(0),
            name,
            temperature: self.temperature.unwrap_or(0.0),
            humidity: self.humidity.unwrap_or(0),
        })
    }
}

/// Parse and validate a raw reading payload.
pub fn parse_reading(payload: &[u8]) -> SensorResult<Reading> {
    let value: Value = serde_json::from_slice(payload).map_err(|e| {
        warn!(error = %e, "rejected malformed reading payload");
        invalid(format!("malformed JSON: {e}"))
    })?;
    reading_from_value(value)
}

/// Validate an already-decoded JSON value.
pub fn reading_from_value(value: Value) -> SensorResult<Reading> {
    let Value::Object(fields) = value else {
        return Err(invalid("expected a JSON object"));
    };
    let raw: RawReading = serde_json::from_value(Value::Object(lowercase_keys(fields)))
        .map_err(|e| {
            warn!(error = %e, "rejected reading payload with mistyped field");
            invalid(e.to_string())
        })?;
    raw.into_reading()
}

/// Check that a sensor name can be used as a partition key.
pub fn validate_name(name: &str) -> SensorResult<()> {
    if name.trim().is_empty() {
        return Err(invalid("sensor name must not be empty"));
    }
    if name.chars().any(char::is_control) {
        return Err(invalid("sensor name must not contain control characters"));
    }
    Ok(())
}

// Later duplicates (by case-folded name) overwrite earlier ones.
fn lowercase_keys(fields: Map<String, Value>) -> Map<String, Value> {
    fields
        .into_iter()
        .map(|(key, value)| (key.to_lowercase(), value))
        .collect()
}

fn invalid(msg: impl Into<String>) -> SensorError {
    SensorError::InvalidPayload(msg.into())
}
