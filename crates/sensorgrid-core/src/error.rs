//! Error types for SensorGrid ingestion and queries.

use thiserror::Error;

/// Result type alias for SensorGrid operations.
pub type SensorResult<T> = Result<T, SensorError>;

/// Errors surfaced to callers of the core API.
///
/// An empty window is not an error: queries over a sensor with no data
/// return empty series and `None` averages.
#[derive(Debug, Error)]
pub enum SensorError {
    /// The inbound payload could not be parsed or lacks a required field.
    #[error("invalid payload: {0}")]
    InvalidPayload(String),

    /// An insert-only write hit an existing `(partition, row_key)`.
    #[error("conflict: entity {partition}/{row_key} already exists")]
    Conflict { partition: String, row_key: String },

    /// The backing store could not be reached, read, or written.
    #[error("store unavailable: {0}")]
    InfrastructureUnavailable(String),
}

impl SensorError {
    /// Whether the failure was caused by the caller's input.
    pub fn is_client_error(&self) -> bool {
        matches!(self, SensorError::InvalidPayload(_))
    }
}
