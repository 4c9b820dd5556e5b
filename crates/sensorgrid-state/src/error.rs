//! Error types for the SensorGrid state store.

use sensorgrid_core::SensorError;
use thiserror::Error;

/// Result type alias for state store operations.
pub type StateResult<T> = Result<T, StateError>;

/// Errors that can occur during state store operations.
#[derive(Debug, Error)]
pub enum StateError {
    #[error("failed to open database: {0}")]
    Open(String),

    #[error("transaction error: {0}")]
    Transaction(String),

    #[error("table error: {0}")]
    Table(String),

    #[error("read error: {0}")]
    Read(String),

    #[error("write error: {0}")]
    Write(String),

    #[error("serialization error: {0}")]
    Serialize(String),

    #[error("deserialization error: {0}")]
    Deserialize(String),

    #[error("entity {partition}/{row_key} already exists")]
    Conflict { partition: String, row_key: String },
}

impl From<StateError> for SensorError {
    fn from(err: StateError) -> Self {
        match err {
            StateError::Conflict { partition, row_key } => {
                SensorError::Conflict { partition, row_key }
            }
            other => SensorError::InfrastructureUnavailable(other.to_string()),
        }
    }
}
