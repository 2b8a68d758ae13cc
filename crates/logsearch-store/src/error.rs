//! Error types for store operations.

use logsearch_engine::{EngineError, TransportError};
use thiserror::Error;

/// Errors that can occur during store operations.
#[derive(Error, Debug)]
pub enum StoreError {
    /// Engine-layer failure (configuration, transport, schema).
    #[error("engine error: {0}")]
    Engine(#[from] EngineError),
    /// The backend is unreachable or the index is unusable.
    #[error("store not ready: {0}")]
    NotReady(String),
    /// JSON encoding or decoding failed.
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
    /// More documents match than a single paginated read can reach.
    #[error("{total} matching events exceed the result window of {window}")]
    ResultWindowExceeded {
        /// Number of matching documents.
        total: u64,
        /// Configured `max_result_window`.
        window: u64,
    },
}

impl From<TransportError> for StoreError {
    fn from(e: TransportError) -> Self {
        StoreError::Engine(e.into())
    }
}

/// Failure to rebuild a host event from a stored row.
#[derive(Error, Debug)]
pub enum RestoreError {
    /// The row does not deserialize into the event type.
    #[error("deserialization error: {0}")]
    Deserialize(#[from] serde_json::Error),
    /// The row deserialized but is not a valid event.
    #[error("invalid event: {0}")]
    Invalid(String),
}
