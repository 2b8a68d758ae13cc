use logsearch_schema::SchemaError;
use thiserror::Error;

/// Failure of a single request to the engine.
///
/// Network-level problems and non-2xx answers both land here, so callers
/// always inspect one typed outcome instead of special-casing exceptions.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum TransportError {
    /// Connection refused, DNS failure, timeout, or a body that could not be read.
    #[error("connection failed: {0}")]
    Connect(String),
    /// The engine answered with a non-success status.
    #[error("engine returned status {status}: {body}")]
    Status {
        /// HTTP status code.
        status: u16,
        /// Response body, possibly empty.
        body: String,
    },
}

impl TransportError {
    /// HTTP status code when the engine answered at all.
    pub fn status(&self) -> Option<u16> {
        match self {
            TransportError::Status { status, .. } => Some(*status),
            TransportError::Connect(_) => None,
        }
    }

    /// Returns true for a 404 answer.
    pub fn is_not_found(&self) -> bool {
        self.status() == Some(404)
    }
}

/// Errors that can occur in engine operations.
#[derive(Error, Debug)]
pub enum EngineError {
    /// Missing or inconsistent configuration (hostname, port, index, credentials).
    #[error("configuration error: {0}")]
    Configuration(String),
    /// Request to the engine failed.
    #[error("transport error: {0}")]
    Transport(#[from] TransportError),
    /// JSON encoding or decoding failed.
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
    /// Index mapping disagrees with the schema registry.
    #[error("schema error: {0}")]
    Schema(#[from] SchemaError),
    /// The engine answered with a body of unexpected shape.
    #[error("unexpected response: {0}")]
    UnexpectedResponse(String),
    /// Request signing could not be performed.
    #[error("signing error: {0}")]
    Signing(String),
}

impl EngineError {
    /// Shorthand for a configuration error.
    pub fn config(message: impl Into<String>) -> Self {
        EngineError::Configuration(message.into())
    }
}
