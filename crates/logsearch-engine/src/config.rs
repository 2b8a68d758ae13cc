//! Adapter configuration.

use crate::errors::EngineError;
use serde::{Deserialize, Serialize};
use std::path::Path;
use std::time::Duration;

/// Default cursor page size.
pub const DEFAULT_BATCH_SIZE: u64 = 50;
/// Default cap on the size of one bulk request body, in bytes.
pub const DEFAULT_MAX_REQUEST_BYTES: usize = 10_000_000;
/// Default logical size of a read that has no limit.
pub const DEFAULT_MAX_RESULT_WINDOW: u64 = 10_000;

/// Credentials for signed requests to a managed engine.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SigningConfig {
    /// Whether requests are signed at all.
    #[serde(default)]
    pub enabled: bool,
    /// Access key id.
    #[serde(default)]
    pub key_id: String,
    /// Secret access key.
    #[serde(default)]
    pub secret: String,
    /// Region the engine runs in (e.g. `eu-west-1`).
    #[serde(default)]
    pub region: String,
    /// Service name in the credential scope.
    #[serde(default = "default_service")]
    pub service: String,
}

fn default_service() -> String {
    "es".to_string()
}

/// Configuration read once when the adapter is constructed.
///
/// The struct is immutable for the adapter's lifetime and is handed
/// explicitly to every component that needs it.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct EngineConfig {
    /// Engine host, optionally with a scheme (`https://search.example.org`).
    #[serde(default)]
    pub hostname: String,
    /// Engine port.
    #[serde(default = "default_port")]
    pub port: u16,
    /// Index holding event documents.
    #[serde(default)]
    pub index: String,
    /// Page size used by cursors.
    #[serde(default = "default_batch_size")]
    pub batch_size: u64,
    /// Largest bulk request body, in bytes.
    #[serde(default = "default_max_request_bytes")]
    pub max_request_bytes: usize,
    /// Logical size applied to reads without a limit.
    #[serde(default = "default_max_result_window")]
    pub max_result_window: u64,
    /// Log events triggered by guests and anonymous visitors.
    #[serde(default)]
    pub log_guests: bool,
    /// Store the `other` payload as JSON text (otherwise base64-wrapped JSON).
    #[serde(default = "default_true")]
    pub json_format: bool,
    /// Request timeout, in seconds.
    #[serde(default = "default_timeout_secs")]
    pub timeout_secs: u64,
    /// Optional request signing.
    #[serde(default)]
    pub signing: Option<SigningConfig>,
}

fn default_port() -> u16 {
    9200
}

fn default_batch_size() -> u64 {
    DEFAULT_BATCH_SIZE
}

fn default_max_request_bytes() -> usize {
    DEFAULT_MAX_REQUEST_BYTES
}

fn default_max_result_window() -> u64 {
    DEFAULT_MAX_RESULT_WINDOW
}

fn default_true() -> bool {
    true
}

fn default_timeout_secs() -> u64 {
    30
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            hostname: String::new(),
            port: default_port(),
            index: String::new(),
            batch_size: DEFAULT_BATCH_SIZE,
            max_request_bytes: DEFAULT_MAX_REQUEST_BYTES,
            max_result_window: DEFAULT_MAX_RESULT_WINDOW,
            log_guests: false,
            json_format: true,
            timeout_secs: default_timeout_secs(),
            signing: None,
        }
    }
}

impl EngineConfig {
    /// Builds a configuration for an engine at `hostname:port` holding `index`.
    pub fn new(hostname: impl Into<String>, port: u16, index: impl Into<String>) -> Self {
        Self {
            hostname: hostname.into(),
            port,
            index: index.into(),
            ..Self::default()
        }
    }

    /// Loads a configuration from a JSON file.
    ///
    /// # Errors
    ///
    /// Returns [`EngineError::Configuration`] if the file cannot be read and
    /// [`EngineError::Json`] if it is not valid configuration JSON.
    pub fn from_file<P: AsRef<Path>>(path: P) -> Result<Self, EngineError> {
        let raw = std::fs::read_to_string(path.as_ref()).map_err(|e| {
            EngineError::config(format!("read {}: {}", path.as_ref().display(), e))
        })?;
        Ok(serde_json::from_str(&raw)?)
    }

    /// Checks that every setting an operation depends on is present.
    pub fn validate(&self) -> Result<(), EngineError> {
        if self.hostname.trim().is_empty() {
            return Err(EngineError::config("hostname is not set"));
        }
        if self.port == 0 {
            return Err(EngineError::config("port is not set"));
        }
        self.require_index()?;
        if self.batch_size == 0 {
            return Err(EngineError::config("batch_size must be positive"));
        }
        if let Some(signing) = self.active_signing() {
            for (name, value) in [
                ("key_id", &signing.key_id),
                ("secret", &signing.secret),
                ("region", &signing.region),
            ] {
                if value.trim().is_empty() {
                    return Err(EngineError::config(format!(
                        "signing is enabled but {} is not set",
                        name
                    )));
                }
            }
        }
        Ok(())
    }

    /// Returns the index name, failing when it is unset.
    pub fn require_index(&self) -> Result<&str, EngineError> {
        let index = self.index.trim();
        if index.is_empty() {
            return Err(EngineError::config("index name is not set"));
        }
        Ok(index)
    }

    /// Signing settings when signing is enabled.
    pub fn active_signing(&self) -> Option<&SigningConfig> {
        self.signing.as_ref().filter(|s| s.enabled)
    }

    /// `{scheme}://{host}:{port}` without a trailing slash.
    pub fn base_url(&self) -> String {
        let host = self.hostname.trim().trim_end_matches('/');
        if host.starts_with("http://") || host.starts_with("https://") {
            format!("{}:{}", host, self.port)
        } else {
            format!("http://{}:{}", host, self.port)
        }
    }

    /// Request timeout.
    pub fn timeout(&self) -> Duration {
        Duration::from_secs(self.timeout_secs)
    }
}
