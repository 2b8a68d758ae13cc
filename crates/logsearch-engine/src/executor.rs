//! Request execution against the engine's REST API.

use crate::config::EngineConfig;
use crate::errors::{EngineError, TransportError};
use crate::request::{EngineRequest, EngineResponse, Method};
use crate::signing::Signer;
use reqwest::blocking::Client;
use reqwest::header::CONTENT_TYPE;
use tracing::{debug, warn};

/// Issues requests to the engine.
///
/// Implementations normalize every failure into a [`TransportError`]; a
/// returned [`EngineResponse`] always carries a 2xx status.
pub trait RequestExecutor {
    /// Sends one request and waits for the answer.
    fn execute(&self, request: EngineRequest) -> Result<EngineResponse, TransportError>;

    /// Probes the engine root, expecting HTTP 200.
    fn ping(&self) -> bool {
        matches!(
            self.execute(EngineRequest::get("/")),
            Ok(EngineResponse { status: 200, .. })
        )
    }
}

impl<T: RequestExecutor + ?Sized> RequestExecutor for &T {
    fn execute(&self, request: EngineRequest) -> Result<EngineResponse, TransportError> {
        (**self).execute(request)
    }
}

impl<T: RequestExecutor + ?Sized> RequestExecutor for Box<T> {
    fn execute(&self, request: EngineRequest) -> Result<EngineResponse, TransportError> {
        (**self).execute(request)
    }
}

/// Blocking HTTP executor with optional request signing.
#[derive(Debug, Clone)]
pub struct HttpExecutor {
    base_url: String,
    host_header: String,
    client: Client,
    signer: Option<Signer>,
}

impl HttpExecutor {
    /// Builds an executor for the configured engine.
    ///
    /// # Errors
    ///
    /// Returns [`EngineError::Configuration`] if hostname, port or signing
    /// credentials are missing, or if the HTTP client cannot be built.
    pub fn new(config: &EngineConfig) -> Result<Self, EngineError> {
        if config.hostname.trim().is_empty() {
            return Err(EngineError::config("hostname is not set"));
        }
        if config.port == 0 {
            return Err(EngineError::config("port is not set"));
        }
        let signer = match config.active_signing() {
            Some(signing) => {
                if signing.key_id.is_empty() || signing.secret.is_empty() || signing.region.is_empty() {
                    return Err(EngineError::config(
                        "signing is enabled but credentials are incomplete",
                    ));
                }
                Some(Signer::new(signing))
            }
            None => None,
        };
        let client = Client::builder()
            .timeout(config.timeout())
            .build()
            .map_err(|e| EngineError::config(format!("HTTP client: {}", e)))?;

        let base_url = config.base_url();
        Ok(Self {
            host_header: host_header(&base_url),
            base_url,
            client,
            signer,
        })
    }

    /// Base URL requests are resolved against.
    pub fn base_url(&self) -> &str {
        &self.base_url
    }
}

impl RequestExecutor for HttpExecutor {
    fn execute(&self, request: EngineRequest) -> Result<EngineResponse, TransportError> {
        let url = format!("{}{}", self.base_url, request.path);
        let body = request.body.to_bytes();

        let mut builder = match request.method {
            Method::Get => self.client.get(&url),
            Method::Post => self.client.post(&url),
            Method::Put => self.client.put(&url),
            Method::Delete => self.client.delete(&url),
            Method::Head => self.client.head(&url),
        };
        if let Some(content_type) = request.body.content_type() {
            builder = builder.header(CONTENT_TYPE, content_type);
        }
        if let Some(signer) = &self.signer {
            let signed = signer
                .sign(
                    request.method.as_str(),
                    &self.host_header,
                    &request.path,
                    &body,
                    chrono::Utc::now(),
                )
                .map_err(|e| TransportError::Connect(e.to_string()))?;
            for (name, value) in signed.pairs() {
                builder = builder.header(name, value);
            }
        }
        if !body.is_empty() {
            builder = builder.body(body);
        }

        let response = builder.send().map_err(|e| {
            warn!(method = %request.method, path = %request.path, error = %e, "engine request failed");
            TransportError::Connect(e.to_string())
        })?;
        let status = response.status().as_u16();
        let text = response
            .text()
            .map_err(|e| TransportError::Connect(e.to_string()))?;
        debug!(method = %request.method, path = %request.path, status, "engine request");

        if !(200..300).contains(&status) {
            return Err(TransportError::Status { status, body: text });
        }
        Ok(EngineResponse { status, body: text })
    }
}

/// `Host` header as the engine sees it: default ports are omitted.
fn host_header(base_url: &str) -> String {
    let (scheme, rest) = base_url.split_once("://").unwrap_or(("http", base_url));
    match rest.rsplit_once(':') {
        Some((host, "80")) if scheme == "http" => host.to_string(),
        Some((host, "443")) if scheme == "https" => host.to_string(),
        _ => rest.to_string(),
    }
}
