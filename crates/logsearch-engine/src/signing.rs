//! AWS Signature Version 4 request signing for managed engine domains.

use crate::config::SigningConfig;
use crate::errors::EngineError;
use crate::request::percent_encode;
use chrono::{DateTime, Utc};
use hmac::{Hmac, Mac};
use sha2::{Digest, Sha256};

type HmacSha256 = Hmac<Sha256>;

const ALGORITHM: &str = "AWS4-HMAC-SHA256";
const SIGNED_HEADERS: &str = "host;x-amz-content-sha256;x-amz-date";

/// Headers to attach to a signed request.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SignedHeaders {
    /// `Authorization` header value.
    pub authorization: String,
    /// `x-amz-date` header value.
    pub amz_date: String,
    /// `x-amz-content-sha256` header value.
    pub content_sha256: String,
}

impl SignedHeaders {
    /// Header name/value pairs, ready to attach.
    pub fn pairs(&self) -> [(&'static str, &str); 3] {
        [
            ("authorization", self.authorization.as_str()),
            ("x-amz-date", self.amz_date.as_str()),
            ("x-amz-content-sha256", self.content_sha256.as_str()),
        ]
    }
}

/// Signs requests with a fixed credential scope.
#[derive(Debug, Clone)]
pub struct Signer {
    key_id: String,
    secret: String,
    region: String,
    service: String,
}

impl Signer {
    /// Creates a signer from configured credentials.
    pub fn new(config: &SigningConfig) -> Self {
        Self {
            key_id: config.key_id.clone(),
            secret: config.secret.clone(),
            region: config.region.clone(),
            service: config.service.clone(),
        }
    }

    /// Signs one request.
    ///
    /// `host` is the value of the `Host` header (with port when non-default),
    /// `path` may carry a query string.
    pub fn sign(
        &self,
        method: &str,
        host: &str,
        path: &str,
        body: &[u8],
        now: DateTime<Utc>,
    ) -> Result<SignedHeaders, EngineError> {
        let amz_date = now.format("%Y%m%dT%H%M%SZ").to_string();
        let date = now.format("%Y%m%d").to_string();
        let content_sha256 = hex::encode(Sha256::digest(body));

        let (raw_path, raw_query) = match path.split_once('?') {
            Some((p, q)) => (p, q),
            None => (path, ""),
        };
        let canonical_request = format!(
            "{}\n{}\n{}\nhost:{}\nx-amz-content-sha256:{}\nx-amz-date:{}\n\n{}\n{}",
            method,
            canonical_uri(raw_path),
            canonical_query(raw_query),
            host.trim(),
            content_sha256,
            amz_date,
            SIGNED_HEADERS,
            content_sha256
        );

        let scope = format!("{}/{}/{}/aws4_request", date, self.region, self.service);
        let string_to_sign = format!(
            "{}\n{}\n{}\n{}",
            ALGORITHM,
            amz_date,
            scope,
            hex::encode(Sha256::digest(canonical_request.as_bytes()))
        );

        let key = self.signing_key(&date)?;
        let signature = hex::encode(hmac(&key, string_to_sign.as_bytes())?);

        Ok(SignedHeaders {
            authorization: format!(
                "{} Credential={}/{}, SignedHeaders={}, Signature={}",
                ALGORITHM, self.key_id, scope, SIGNED_HEADERS, signature
            ),
            amz_date,
            content_sha256,
        })
    }

    fn signing_key(&self, date: &str) -> Result<Vec<u8>, EngineError> {
        let k_date = hmac(format!("AWS4{}", self.secret).as_bytes(), date.as_bytes())?;
        let k_region = hmac(&k_date, self.region.as_bytes())?;
        let k_service = hmac(&k_region, self.service.as_bytes())?;
        hmac(&k_service, b"aws4_request")
    }
}

fn hmac(key: &[u8], data: &[u8]) -> Result<Vec<u8>, EngineError> {
    let mut mac =
        HmacSha256::new_from_slice(key).map_err(|e| EngineError::Signing(e.to_string()))?;
    mac.update(data);
    Ok(mac.finalize().into_bytes().to_vec())
}

fn canonical_uri(path: &str) -> String {
    if path.is_empty() {
        return "/".to_string();
    }
    percent_encode(path, true)
}

fn canonical_query(query: &str) -> String {
    let mut pairs: Vec<(String, String)> = query
        .split('&')
        .filter(|p| !p.is_empty())
        .map(|pair| {
            let (k, v) = pair.split_once('=').unwrap_or((pair, ""));
            (percent_encode(k, false), percent_encode(v, false))
        })
        .collect();
    pairs.sort();
    pairs
        .into_iter()
        .map(|(k, v)| format!("{}={}", k, v))
        .collect::<Vec<_>>()
        .join("&")
}
