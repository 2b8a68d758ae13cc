use crate::errors::EngineError;
use serde::de::DeserializeOwned;
use serde_json::Value;
use std::fmt;

/// HTTP method of an engine request.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Method {
    /// GET
    Get,
    /// POST
    Post,
    /// PUT
    Put,
    /// DELETE
    Delete,
    /// HEAD
    Head,
}

impl Method {
    /// Upper-case method name.
    pub fn as_str(self) -> &'static str {
        match self {
            Method::Get => "GET",
            Method::Post => "POST",
            Method::Put => "PUT",
            Method::Delete => "DELETE",
            Method::Head => "HEAD",
        }
    }
}

impl fmt::Display for Method {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Body of an engine request.
#[derive(Debug, Clone, PartialEq)]
pub enum RequestBody {
    /// No body.
    Empty,
    /// A JSON document.
    Json(Value),
    /// Newline-delimited JSON, already rendered.
    NdJson(String),
}

impl RequestBody {
    /// Content type header value, if the body has one.
    pub fn content_type(&self) -> Option<&'static str> {
        match self {
            RequestBody::Empty => None,
            RequestBody::Json(_) => Some("application/json"),
            RequestBody::NdJson(_) => Some("application/x-ndjson"),
        }
    }

    /// Serialized body bytes.
    pub fn to_bytes(&self) -> Vec<u8> {
        match self {
            RequestBody::Empty => Vec::new(),
            RequestBody::Json(value) => value.to_string().into_bytes(),
            RequestBody::NdJson(text) => text.clone().into_bytes(),
        }
    }
}

/// One request to the engine, relative to its base URL.
#[derive(Debug, Clone, PartialEq)]
pub struct EngineRequest {
    /// HTTP method.
    pub method: Method,
    /// Path starting with `/`, may include a query string.
    pub path: String,
    /// Request body.
    pub body: RequestBody,
}

impl EngineRequest {
    /// A GET request without body.
    pub fn get(path: impl Into<String>) -> Self {
        Self {
            method: Method::Get,
            path: path.into(),
            body: RequestBody::Empty,
        }
    }

    /// A POST request with a JSON body.
    pub fn post_json(path: impl Into<String>, body: Value) -> Self {
        Self {
            method: Method::Post,
            path: path.into(),
            body: RequestBody::Json(body),
        }
    }

    /// A PUT request with a JSON body.
    pub fn put_json(path: impl Into<String>, body: Value) -> Self {
        Self {
            method: Method::Put,
            path: path.into(),
            body: RequestBody::Json(body),
        }
    }

    /// A POST request with a newline-delimited JSON body.
    pub fn post_ndjson(path: impl Into<String>, body: String) -> Self {
        Self {
            method: Method::Post,
            path: path.into(),
            body: RequestBody::NdJson(body),
        }
    }

    /// JSON body of the request, if it has one.
    pub fn json_body(&self) -> Option<&Value> {
        match &self.body {
            RequestBody::Json(value) => Some(value),
            _ => None,
        }
    }
}

/// Percent-encodes one path segment, so `/`, `?` and `#` stay inside it.
pub fn encode_path_segment(segment: &str) -> String {
    percent_encode(segment, false)
}

/// Percent-encodes everything outside the unreserved set, optionally
/// leaving `/` intact.
pub(crate) fn percent_encode(input: &str, keep_slash: bool) -> String {
    let mut out = String::with_capacity(input.len());
    for byte in input.bytes() {
        match byte {
            b'A'..=b'Z' | b'a'..=b'z' | b'0'..=b'9' | b'-' | b'_' | b'.' | b'~' => {
                out.push(byte as char)
            }
            b'/' if keep_slash => out.push('/'),
            other => out.push_str(&format!("%{:02X}", other)),
        }
    }
    out
}

/// Successful answer from the engine.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EngineResponse {
    /// HTTP status code (2xx).
    pub status: u16,
    /// Raw response body.
    pub body: String,
}

impl EngineResponse {
    /// Builds a response from a status and a JSON body.
    pub fn json_response(status: u16, body: &Value) -> Self {
        Self {
            status,
            body: body.to_string(),
        }
    }

    /// Decodes the body as JSON. An empty body decodes to `null`.
    pub fn json(&self) -> Result<Value, EngineError> {
        if self.body.trim().is_empty() {
            return Ok(Value::Null);
        }
        Ok(serde_json::from_str(&self.body)?)
    }

    /// Decodes the body into a typed value.
    pub fn decode<T: DeserializeOwned>(&self) -> Result<T, EngineError> {
        Ok(serde_json::from_str(&self.body)?)
    }
}
