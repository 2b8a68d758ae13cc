//! Bulk indexing of event records.

use crate::config::EngineConfig;
use crate::errors::EngineError;
use crate::executor::RequestExecutor;
use crate::request::{EngineRequest, EngineResponse};
use logsearch_schema::{EventRecord, FieldValue, SchemaRegistry, ACUTIME};
use serde_json::{json, Value};
use chrono::Utc;
use std::sync::atomic::{AtomicI64, Ordering};
use tracing::{debug, warn};

/// Room reserved per record for the `acutime` member added at write time.
const ACUTIME_ALLOWANCE: usize = 32;

static LAST_ACUTIME: AtomicI64 = AtomicI64::new(0);

/// Insertion timestamp in epoch milliseconds.
///
/// Floor of the wall clock, bumped by one whenever the clock has not moved
/// since the previous call, so consecutive records strictly increase.
pub fn next_acutime() -> i64 {
    let now = Utc::now().timestamp_millis();
    let mut previous = LAST_ACUTIME.load(Ordering::Relaxed);
    loop {
        let next = now.max(previous + 1);
        match LAST_ACUTIME.compare_exchange_weak(previous, next, Ordering::Relaxed, Ordering::Relaxed) {
            Ok(_) => return next,
            Err(actual) => previous = actual,
        }
    }
}

/// Writes batches of records through the engine's bulk API.
///
/// This is the only component that writes documents; it never reads.
pub struct BulkWriter<'a, X: RequestExecutor + ?Sized> {
    config: &'a EngineConfig,
    executor: &'a X,
    registry: SchemaRegistry,
}

impl<'a, X: RequestExecutor + ?Sized> BulkWriter<'a, X> {
    /// Creates a writer for the configured index.
    pub fn new(config: &'a EngineConfig, executor: &'a X) -> Self {
        Self {
            config,
            executor,
            registry: SchemaRegistry::standard(),
        }
    }

    /// Renders the newline-delimited bulk body for a batch.
    ///
    /// Each record becomes one `create` action line followed by the
    /// field-complete document, in input order.
    pub fn bulk_body(&self, records: &[EventRecord]) -> Result<String, EngineError> {
        let index = self.config.require_index()?;
        let action = json!({ "create": { "_index": index } }).to_string();
        let mut body = String::new();
        for record in records {
            let mut document = self.registry.complete(record);
            document.insert(ACUTIME, FieldValue::Int(next_acutime()));
            for problem in self.registry.check_record(&document) {
                warn!(%problem, "record does not match schema");
            }
            body.push_str(&action);
            body.push('\n');
            body.push_str(&serde_json::to_string(&document)?);
            body.push('\n');
        }
        Ok(body)
    }

    /// Submits a batch in a single bulk request.
    ///
    /// Returns `None` without contacting the engine when `records` is empty.
    /// Per-document outcomes in the response are not inspected.
    ///
    /// # Errors
    ///
    /// Returns [`EngineError::Configuration`] if the index is unset and
    /// [`EngineError::Transport`] if the request fails; the batch is not retried.
    pub fn create_docs(&self, records: &[EventRecord]) -> Result<Option<EngineResponse>, EngineError> {
        if records.is_empty() {
            return Ok(None);
        }
        let body = self.bulk_body(records)?;
        debug!(records = records.len(), bytes = body.len(), "submitting bulk request");
        let response = self
            .executor
            .execute(EngineRequest::post_ndjson("/_bulk/", body))?;
        if let Ok(summary) = response.json() {
            if summary.get("errors").and_then(Value::as_bool) == Some(true) {
                warn!(records = records.len(), "bulk request reported document errors");
            }
        }
        Ok(Some(response))
    }

    /// Groups consecutive records so each group's bulk body fits `max_request_bytes`.
    ///
    /// A record that exceeds the cap on its own still forms a group.
    pub fn split_by_size<'r>(&self, records: &'r [EventRecord]) -> Vec<&'r [EventRecord]> {
        let cap = self.config.max_request_bytes;
        let action_len = json!({ "create": { "_index": self.config.index.trim() } })
            .to_string()
            .len();
        let mut groups = Vec::new();
        let mut start = 0;
        let mut size = 0;
        for (i, record) in records.iter().enumerate() {
            let doc_len = serde_json::to_string(&self.registry.complete(record))
                .map(|s| s.len())
                .unwrap_or(0);
            let entry = action_len + doc_len + ACUTIME_ALLOWANCE + 2;
            if i > start && size + entry > cap {
                groups.push(&records[start..i]);
                start = i;
                size = 0;
            }
            size += entry;
        }
        if start < records.len() {
            groups.push(&records[start..]);
        }
        groups
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::errors::TransportError;
    use std::cell::RefCell;

    struct Recorder {
        requests: RefCell<Vec<EngineRequest>>,
    }

    impl RequestExecutor for Recorder {
        fn execute(&self, request: EngineRequest) -> Result<EngineResponse, TransportError> {
            self.requests.borrow_mut().push(request);
            Ok(EngineResponse::json_response(200, &json!({"errors": false, "items": []})))
        }
    }

    fn record(userid: i64) -> EventRecord {
        let mut r = EventRecord::new();
        r.insert("userid", userid);
        r.insert("eventname", "\\core\\event\\user_loggedin");
        r
    }

    #[test]
    fn acutime_strictly_increases() {
        let a = next_acutime();
        let b = next_acutime();
        let c = next_acutime();
        assert!(a < b && b < c);
    }

    #[test]
    fn acutime_tracks_wall_clock_millis() {
        let before = Utc::now().timestamp_millis();
        let stamp = next_acutime();
        // Earlier calls may have run ahead of the clock by a few bumps.
        assert!(stamp >= before);
        assert!(stamp - Utc::now().timestamp_millis() < 1_000);
    }

    #[test]
    fn body_pairs_action_and_document_lines() {
        let config = EngineConfig::new("localhost", 9200, "logstore");
        let recorder = Recorder { requests: RefCell::new(Vec::new()) };
        let writer = BulkWriter::new(&config, &recorder);

        let body = writer.bulk_body(&[record(1), record(2)]).unwrap();
        let lines: Vec<&str> = body.lines().collect();
        assert_eq!(lines.len(), 4);
        assert!(body.ends_with('\n'));
        assert_eq!(lines[0], r#"{"create":{"_index":"logstore"}}"#);

        let first: Value = serde_json::from_str(lines[1]).unwrap();
        let second: Value = serde_json::from_str(lines[3]).unwrap();
        assert_eq!(first["userid"], 1);
        assert_eq!(second["userid"], 2);
        assert!(first["realuserid"].is_null());
        assert!(first["acutime"].as_i64().unwrap() < second["acutime"].as_i64().unwrap());
        assert_eq!(first.as_object().unwrap().len(), 21);
    }

    #[test]
    fn empty_batch_issues_no_request() {
        let config = EngineConfig::new("localhost", 9200, "logstore");
        let recorder = Recorder { requests: RefCell::new(Vec::new()) };
        let writer = BulkWriter::new(&config, &recorder);
        assert!(writer.create_docs(&[]).unwrap().is_none());
        assert!(recorder.requests.borrow().is_empty());

        writer.create_docs(&[record(1)]).unwrap();
        let requests = recorder.requests.borrow();
        assert_eq!(requests.len(), 1);
        assert_eq!(requests[0].path, "/_bulk/");
    }

    #[test]
    fn missing_index_is_a_configuration_error() {
        let config = EngineConfig::new("localhost", 9200, "");
        let recorder = Recorder { requests: RefCell::new(Vec::new()) };
        let writer = BulkWriter::new(&config, &recorder);
        assert!(matches!(
            writer.create_docs(&[record(1)]),
            Err(EngineError::Configuration(_))
        ));
        assert!(recorder.requests.borrow().is_empty());
    }

    #[test]
    fn split_respects_request_cap() {
        let mut config = EngineConfig::new("localhost", 9200, "logstore");
        let recorder = Recorder { requests: RefCell::new(Vec::new()) };
        let records: Vec<_> = (0..10).map(record).collect();

        config.max_request_bytes = usize::MAX;
        let writer = BulkWriter::new(&config, &recorder);
        assert_eq!(writer.split_by_size(&records).len(), 1);

        config.max_request_bytes = 1;
        let writer = BulkWriter::new(&config, &recorder);
        let groups = writer.split_by_size(&records);
        assert_eq!(groups.len(), 10);
        assert!(groups.iter().all(|g| g.len() == 1));
    }
}
