//! Search-engine backed log store.

use crate::buffer::{BufferedWriter, DEFAULT_BUFFER_SIZE};
use crate::error::StoreError;
use crate::event::decode_other;
use crate::restore::{EventRestorer, RestoreExtra, StandardRestorer};
use crate::session::Session;
use crate::sort::stabilize_sort;
use crate::traits::{LogReader, LogWriter};
use logsearch_engine::results::{parse, parse_document};
use logsearch_engine::{
    encode_path_segment, BulkWriter, Cursor, EngineConfig, EngineError, EngineRequest,
    HttpExecutor, IndexManager, IndexStatus, QueryParams, QuerySpec, QueryTranslator,
    RequestExecutor, ResultSet,
};
use logsearch_schema::{EventRecord, Row, ACUTIME};
use serde_json::{Map, Value};
use std::sync::OnceLock;
use tracing::{debug, info, warn};

/// Log store backed by one search-engine index.
///
/// Writes are buffered and submitted through the bulk API; buffered events
/// are flushed when the store is dropped. Reads check readiness first and
/// answer empty when the backend is unusable.
pub struct SearchStore<X: RequestExecutor, R: EventRestorer = StandardRestorer> {
    config: EngineConfig,
    executor: X,
    restorer: R,
    session: Session,
    buffer: BufferedWriter,
    ready: OnceLock<()>,
}

impl SearchStore<HttpExecutor> {
    /// Validates `config` and opens an HTTP-backed store.
    pub fn connect(config: EngineConfig, session: Session) -> Result<Self, StoreError> {
        config.validate()?;
        let executor = HttpExecutor::new(&config)?;
        Ok(Self::new(config, executor, session))
    }
}

impl<X: RequestExecutor> SearchStore<X> {
    /// Creates a store producing [`crate::LogEvent`]s.
    pub fn new(config: EngineConfig, executor: X, session: Session) -> Self {
        Self::with_restorer(config, executor, session, StandardRestorer)
    }
}

impl<X: RequestExecutor, R: EventRestorer> SearchStore<X, R> {
    /// Creates a store with a custom event restorer.
    pub fn with_restorer(config: EngineConfig, executor: X, session: Session, restorer: R) -> Self {
        let buffer = BufferedWriter::new(DEFAULT_BUFFER_SIZE, config.json_format);
        Self {
            config,
            executor,
            restorer,
            session,
            buffer,
            ready: OnceLock::new(),
        }
    }

    /// Sets how many events are buffered before an automatic flush.
    pub fn with_buffer_size(mut self, capacity: usize) -> Self {
        self.buffer = BufferedWriter::new(capacity, self.config.json_format);
        self
    }

    /// Adapter configuration.
    pub fn config(&self) -> &EngineConfig {
        &self.config
    }

    /// Underlying executor.
    pub fn executor(&self) -> &X {
        &self.executor
    }

    /// Number of events waiting for the next flush.
    pub fn buffered(&self) -> usize {
        self.buffer.len()
    }

    /// Returns true when events from the current session are dropped.
    pub fn is_event_ignored(&self) -> bool {
        self.session.ignores_events(self.config.log_guests)
    }

    /// Checks that the backend answers and the index is usable.
    ///
    /// A missing index is created. Once the check succeeds the result is
    /// cached for the store's lifetime.
    pub fn readiness(&self) -> Result<(), StoreError> {
        if self.ready.get().is_some() {
            return Ok(());
        }
        let index = self.config.require_index()?;
        if !self.executor.ping() {
            return Err(StoreError::NotReady(format!(
                "engine at {} is unreachable",
                self.config.base_url()
            )));
        }
        match IndexManager::new(&self.config, &self.executor).ensure()? {
            IndexStatus::Compatible => {
                info!(index = %index, "log store ready");
                let _ = self.ready.set(());
                Ok(())
            }
            IndexStatus::Incompatible(problems) => Err(StoreError::NotReady(format!(
                "index {} has an incompatible mapping: {}",
                index,
                problems.join("; ")
            ))),
            IndexStatus::Missing => Err(StoreError::NotReady(format!(
                "index {} could not be created",
                index
            ))),
        }
    }

    /// Submits already flattened records, split to respect the request cap.
    ///
    /// Returns the number of records sent.
    pub fn insert_event_entries(&self, records: &[EventRecord]) -> Result<usize, StoreError> {
        if records.is_empty() {
            return Ok(0);
        }
        let writer = BulkWriter::new(&self.config, &self.executor);
        for chunk in writer.split_by_size(records) {
            writer.create_docs(chunk)?;
        }
        debug!(count = records.len(), "inserted event entries");
        Ok(records.len())
    }

    /// Opens a row cursor over matching documents.
    ///
    /// Returns `None` when the store is not ready or the engine fails while
    /// translating the query.
    pub fn rows(
        &self,
        select: &str,
        params: &QueryParams,
        sort: &str,
        from: u64,
        limit: u64,
    ) -> Result<Option<Cursor<'_, X>>, StoreError> {
        if !self.is_logging() {
            return Ok(None);
        }
        let sort = stabilize_sort(sort);
        let spec = QueryTranslator::new(&self.config, &self.executor).prepare_query(
            select,
            params,
            Some(&sort),
            Some(from),
            Some(limit),
        );
        match degrade(spec, "query translation")? {
            Some(spec) => Ok(Some(Cursor::new(&self.config, &self.executor, spec)?)),
            None => Ok(None),
        }
    }

    /// Rebuilds an event from a stored row, or `None` if it cannot be restored.
    pub fn restore_row(&self, row: Row) -> Option<R::Event> {
        let (data, extra) = prepare_row(row, self.config.json_format);
        match self.restorer.restore(data, extra) {
            Ok(event) => Some(event),
            Err(e) => {
                debug!(error = %e, "skipping unrestorable row");
                None
            }
        }
    }

    /// Translates a count query over matching documents.
    ///
    /// Returns `None` when the store is not ready.
    pub(crate) fn count_spec(
        &self,
        select: &str,
        params: &QueryParams,
    ) -> Result<Option<QuerySpec>, EngineError> {
        if !self.is_logging() {
            return Ok(None);
        }
        QueryTranslator::new(&self.config, &self.executor)
            .prepare_count(select, params)
            .map(Some)
    }

    /// Runs a search and returns the raw response.
    pub(crate) fn search_json(&self, spec: &QuerySpec) -> Result<Value, EngineError> {
        let index = self.config.require_index()?;
        let response = self.executor.execute(EngineRequest::post_json(
            format!("/{}/_search", index),
            spec.to_body(),
        ))?;
        response.json()
    }

    fn search(&self, spec: &QuerySpec) -> Result<ResultSet, EngineError> {
        Ok(parse(&self.search_json(spec)?))
    }
}

/// Splits a stored row into restorable data and out-of-band fields.
///
/// `other` is decoded, `id` and `acutime` are dropped, and `origin`, `ip`
/// and `realuserid` move into [`RestoreExtra`].
pub fn prepare_row(mut row: Row, json_format: bool) -> (Map<String, Value>, RestoreExtra) {
    let other = row.remove("other").unwrap_or_default();
    let extra = RestoreExtra {
        origin: row.remove("origin").and_then(|v| v.as_str().map(str::to_string)),
        ip: row.remove("ip").and_then(|v| v.as_str().map(str::to_string)),
        realuserid: row.remove("realuserid").and_then(|v| v.as_i64()),
    };
    row.remove("id");
    row.remove(ACUTIME);
    let mut data = row.to_json_map();
    data.insert("other".to_string(), decode_other(&other, json_format));
    (data, extra)
}

fn degrade<T>(result: Result<T, EngineError>, operation: &str) -> Result<Option<T>, StoreError> {
    match result {
        Ok(value) => Ok(Some(value)),
        Err(EngineError::Transport(e)) => {
            warn!(error = %e, "{} failed", operation);
            Ok(None)
        }
        Err(e) => Err(e.into()),
    }
}

impl<X: RequestExecutor, R: EventRestorer> LogWriter for SearchStore<X, R> {
    type Event = crate::LogEvent;

    fn write(&mut self, event: &Self::Event) -> Result<(), StoreError> {
        if self.is_event_ignored() {
            return Ok(());
        }
        if self.buffer.push(event) {
            self.flush()?;
        }
        Ok(())
    }

    fn flush(&mut self) -> Result<(), StoreError> {
        let records = self.buffer.take();
        self.insert_event_entries(&records)?;
        Ok(())
    }

    fn is_logging(&self) -> bool {
        match self.readiness() {
            Ok(()) => true,
            Err(e) => {
                warn!(error = %e, "log store not ready");
                false
            }
        }
    }
}

impl<X: RequestExecutor, R: EventRestorer> LogReader for SearchStore<X, R> {
    type Event = R::Event;
    type Iter<'a> = EventIter<'a, X, R> where Self: 'a;

    fn get_events_select(
        &self,
        select: &str,
        params: &QueryParams,
        sort: &str,
        from: u64,
        limit: u64,
    ) -> Result<Vec<R::Event>, StoreError> {
        Ok(self
            .get_events_select_iterator(select, params, sort, from, limit)?
            .collect())
    }

    fn get_events_select_count(&self, select: &str, params: &QueryParams) -> Result<u64, StoreError> {
        let translated = self.count_spec(select, params);
        let Some(spec) = degrade(translated, "count translation")?.flatten() else {
            return Ok(0);
        };
        let result = degrade(self.search(&spec), "count")?;
        Ok(result.and_then(|r| r.count).unwrap_or(0))
    }

    fn get_events_select_exists(&self, select: &str, params: &QueryParams) -> Result<bool, StoreError> {
        if !self.is_logging() {
            return Ok(false);
        }
        let translated = QueryTranslator::new(&self.config, &self.executor)
            .prepare_query(select, params, None, None, Some(1));
        let Some(spec) = degrade(translated, "exists translation")? else {
            return Ok(false);
        };
        let result = degrade(self.search(&spec), "exists")?;
        Ok(result.map(|r| !r.is_empty()).unwrap_or(false))
    }

    fn get_events_select_iterator<'a>(
        &'a self,
        select: &str,
        params: &QueryParams,
        sort: &str,
        from: u64,
        limit: u64,
    ) -> Result<EventIter<'a, X, R>, StoreError> {
        let cursor = self.rows(select, params, sort, from, limit)?;
        Ok(EventIter {
            store: self,
            cursor,
        })
    }

    fn get_log_event(&self, id: &str) -> Result<Option<R::Event>, StoreError> {
        if !self.is_logging() {
            return Ok(None);
        }
        let index = self.config.require_index()?;
        let path = format!("/{}/_doc/{}", index, encode_path_segment(id));
        let response = match self.executor.execute(EngineRequest::get(path)) {
            Ok(response) => response,
            Err(e) if e.is_not_found() => return Ok(None),
            Err(e) => {
                warn!(error = %e, id = %id, "event lookup failed");
                return Ok(None);
            }
        };
        let row = parse_document(&response.json()?);
        Ok(row.and_then(|row| self.restore_row(row)))
    }
}

impl<X: RequestExecutor, R: EventRestorer> Drop for SearchStore<X, R> {
    fn drop(&mut self) {
        if self.buffer.is_empty() {
            return;
        }
        if let Err(e) = self.flush() {
            warn!(error = %e, "failed to flush buffered events on drop");
        }
    }
}

/// Streams restored events out of a row cursor.
///
/// Rows that cannot be restored are skipped.
pub struct EventIter<'a, X: RequestExecutor, R: EventRestorer> {
    store: &'a SearchStore<X, R>,
    cursor: Option<Cursor<'a, X>>,
}

impl<X: RequestExecutor, R: EventRestorer> EventIter<'_, X, R> {
    /// Position of the last produced row, if any.
    pub fn key(&self) -> Option<u64> {
        self.cursor.as_ref().and_then(Cursor::key)
    }

    /// Releases the underlying cursor.
    pub fn close(self) {}
}

impl<X: RequestExecutor, R: EventRestorer> Iterator for EventIter<'_, X, R> {
    type Item = R::Event;

    fn next(&mut self) -> Option<R::Event> {
        let cursor = self.cursor.as_mut()?;
        for row in cursor.by_ref() {
            if let Some(event) = self.store.restore_row(row) {
                return Some(event);
            }
        }
        None
    }
}
