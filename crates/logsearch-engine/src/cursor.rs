//! Forward-only, lazily paginated cursor over search results.
//!
//! The engine has no server-side cursor, so every page is an independent
//! `_search` request with its own `from`/`size`. The cursor holds at most one
//! page of rows at a time, whatever the logical size of the query.

use crate::config::EngineConfig;
use crate::errors::EngineError;
use crate::executor::RequestExecutor;
use crate::request::EngineRequest;
use crate::results;
use crate::translator::QuerySpec;
use logsearch_schema::Row;
use std::collections::VecDeque;
use tracing::{debug, warn};

/// Lifecycle of a [`Cursor`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CursorState {
    /// No page requested yet.
    Uninitialized,
    /// Rows may still be produced.
    Active,
    /// No further rows; terminal.
    Exhausted,
}

/// Lazily fetched, memory-bounded iterator over the rows of one query.
///
/// Construction fetches the first page eagerly. [`advance`](Self::advance)
/// pops buffered rows and fetches the next page only when the buffer is empty
/// and the logical `size` has not been reached. A failed page fetch counts as
/// an empty page and ends the iteration.
///
/// # Example
///
/// ```rust,no_run
/// use logsearch_engine::{Cursor, EngineConfig, HttpExecutor, QueryParams, QueryTranslator};
///
/// let config = EngineConfig::new("localhost", 9200, "logstore");
/// let executor = HttpExecutor::new(&config)?;
/// let spec = QueryTranslator::new(&config, &executor)
///     .prepare_query("userid = ?", &QueryParams::positional([5i64]), None, None, Some(500))?;
/// for row in Cursor::new(&config, &executor, spec)? {
///     println!("{:?}", row.get("eventname"));
/// }
/// # Ok::<(), Box<dyn std::error::Error>>(())
/// ```
pub struct Cursor<'a, X: RequestExecutor + ?Sized> {
    executor: &'a X,
    path: String,
    spec: QuerySpec,
    size: u64,
    batch_size: u64,
    from: u64,
    fetched: u64,
    pages: u64,
    drained: bool,
    buffer: VecDeque<Row>,
    key: i64,
    current: Option<Row>,
    state: CursorState,
}

impl<'a, X: RequestExecutor + ?Sized> Cursor<'a, X> {
    /// Opens a cursor over `spec`, fetching the first page.
    ///
    /// `spec.size` is the total number of rows the cursor will ever produce
    /// and `spec.from` the offset of the first one; pages are requested in
    /// `config.batch_size` steps.
    ///
    /// # Errors
    ///
    /// Returns [`EngineError::Configuration`] if the index name or the batch
    /// size is unset. Transport failures do not fail construction; they
    /// leave the cursor exhausted.
    pub fn new(config: &EngineConfig, executor: &'a X, spec: QuerySpec) -> Result<Self, EngineError> {
        let index = config.require_index()?;
        if config.batch_size == 0 {
            return Err(EngineError::config("batch_size must be positive"));
        }
        let mut cursor = Self {
            executor,
            path: format!("/{}/_search", index),
            size: spec.size,
            from: spec.from,
            spec,
            batch_size: config.batch_size,
            fetched: 0,
            pages: 0,
            drained: false,
            buffer: VecDeque::new(),
            key: -1,
            current: None,
            state: CursorState::Uninitialized,
        };
        cursor.fetch_page();
        cursor.state = if cursor.buffer.is_empty() {
            CursorState::Exhausted
        } else {
            CursorState::Active
        };
        Ok(cursor)
    }

    fn fetch_page(&mut self) {
        if self.pages > 0 {
            self.from += self.batch_size;
        }
        let page_size = self.batch_size.min(self.size - self.fetched);
        self.pages += 1;

        let request = EngineRequest::post_json(&self.path, self.spec.page_body(self.from, page_size));
        let mut rows = match self.executor.execute(request) {
            Ok(response) => match response.json() {
                Ok(body) => results::parse(&body).rows,
                Err(e) => {
                    warn!(from = self.from, error = %e, "undecodable page, ending iteration");
                    Vec::new()
                }
            },
            Err(e) => {
                warn!(from = self.from, error = %e, "page fetch failed, ending iteration");
                Vec::new()
            }
        };
        rows.truncate(page_size as usize);
        if (rows.len() as u64) < page_size || page_size == 0 {
            self.drained = true;
        }
        debug!(from = self.from, size = page_size, rows = rows.len(), "fetched page");
        self.fetched += rows.len() as u64;
        self.buffer.extend(rows);
    }

    fn step(&mut self) -> Option<Row> {
        if self.state == CursorState::Exhausted {
            return None;
        }
        if self.buffer.is_empty() && !self.drained && self.consumed() < self.size {
            self.fetch_page();
        }
        match self.buffer.pop_front() {
            Some(row) => {
                self.key += 1;
                self.current = Some(row.clone());
                self.state = CursorState::Active;
                Some(row)
            }
            None => {
                self.current = None;
                self.state = CursorState::Exhausted;
                None
            }
        }
    }

    /// Moves to the next row and returns it, or `None` once exhausted.
    ///
    /// Calling `advance` after exhaustion never contacts the engine again.
    pub fn advance(&mut self) -> Option<&Row> {
        self.step()?;
        self.current.as_ref()
    }

    /// The most recently produced row.
    pub fn current(&self) -> Option<&Row> {
        self.current.as_ref()
    }

    /// True while positioned on a produced row.
    pub fn valid(&self) -> bool {
        self.state == CursorState::Active && self.current.is_some()
    }

    /// Zero-based index of the current row; `None` before the first row.
    pub fn key(&self) -> Option<u64> {
        u64::try_from(self.key).ok()
    }

    /// Current lifecycle state.
    pub fn state(&self) -> CursorState {
        self.state
    }

    /// Number of page requests issued so far.
    pub fn pages_fetched(&self) -> u64 {
        self.pages
    }

    /// Rows fetched but not yet produced.
    pub fn buffered(&self) -> usize {
        self.buffer.len()
    }

    /// Logical number of rows the cursor may produce.
    pub fn size(&self) -> u64 {
        self.size
    }

    /// Releases the cursor. No server-side state exists, so nothing is sent.
    pub fn close(self) {}

    fn consumed(&self) -> u64 {
        (self.key + 1) as u64
    }
}

impl<X: RequestExecutor + ?Sized> Iterator for Cursor<'_, X> {
    type Item = Row;

    fn next(&mut self) -> Option<Row> {
        self.step()
    }
}
