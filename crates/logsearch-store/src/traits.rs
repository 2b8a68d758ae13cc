//! Log writer and reader traits.

use crate::error::StoreError;
use logsearch_engine::QueryParams;

/// Accepts events for storage.
pub trait LogWriter {
    /// Event type accepted.
    type Event;

    /// Buffers one event, flushing when the buffer fills.
    ///
    /// Events from ignored sessions are dropped silently.
    fn write(&mut self, event: &Self::Event) -> Result<(), StoreError>;

    /// Submits every buffered event.
    fn flush(&mut self) -> Result<(), StoreError>;

    /// Returns true when the backend is reachable and the index usable.
    fn is_logging(&self) -> bool;
}

/// Queries stored events.
///
/// When the store is not ready every method returns an empty answer rather
/// than an error.
pub trait LogReader {
    /// Event type produced.
    type Event;

    /// Iterator returned by [`LogReader::get_events_select_iterator`].
    type Iter<'a>: Iterator<Item = Self::Event>
    where
        Self: 'a;

    /// Returns the matching events, fully materialized.
    ///
    /// `limit = 0` means no limit.
    fn get_events_select(
        &self,
        select: &str,
        params: &QueryParams,
        sort: &str,
        from: u64,
        limit: u64,
    ) -> Result<Vec<Self::Event>, StoreError>;

    /// Counts matching events.
    fn get_events_select_count(&self, select: &str, params: &QueryParams)
        -> Result<u64, StoreError>;

    /// Returns true when at least one event matches.
    fn get_events_select_exists(&self, select: &str, params: &QueryParams)
        -> Result<bool, StoreError>;

    /// Streams matching events one page at a time.
    fn get_events_select_iterator<'a>(
        &'a self,
        select: &str,
        params: &QueryParams,
        sort: &str,
        from: u64,
        limit: u64,
    ) -> Result<Self::Iter<'a>, StoreError>;

    /// Fetches a single event by document id.
    fn get_log_event(&self, id: &str) -> Result<Option<Self::Event>, StoreError>;
}
