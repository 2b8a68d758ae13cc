//! In-memory write buffer.

use crate::event::LogEvent;
use logsearch_schema::EventRecord;

/// Default number of events held before an automatic flush.
pub const DEFAULT_BUFFER_SIZE: usize = 1000;

/// Accumulates flattened events until they are submitted in one batch.
#[derive(Debug)]
pub struct BufferedWriter {
    records: Vec<EventRecord>,
    capacity: usize,
    json_format: bool,
}

impl BufferedWriter {
    /// Creates a buffer that reports full after `capacity` events.
    pub fn new(capacity: usize, json_format: bool) -> Self {
        Self {
            records: Vec::new(),
            capacity: capacity.max(1),
            json_format,
        }
    }

    /// Adds an event. Returns true once the buffer should be flushed.
    pub fn push(&mut self, event: &LogEvent) -> bool {
        self.records.push(event.to_record(self.json_format));
        self.records.len() >= self.capacity
    }

    /// Drains the buffer.
    pub fn take(&mut self) -> Vec<EventRecord> {
        std::mem::take(&mut self.records)
    }

    /// Number of buffered events.
    pub fn len(&self) -> usize {
        self.records.len()
    }

    /// Returns true when nothing is buffered.
    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }
}
