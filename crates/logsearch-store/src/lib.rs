//! Event log store backed by a search engine index.
//!
//! This crate provides:
//! - `LogWriter` and `LogReader` traits for buffered event writes and
//!   relational-style reads
//! - [`SearchStore`], the engine-backed implementation of both
//! - Sort stabilization on the `acutime` tie-breaker
//! - Pluggable event reconstruction through [`EventRestorer`]
//! - Personal-data discovery, export and erasure via [`Privacy`]
//!
//! Core invariants:
//! - Reads never fail because the backend is down; they answer empty
//! - Events from ignored sessions never reach the engine
//! - Buffered events are flushed when the store is dropped

#![deny(missing_docs)]

/// Write buffering.
pub mod buffer;
/// Error types for store operations.
pub mod error;
/// Host event model.
pub mod event;
/// Personal-data operations.
pub mod privacy;
/// Event reconstruction.
pub mod restore;
/// Caller session.
pub mod session;
/// Sort stabilization.
pub mod sort;
/// Search-engine store.
pub mod store;
/// Writer and reader traits.
pub mod traits;

pub use buffer::{BufferedWriter, DEFAULT_BUFFER_SIZE};
pub use error::{RestoreError, StoreError};
pub use event::{decode_other, encode_other, LogEvent};
pub use logsearch_engine::{EngineConfig, QueryParams};
pub use privacy::{ExportedEvent, Privacy, USER_FIELDS};
pub use restore::{EventRestorer, RestoreExtra, StandardRestorer};
pub use session::Session;
pub use sort::stabilize_sort;
pub use store::{prepare_row, EventIter, SearchStore};
pub use traits::{LogReader, LogWriter};
