//! Query translation, bulk indexing and paginated retrieval over a search
//! engine's REST API.
//!
//! This crate provides:
//! - [`RequestExecutor`] and its blocking HTTP implementation, with optional
//!   request signing
//! - [`QueryTranslator`], which turns relational filter/sort/limit/offset
//!   requests into native engine queries via the engine's SQL translator
//! - [`BulkWriter`], which submits batches through the bulk-indexing API
//! - [`results::parse`], which flattens search responses into rows
//! - [`Cursor`], a forward-only iterator that fetches one page at a time
//! - [`IndexManager`], for index bootstrap and schema checks
//!
//! ## Quick Start
//!
//! ```rust,no_run
//! use logsearch_engine::{Cursor, EngineConfig, HttpExecutor, QueryParams, QueryTranslator};
//!
//! let config = EngineConfig::from_file("logsearch.json")?;
//! config.validate()?;
//! let executor = HttpExecutor::new(&config)?;
//!
//! let spec = QueryTranslator::new(&config, &executor).prepare_query(
//!     "courseid = :course",
//!     &QueryParams::named([("course", 2i64)]),
//!     Some("timecreated ASC, acutime ASC"),
//!     None,
//!     Some(1000),
//! )?;
//! let mut cursor = Cursor::new(&config, &executor, spec)?;
//! while let Some(row) = cursor.advance() {
//!     println!("{:?}", row);
//! }
//! # Ok::<(), Box<dyn std::error::Error>>(())
//! ```

#![deny(missing_docs)]

/// Bulk indexing of event records.
pub mod bulk;
/// Adapter configuration.
pub mod config;
/// Paginated result cursor.
pub mod cursor;
/// Error types for engine operations.
pub mod errors;
/// Request execution.
pub mod executor;
/// Index management.
pub mod index;
/// Engine request and response values.
pub mod request;
/// Search response parsing.
pub mod results;
/// Request signing.
pub mod signing;
/// Query translation.
pub mod translator;

pub use bulk::{next_acutime, BulkWriter};
pub use config::{EngineConfig, SigningConfig};
pub use cursor::{Cursor, CursorState};
pub use errors::{EngineError, TransportError};
pub use executor::{HttpExecutor, RequestExecutor};
pub use index::{IndexManager, IndexStatus};
pub use request::{encode_path_segment, EngineRequest, EngineResponse, Method, RequestBody};
pub use results::{BucketPage, ResultSet};
pub use translator::{normalize_params, QueryParams, QuerySpec, QueryTranslator};
