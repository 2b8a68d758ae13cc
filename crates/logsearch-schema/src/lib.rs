//! Event record model and index schema for the logsearch store.
//!
//! This crate provides:
//! - [`FieldValue`] and [`EventRecord`], the typed flat mapping every logged
//!   occurrence is reduced to before it reaches the engine
//! - [`SchemaRegistry`], the fixed set of indexed fields and their engine types,
//!   used to build index-creation payloads and to validate an existing index
//!
//! Core invariants:
//! - Records submitted for indexing carry exactly the registry's field set
//! - Missing fields are written as explicit nulls, never omitted
//! - `acutime` is attached by the writer and never supplied by callers
//!
#![deny(missing_docs)]

/// Error types for schema validation.
pub mod errors;
/// Field registry and engine mapping helpers.
pub mod registry;
/// Scalar field values and flat event records.
pub mod value;

pub use errors::SchemaError;
pub use registry::{FieldSpec, FieldType, SchemaRegistry, ACUTIME};
pub use value::{EventRecord, FieldValue, Row};
