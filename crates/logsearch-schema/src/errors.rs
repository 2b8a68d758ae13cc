use thiserror::Error;

/// Errors raised when a record or an index mapping disagrees with the registry.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum SchemaError {
    /// A non-nullable field is absent or null.
    #[error("missing required field: {0}")]
    MissingField(String),
    /// A field holds a value of the wrong kind.
    #[error("field {field} expects {expected}, found {found}")]
    TypeMismatch {
        /// Field name.
        field: String,
        /// Engine type the registry declares.
        expected: String,
        /// Kind of value or mapping actually found.
        found: String,
    },
    /// A field that the registry does not know about.
    #[error("unexpected field: {0}")]
    UnexpectedField(String),
    /// The mapping document itself could not be interpreted.
    #[error("invalid mapping: {0}")]
    InvalidMapping(String),
}
