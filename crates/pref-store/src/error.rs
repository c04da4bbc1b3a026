//! Error types for the pref-store crate.

use thiserror::Error;

/// Errors raised by the preference stores and the boundary file parsers.
#[derive(Error, Debug)]
pub enum StoreError {
    /// File could not be found or opened
    #[error("Failed to open file: {path}")]
    FileNotFound { path: String },

    /// I/O error occurred while reading or writing a file
    #[error("I/O error: {0}")]
    IoError(#[from] std::io::Error),

    /// Line in a data file couldn't be parsed
    ///
    /// This variant stores context about where the error occurred
    #[error("Parse error at line {line} in {file}: {reason}")]
    ParseError {
        file: String,
        line: usize,
        reason: String,
    },

    /// A data field had an invalid value
    #[error("Invalid value for {field}: {value}")]
    InvalidValue { field: String, value: String },

    /// Expected number of fields in a line doesn't match actual
    #[error("Expected {expected} fields but found {found} in line {line}")]
    FieldCountMismatch {
        expected: usize,
        found: usize,
        line: usize,
    },

    /// An indexed store was mutated after it was frozen for reads
    #[error("Store has already been built; writes are no longer accepted")]
    ModelAlreadyBuilt,

    /// An indexed store was read before `freeze()` built its index
    #[error("Store has not been built yet; call freeze() before reading")]
    ModelNotBuilt,
}

/// Convenience type alias for Results in this crate
pub type Result<T> = std::result::Result<T, StoreError>;
