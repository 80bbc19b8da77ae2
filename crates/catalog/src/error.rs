//! Error types for the catalog crate.
//!
//! Two families live here:
//! - `CatalogError` covers loading and parsing the catalog files
//! - `StoreError` covers queries against a loaded store

use thiserror::Error;

/// Errors that can occur while loading and parsing catalog data
#[derive(Error, Debug)]
pub enum CatalogError {
    /// File could not be found or opened
    #[error("Failed to open file: {path}")]
    FileNotFound { path: String },

    /// I/O error occurred while reading file
    #[error("I/O error: {0}")]
    IoError(#[from] std::io::Error),

    /// Line in data file couldn't be parsed
    #[error("Parse error at line {line} in {file}: {reason}")]
    ParseError {
        file: String,
        line: usize,
        reason: String,
    },

    /// Two catalog rows share the same id
    #[error("Duplicate item id {id} in {file}")]
    DuplicateItem { file: String, id: i64 },
}

/// Errors raised by queries against a catalog or interaction store
///
/// These are recoverable from the point of view of the serving path:
/// callers decide whether a failed query ends a request or just a tier.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum StoreError {
    /// The table backing this query was never loaded
    #[error("table {0} is not available")]
    TableMissing(String),

    /// The backing store could not be read
    #[error("store unavailable: {0}")]
    Unavailable(String),
}

/// Convenience type alias for Results in this crate
pub type Result<T> = std::result::Result<T, CatalogError>;
