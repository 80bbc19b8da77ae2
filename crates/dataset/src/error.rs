//! Error types for building training datasets.

use thiserror::Error;

/// Errors that abort a dataset build.
///
/// A bad row never produces one of these; it is dropped and counted.
#[derive(Error, Debug)]
pub enum DatasetError {
    /// Input log could not be found or opened
    #[error("Failed to open file: {path}")]
    FileNotFound { path: String },

    #[error("I/O error: {0}")]
    IoError(#[from] std::io::Error),

    /// The log could not be read as CSV at all
    #[error("CSV error: {0}")]
    Csv(#[from] csv::Error),

    /// Input has no header line
    #[error("{file} is empty")]
    EmptyInput { file: String },

    /// A required column is not in the header
    #[error("Column '{column}' not found in {file}")]
    MissingColumn { column: String, file: String },
}

pub type Result<T> = std::result::Result<T, DatasetError>;
