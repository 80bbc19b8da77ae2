use thiserror::Error;

/// Errors that can occur when loading or querying a ranking oracle
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum OracleError {
    /// No oracle is configured for this deployment
    #[error("ranking oracle disabled")]
    Disabled,

    #[error("Failed to connect to ranking service: {0}")]
    ConnectionError(String),

    /// A ranking export could not be read or decoded
    #[error("Invalid ranking export {path}: {reason}")]
    InvalidExport { path: String, reason: String },

    #[error("No ranking for user {0}")]
    UnknownUser(String),

    #[error("Ranking query failed: {0}")]
    QueryFailed(String),
}

pub type Result<T> = std::result::Result<T, OracleError>;
