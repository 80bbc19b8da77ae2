//! Why a fallback tier did not produce an answer.
//!
//! None of these reach the caller of the chain: they are logged, recorded
//! on the result for observability, and move the chain to its next tier.

use crate::traits::Tier;
use catalog::StoreError;
use std::time::Duration;
use thiserror::Error;

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum TierError {
    #[error("ranking oracle unavailable: {0}")]
    OracleUnavailable(String),

    #[error("ranking oracle query failed: {0}")]
    OracleQueryFailed(String),

    #[error("ranking oracle timed out after {0:?}")]
    OracleTimedOut(Duration),

    #[error("ranking oracle returned no items")]
    OracleEmpty,

    /// None of the oracle's keys matched a catalog row
    #[error("none of {keys} ranked keys resolved to catalog items")]
    ReconciliationEmpty { keys: usize },

    #[error("catalog lookup failed: {0}")]
    CatalogLookupFailed(StoreError),

    #[error("popularity query failed: {0}")]
    PopularityQueryFailed(StoreError),

    #[error("popularity query timed out after {0:?}")]
    PopularityTimedOut(Duration),

    #[error("popularity query returned no rows")]
    PopularityEmpty,

    #[error("catalog could not be sampled: {0}")]
    CatalogUnavailable(StoreError),

    #[error("{0} tier returned no items")]
    NoResults(Tier),

    #[error("tier task failed: {0}")]
    TaskFailed(String),
}

/// A tier that was attempted and skipped
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TierFailure {
    pub tier: Tier,
    pub error: TierError,
}
