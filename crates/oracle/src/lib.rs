//! Ranking oracle clients.
//!
//! A ranking oracle is the trained model seen from the outside: given a
//! user it returns item ids, most preferred first. Its id space is opaque
//! and need not match the catalog's. This crate provides:
//! - The `RankingOracle` trait
//! - `PrecomputedOracle`, backed by an exported ranking file
//! - `GrpcRankingOracle`, a client for a remote ranking service
//! - `OracleHandle`, which loads the configured oracle exactly once

use async_trait::async_trait;

pub mod error;
pub mod grpc;
pub mod handle;
pub mod precomputed;

// Include the generated protobuf code
pub mod proto {
    tonic::include_proto!("ranking");
}

pub use error::{OracleError, Result};
pub use grpc::GrpcRankingOracle;
pub use handle::{OracleHandle, OracleLoader, OracleSource, OracleState};
pub use precomputed::PrecomputedOracle;

/// Opaque model output: item ids, most preferred first, at most `k` long.
pub type RankedKeys = Vec<String>;

/// A source of per-user rankings over opaque item ids.
#[async_trait]
pub trait RankingOracle: Send + Sync {
    /// Short name for logs
    fn name(&self) -> &str;

    /// Up to `k` item ids for `user_id`, most preferred first
    async fn recommend_for_user(&self, user_id: &str, k: usize) -> Result<RankedKeys>;
}
