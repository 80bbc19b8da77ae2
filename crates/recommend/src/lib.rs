//! Recommendation serving with graceful degradation.
//!
//! This crate provides:
//! - `reconcile`: maps the oracle's opaque ranked keys onto catalog rows
//! - Three `Recommender` tiers: model-backed, popularity and random
//! - `FallbackChain` for trying the tiers in order
//! - `RecommendationService` for wiring it all to the stores and the oracle
//!
//! ## Architecture
//! A request runs through the chain:
//! 1. Model: ask the ranking oracle, reconcile its keys with the catalog
//! 2. Popularity: most-ordered items, ties broken by id
//! 3. Random: a uniform sample of the catalog
//!
//! Tier failures are logged and recorded on the result; callers only ever
//! see a (possibly empty) list.
//!
//! ## Example Usage
//! ```ignore
//! use recommend::{RecommendConfig, RecommendationService};
//!
//! let service = RecommendationService::from_index(index, oracle, RecommendConfig::default());
//! let result = service.recommend("1042").await;
//! ```

pub mod config;
pub mod error;
pub mod fallback;
pub mod reconcile;
pub mod recommenders;
pub mod service;
pub mod traits;

pub use config::RecommendConfig;
pub use error::{TierError, TierFailure};
pub use fallback::{FallbackChain, Recommendations};
pub use reconcile::{reconcile, ReconcileStrategy};
pub use service::RecommendationService;
pub use traits::{RecommendRequest, Recommender, Tier};
