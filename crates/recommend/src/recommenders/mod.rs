//! The three fallback tiers.
//!
//! - **model**: Oracle ranking reconciled against the catalog
//! - **popularity**: Most-ordered items
//! - **random**: Uniform catalog sample

pub mod model;
pub mod popularity;
pub mod random;

pub use model::ModelBackedRecommender;
pub use popularity::{rank_by_popularity, PopularityRanker, PopularityRecommender};
pub use random::{RandomRecommender, RandomSampler};
