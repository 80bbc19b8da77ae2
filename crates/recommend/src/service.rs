//! # Recommendation Service
//!
//! Wires the stores, the shared oracle handle and the fallback chain together
//! and serves per-user requests:
//! 1. Resolve the oracle state (loads the oracle on first use); a load that
//!    outlasts `oracle_timeout` counts as unavailable for this request
//! 2. Build a `RecommendRequest` carrying that state
//! 3. Run the fallback chain
//!
//! The service is cheap to clone; clones share the chain and the oracle.

use crate::config::RecommendConfig;
use crate::fallback::{FallbackChain, Recommendations};
use crate::recommenders::{
    ModelBackedRecommender, PopularityRanker, PopularityRecommender, RandomRecommender,
    RandomSampler,
};
use crate::traits::{RecommendRequest, Tier};
use catalog::{CatalogIndex, CatalogStore, InteractionStore};
use oracle::{OracleHandle, OracleState};
use std::sync::Arc;
use std::time::Instant;
use tracing::{info, warn};

#[derive(Clone)]
pub struct RecommendationService {
    chain: Arc<FallbackChain>,
    oracle: Arc<OracleHandle>,
    config: RecommendConfig,
}

impl RecommendationService {
    /// Build the chain from `config.tiers`
    pub fn new(
        catalog: Arc<dyn CatalogStore>,
        interactions: Arc<dyn InteractionStore>,
        oracle: Arc<OracleHandle>,
        config: RecommendConfig,
    ) -> Self {
        let mut chain = FallbackChain::new();
        if config.uses(Tier::Model) {
            chain = chain.add_tier(
                ModelBackedRecommender::new(catalog.clone())
                    .with_strategy(config.reconcile_strategy)
                    .with_timeout(config.oracle_timeout),
            );
        }
        if config.uses(Tier::Popularity) {
            let ranker = PopularityRanker::new(catalog.clone(), interactions);
            chain = chain.add_tier(
                PopularityRecommender::new(ranker).with_timeout(config.popularity_timeout),
            );
        }
        if config.uses(Tier::Random) {
            let mut sampler = RandomSampler::new(catalog);
            if let Some(seed) = config.seed {
                sampler = sampler.with_seed(seed);
            }
            chain = chain.add_tier(RandomRecommender::new(sampler));
        }

        Self {
            chain: Arc::new(chain),
            oracle,
            config,
        }
    }

    /// Service over an in-memory catalog that also serves order counts
    pub fn from_index(
        index: Arc<CatalogIndex>,
        oracle: Arc<OracleHandle>,
        config: RecommendConfig,
    ) -> Self {
        Self::new(index.clone(), index, oracle, config)
    }

    pub fn config(&self) -> &RecommendConfig {
        &self.config
    }

    /// Load the oracle now instead of on the first request
    pub async fn preload(&self) -> OracleState {
        self.oracle.preload().await.clone()
    }

    /// Recommendations for `user_id` with the configured `k`
    pub async fn recommend(&self, user_id: &str) -> Recommendations {
        self.recommend_k(user_id, self.config.k).await
    }

    pub async fn recommend_k(&self, user_id: &str, k: usize) -> Recommendations {
        let start = Instant::now();
        let state = tokio::time::timeout(self.config.oracle_timeout, self.oracle.state())
            .await
            .unwrap_or_else(|_| {
                warn!(
                    "Oracle still loading after {:?}, serving user {} without it",
                    self.config.oracle_timeout, user_id
                );
                OracleState::unavailable("loading")
            });
        let request = RecommendRequest::new(user_id, k, state);

        let result = self.chain.recommend(&request).await;
        info!(
            "Served {} items for user {} from {} in {:.2?}",
            result.len(),
            user_id,
            result.source.map(|t| t.as_str()).unwrap_or("none"),
            start.elapsed()
        );
        result
    }
}
