//! Serving configuration.

use crate::reconcile::ReconcileStrategy;
use crate::traits::Tier;
use std::time::Duration;

/// Knobs for the recommendation service and its fallback chain.
#[derive(Debug, Clone, PartialEq)]
pub struct RecommendConfig {
    /// Items per response
    pub k: usize,
    /// Upper bound on one ranking oracle call
    pub oracle_timeout: Duration,
    /// Upper bound on one popularity query
    pub popularity_timeout: Duration,
    pub reconcile_strategy: ReconcileStrategy,
    /// Tiers the chain may use; always tried in `Tier` order
    pub tiers: Vec<Tier>,
    /// Fixed seed for the random tier (reproducible samples)
    pub seed: Option<u64>,
}

impl Default for RecommendConfig {
    fn default() -> Self {
        Self {
            k: 5,
            oracle_timeout: Duration::from_secs(2),
            popularity_timeout: Duration::from_secs(2),
            reconcile_strategy: ReconcileStrategy::default(),
            tiers: Tier::ALL.to_vec(),
            seed: None,
        }
    }
}

impl RecommendConfig {
    pub fn with_k(mut self, k: usize) -> Self {
        self.k = k;
        self
    }

    pub fn with_oracle_timeout(mut self, timeout: Duration) -> Self {
        self.oracle_timeout = timeout;
        self
    }

    pub fn with_popularity_timeout(mut self, timeout: Duration) -> Self {
        self.popularity_timeout = timeout;
        self
    }

    pub fn with_reconcile_strategy(mut self, strategy: ReconcileStrategy) -> Self {
        self.reconcile_strategy = strategy;
        self
    }

    /// Restrict the chain to these tiers (order and duplicates are ignored)
    pub fn with_tiers(mut self, tiers: impl IntoIterator<Item = Tier>) -> Self {
        let mut tiers: Vec<Tier> = tiers.into_iter().collect();
        tiers.sort();
        tiers.dedup();
        self.tiers = tiers;
        self
    }

    pub fn with_seed(mut self, seed: u64) -> Self {
        self.seed = Some(seed);
        self
    }

    pub fn uses(&self, tier: Tier) -> bool {
        self.tiers.contains(&tier)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults() {
        let config = RecommendConfig::default();
        assert_eq!(config.k, 5);
        assert_eq!(config.tiers, vec![Tier::Model, Tier::Popularity, Tier::Random]);
        assert_eq!(config.reconcile_strategy, ReconcileStrategy::Batch);
    }

    #[test]
    fn test_with_tiers_normalizes() {
        let config = RecommendConfig::default().with_tiers([Tier::Random, Tier::Model, Tier::Random]);
        assert_eq!(config.tiers, vec![Tier::Model, Tier::Random]);
        assert!(!config.uses(Tier::Popularity));
    }
}
