//! Last-resort tier: a uniform sample of the catalog.

use crate::error::TierError;
use crate::traits::{RecommendRequest, Recommender, Tier};
use async_trait::async_trait;
use catalog::{CatalogItem, CatalogStore, StoreError};
use rand::rngs::StdRng;
use rand::seq::IndexedRandom;
use rand::SeedableRng;
use std::sync::Arc;

/// Draws `k` distinct catalog items uniformly at random.
///
/// With a seed every call replays the same sample, which keeps tests and
/// benchmarks reproducible.
#[derive(Clone)]
pub struct RandomSampler {
    catalog: Arc<dyn CatalogStore>,
    seed: Option<u64>,
}

impl RandomSampler {
    pub fn new(catalog: Arc<dyn CatalogStore>) -> Self {
        Self { catalog, seed: None }
    }

    pub fn with_seed(mut self, seed: u64) -> Self {
        self.seed = Some(seed);
        self
    }

    fn rng(&self) -> StdRng {
        match self.seed {
            Some(seed) => StdRng::seed_from_u64(seed),
            None => StdRng::from_rng(&mut rand::rng()),
        }
    }

    /// `min(k, catalog size)` distinct items (blocking)
    pub fn sample_k(&self, k: usize) -> Result<Vec<CatalogItem>, StoreError> {
        let items = self.catalog.all_items()?;
        let mut rng = self.rng();
        Ok(items.choose_multiple(&mut rng, k).cloned().collect())
    }
}

/// Fallback tier serving a random sample.
///
/// An empty catalog is a valid (empty) answer, not a failure.
pub struct RandomRecommender {
    sampler: RandomSampler,
}

impl RandomRecommender {
    pub fn new(sampler: RandomSampler) -> Self {
        Self { sampler }
    }
}

#[async_trait]
impl Recommender for RandomRecommender {
    fn tier(&self) -> Tier {
        Tier::Random
    }

    async fn recommend(&self, request: &RecommendRequest) -> Result<Vec<CatalogItem>, TierError> {
        let sampler = self.sampler.clone();
        let k = request.k;

        tokio::task::spawn_blocking(move || sampler.sample_k(k))
            .await
            .map_err(|e| TierError::TaskFailed(e.to_string()))?
            .map_err(TierError::CatalogUnavailable)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use catalog::CatalogIndex;
    use oracle::OracleState;
    use std::collections::HashSet;

    fn create_test_index(n: i64) -> Arc<CatalogIndex> {
        let mut index = CatalogIndex::new();
        for id in 1..=n {
            index.insert_item(CatalogItem::new(id, format!("item {}", id), "Misc"));
        }
        Arc::new(index)
    }

    #[test]
    fn test_sample_is_distinct_and_bounded() {
        let sampler = RandomSampler::new(create_test_index(20));
        for _ in 0..10 {
            let items = sampler.sample_k(5).unwrap();
            let ids: HashSet<_> = items.iter().map(|i| i.id).collect();
            assert_eq!(items.len(), 5);
            assert_eq!(ids.len(), 5);
        }
    }

    #[test]
    fn test_small_catalog_returns_everything() {
        let sampler = RandomSampler::new(create_test_index(3));
        let mut ids: Vec<_> = sampler.sample_k(5).unwrap().iter().map(|i| i.id).collect();
        ids.sort();
        assert_eq!(ids, vec![1, 2, 3]);
    }

    #[test]
    fn test_seeded_sampler_replays() {
        let sampler = RandomSampler::new(create_test_index(50)).with_seed(7);
        assert_eq!(sampler.sample_k(5).unwrap(), sampler.sample_k(5).unwrap());
    }

    #[tokio::test]
    async fn test_empty_catalog_is_not_an_error() {
        let recommender = RandomRecommender::new(RandomSampler::new(Arc::new(CatalogIndex::new())));
        let request = RecommendRequest::new("1", 5, OracleState::unavailable("test"));

        let items = recommender.recommend(&request).await.unwrap();
        assert!(items.is_empty());
    }
}
