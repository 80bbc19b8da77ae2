//! Popularity tier: best sellers first.
//!
//! ## Algorithm
//! 1. Fetch per-item order-line counts (every catalog item, zero included)
//! 2. Sort by count descending, then by id ascending so equal counts
//!    always come out in the same order
//! 3. Keep the top `k` ids and fetch their rows
//! 4. Emit rows in ranked order

use crate::error::TierError;
use crate::traits::{RecommendRequest, Recommender, Tier};
use async_trait::async_trait;
use catalog::{CatalogItem, CatalogStore, InteractionStore, ItemCount, ItemId, StoreError};
use std::collections::HashMap;
use std::sync::Arc;
use std::time::Duration;
use tracing::debug;

/// Order counts by popularity and keep the top `k` ids.
///
/// Count descending, id ascending on ties.
pub fn rank_by_popularity(mut counts: Vec<ItemCount>, k: usize) -> Vec<ItemId> {
    counts.sort_by(|a, b| b.count.cmp(&a.count).then_with(|| a.item_id.cmp(&b.item_id)));
    counts.into_iter().take(k).map(|c| c.item_id).collect()
}

/// Ranks catalog items by how often they were ordered.
#[derive(Clone)]
pub struct PopularityRanker {
    catalog: Arc<dyn CatalogStore>,
    interactions: Arc<dyn InteractionStore>,
}

impl PopularityRanker {
    pub fn new(catalog: Arc<dyn CatalogStore>, interactions: Arc<dyn InteractionStore>) -> Self {
        Self {
            catalog,
            interactions,
        }
    }

    /// Top `k` items by order count (blocking)
    pub fn top_k_by_popularity(&self, k: usize) -> Result<Vec<CatalogItem>, StoreError> {
        let counts = self.interactions.popularity_counts()?;
        let total = counts.len();
        let ranked = rank_by_popularity(counts, k);
        if ranked.is_empty() {
            return Ok(Vec::new());
        }

        let mut rows: HashMap<ItemId, CatalogItem> = self
            .catalog
            .lookup_by_ids(&ranked)?
            .into_iter()
            .map(|item| (item.id, item))
            .collect();

        debug!("Ranked {} items by popularity, keeping {}", total, ranked.len());
        Ok(ranked.iter().filter_map(|id| rows.remove(id)).collect())
    }
}

/// Fallback tier serving the popularity ranking.
pub struct PopularityRecommender {
    ranker: PopularityRanker,
    timeout: Duration,
}

impl PopularityRecommender {
    pub fn new(ranker: PopularityRanker) -> Self {
        Self {
            ranker,
            timeout: Duration::from_secs(2),
        }
    }

    /// Bound on the aggregate query (default: 2s)
    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }
}

#[async_trait]
impl Recommender for PopularityRecommender {
    fn tier(&self) -> Tier {
        Tier::Popularity
    }

    async fn recommend(&self, request: &RecommendRequest) -> Result<Vec<CatalogItem>, TierError> {
        let ranker = self.ranker.clone();
        let k = request.k;

        let query = tokio::task::spawn_blocking(move || ranker.top_k_by_popularity(k));
        let items = tokio::time::timeout(self.timeout, query)
            .await
            .map_err(|_| TierError::PopularityTimedOut(self.timeout))?
            .map_err(|e| TierError::TaskFailed(e.to_string()))?
            .map_err(TierError::PopularityQueryFailed)?;

        if items.is_empty() {
            return Err(TierError::PopularityEmpty);
        }
        Ok(items)
    }
}
