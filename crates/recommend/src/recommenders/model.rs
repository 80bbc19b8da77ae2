//! Primary tier: personalized ranking from the oracle, mapped onto catalog rows.

use crate::error::TierError;
use crate::reconcile::{reconcile, ReconcileStrategy};
use crate::traits::{RecommendRequest, Recommender, Tier};
use async_trait::async_trait;
use catalog::{CatalogItem, CatalogStore};
use oracle::{OracleError, OracleState};
use std::sync::Arc;
use std::time::Duration;
use tracing::debug;

pub struct ModelBackedRecommender {
    catalog: Arc<dyn CatalogStore>,
    strategy: ReconcileStrategy,
    timeout: Duration,
}

impl ModelBackedRecommender {
    pub fn new(catalog: Arc<dyn CatalogStore>) -> Self {
        Self {
            catalog,
            strategy: ReconcileStrategy::default(),
            timeout: Duration::from_secs(2),
        }
    }

    pub fn with_strategy(mut self, strategy: ReconcileStrategy) -> Self {
        self.strategy = strategy;
        self
    }

    /// Bound on one oracle call (default: 2s)
    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }
}

#[async_trait]
impl Recommender for ModelBackedRecommender {
    fn tier(&self) -> Tier {
        Tier::Model
    }

    async fn recommend(&self, request: &RecommendRequest) -> Result<Vec<CatalogItem>, TierError> {
        let oracle = match &request.oracle {
            OracleState::Loaded(oracle) => oracle.clone(),
            OracleState::Unavailable { reason } => {
                return Err(TierError::OracleUnavailable(reason.clone()));
            }
        };

        let mut keys = tokio::time::timeout(
            self.timeout,
            oracle.recommend_for_user(&request.user_id, request.k),
        )
        .await
        .map_err(|_| TierError::OracleTimedOut(self.timeout))?
        .map_err(|e| match e {
            OracleError::Disabled => TierError::OracleUnavailable(e.to_string()),
            other => TierError::OracleQueryFailed(other.to_string()),
        })?;

        if keys.is_empty() {
            return Err(TierError::OracleEmpty);
        }
        keys.truncate(request.k);
        debug!("Oracle '{}' ranked {} keys for user {}", oracle.name(), keys.len(), request.user_id);

        let catalog = self.catalog.clone();
        let strategy = self.strategy;
        let key_count = keys.len();
        let items = tokio::task::spawn_blocking(move || reconcile(&keys, catalog.as_ref(), strategy))
            .await
            .map_err(|e| TierError::TaskFailed(e.to_string()))?
            .map_err(TierError::CatalogLookupFailed)?;

        if items.is_empty() {
            return Err(TierError::ReconciliationEmpty { keys: key_count });
        }
        Ok(items)
    }
}
