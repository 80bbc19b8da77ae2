//! The fallback chain: Model → Popularity → Random.
//!
//! The chain is a small state machine. It starts at its first configured
//! tier; a tier that errors (or, unless it is the last tier, answers with
//! nothing) moves the chain to the next one. The last tier's answer always
//! ends the chain, even when it is empty. Each tier runs at most once per
//! request and no failure ever reaches the caller.

use crate::error::{TierError, TierFailure};
use crate::traits::{RecommendRequest, Recommender, Tier};
use catalog::CatalogItem;
use tracing::{debug, info, instrument, warn};

/// The chain's answer to one request.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Recommendations {
    /// At most `k` items, best first when the source tier ranks
    pub items: Vec<CatalogItem>,
    /// Tier that produced `items`; `None` when every tier failed
    pub source: Option<Tier>,
    /// Tiers tried before `source`, with the reason each was skipped
    pub failures: Vec<TierFailure>,
}

impl Recommendations {
    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }

    pub fn len(&self) -> usize {
        self.items.len()
    }
}

#[derive(Debug)]
enum ChainState {
    Attempt(Tier),
    Done(Recommendations),
}

/// Tries each tier in `Tier` order until one answers.
///
/// ## Usage
/// ```ignore
/// let chain = FallbackChain::new()
///     .add_tier(ModelBackedRecommender::new(catalog.clone()))
///     .add_tier(PopularityRecommender::new(ranker))
///     .add_tier(RandomRecommender::new(sampler));
///
/// let result = chain.recommend(&request).await;
/// ```
pub struct FallbackChain {
    tiers: Vec<Box<dyn Recommender>>,
}

impl FallbackChain {
    pub fn new() -> Self {
        Self { tiers: Vec::new() }
    }

    /// Add a tier (builder pattern).
    ///
    /// Tiers are kept in `Tier` order regardless of insertion order; adding a
    /// second recommender for the same tier replaces the first.
    pub fn add_tier(mut self, recommender: impl Recommender + 'static) -> Self {
        let tier = recommender.tier();
        self.tiers.retain(|r| r.tier() != tier);
        self.tiers.push(Box::new(recommender));
        self.tiers.sort_by_key(|r| r.tier());
        self
    }

    /// Configured tiers, in the order they are tried
    pub fn tiers(&self) -> Vec<Tier> {
        self.tiers.iter().map(|r| r.tier()).collect()
    }

    /// Run the chain for one request. Never fails.
    #[instrument(skip(self, request), fields(user_id = %request.user_id, k = request.k))]
    pub async fn recommend(&self, request: &RecommendRequest) -> Recommendations {
        let mut failures = Vec::new();
        let mut state = self.start();

        loop {
            state = match state {
                ChainState::Attempt(tier) => self.attempt(tier, request, &mut failures).await,
                ChainState::Done(mut result) => {
                    result.failures = failures;
                    return result;
                }
            };
        }
    }

    fn start(&self) -> ChainState {
        match self.tiers.first() {
            Some(first) => ChainState::Attempt(first.tier()),
            None => {
                warn!("Fallback chain has no tiers configured");
                ChainState::Done(Recommendations::default())
            }
        }
    }

    /// State after `tier` could not answer
    fn advance(&self, tier: Tier) -> ChainState {
        match self.tiers.iter().map(|r| r.tier()).find(|t| *t > tier) {
            Some(next) => ChainState::Attempt(next),
            None => ChainState::Done(Recommendations::default()),
        }
    }

    fn is_last(&self, tier: Tier) -> bool {
        self.tiers.last().map(|r| r.tier()) == Some(tier)
    }

    async fn attempt(
        &self,
        tier: Tier,
        request: &RecommendRequest,
        failures: &mut Vec<TierFailure>,
    ) -> ChainState {
        let Some(recommender) = self.tiers.iter().find(|r| r.tier() == tier) else {
            return self.advance(tier);
        };

        debug!("Trying {} tier", tier);
        let error = match recommender.recommend(request).await {
            Ok(mut items) if !items.is_empty() || self.is_last(tier) => {
                items.truncate(request.k);
                info!("{} tier answered with {} items", tier, items.len());
                return ChainState::Done(Recommendations {
                    items,
                    source: Some(tier),
                    failures: Vec::new(),
                });
            }
            Ok(_) => TierError::NoResults(tier),
            Err(e) => e,
        };

        warn!("{} tier failed, falling back: {}", tier, error);
        failures.push(TierFailure { tier, error });
        self.advance(tier)
    }
}

impl Default for FallbackChain {
    fn default() -> Self {
        Self::new()
    }
}
