//! The uniform interface shared by every recommendation tier.

use crate::error::TierError;
use async_trait::async_trait;
use catalog::CatalogItem;
use oracle::OracleState;
use std::fmt;
use std::str::FromStr;

/// The fallback tiers, in the order the chain tries them.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum Tier {
    Model,
    Popularity,
    Random,
}

impl Tier {
    pub const ALL: [Tier; 3] = [Tier::Model, Tier::Popularity, Tier::Random];

    pub fn as_str(self) -> &'static str {
        match self {
            Tier::Model => "model",
            Tier::Popularity => "popularity",
            Tier::Random => "random",
        }
    }
}

impl fmt::Display for Tier {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Tier {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "model" => Ok(Tier::Model),
            "popularity" | "popular" => Ok(Tier::Popularity),
            "random" => Ok(Tier::Random),
            other => Err(format!("unknown tier '{}'", other)),
        }
    }
}

/// Everything a tier needs to answer one request.
#[derive(Debug, Clone)]
pub struct RecommendRequest {
    pub user_id: String,
    pub k: usize,
    /// Whether the ranking oracle can be used for this request
    pub oracle: OracleState,
}

impl RecommendRequest {
    pub fn new(user_id: impl Into<String>, k: usize, oracle: OracleState) -> Self {
        Self {
            user_id: user_id.into(),
            k,
            oracle,
        }
    }
}

/// One strategy in the fallback chain.
///
/// `Send + Sync` so the chain can be shared across request tasks.
#[async_trait]
pub trait Recommender: Send + Sync {
    /// Which tier this recommender fills
    fn tier(&self) -> Tier;

    /// Up to `request.k` items, best first when the tier has an order.
    ///
    /// An error means the tier could not answer and the chain should move on.
    async fn recommend(&self, request: &RecommendRequest) -> Result<Vec<CatalogItem>, TierError>;
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_tier_order_and_parse() {
        assert!(Tier::Model < Tier::Popularity && Tier::Popularity < Tier::Random);
        assert_eq!("Popularity".parse::<Tier>(), Ok(Tier::Popularity));
        assert_eq!(" random ".parse::<Tier>(), Ok(Tier::Random));
        assert!("bandit".parse::<Tier>().is_err());
        assert_eq!(Tier::Model.to_string(), "model");
    }
}
