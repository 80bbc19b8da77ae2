//! Ranking oracle backed by an exported ranking file.
//!
//! The export is a JSON object mapping user ids to item ids, most
//! preferred first:
//!
//! ```json
//! { "17": ["408", "112", "97"], "18": ["5"] }
//! ```
//!
//! Deserializing a large export is the expensive part, which is why this
//! oracle is meant to be built once through an `OracleHandle`.

use crate::error::{OracleError, Result};
use crate::RankingOracle;
use async_trait::async_trait;
use std::collections::HashMap;
use std::fs;
use std::path::Path;
use tracing::{debug, info};

pub struct PrecomputedOracle {
    rankings: HashMap<String, Vec<String>>,
}

impl PrecomputedOracle {
    pub fn new(rankings: HashMap<String, Vec<String>>) -> Self {
        Self { rankings }
    }

    /// Read and decode a ranking export (blocking)
    pub fn load(path: &Path) -> Result<Self> {
        let invalid = |reason: String| OracleError::InvalidExport {
            path: path.display().to_string(),
            reason,
        };

        let bytes = fs::read(path).map_err(|e| invalid(e.to_string()))?;
        let rankings: HashMap<String, Vec<String>> =
            serde_json::from_slice(&bytes).map_err(|e| invalid(e.to_string()))?;

        info!("Loaded ranking export for {} users from {}", rankings.len(), path.display());
        Ok(Self::new(rankings))
    }

    pub fn user_count(&self) -> usize {
        self.rankings.len()
    }
}

#[async_trait]
impl RankingOracle for PrecomputedOracle {
    fn name(&self) -> &str {
        "precomputed"
    }

    async fn recommend_for_user(&self, user_id: &str, k: usize) -> Result<Vec<String>> {
        let ranked = self
            .rankings
            .get(user_id)
            .ok_or_else(|| OracleError::UnknownUser(user_id.to_string()))?;

        debug!("Ranking export has {} items for user {}", ranked.len(), user_id);
        Ok(ranked.iter().take(k).cloned().collect())
    }
}
