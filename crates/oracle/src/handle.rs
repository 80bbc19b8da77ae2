//! Shared, load-once access to the ranking oracle.
//!
//! Loading a model is expensive, so every request shares one instance.
//! `OracleHandle` owns a `tokio::sync::OnceCell`: when several requests race
//! on first use, exactly one runs the loader and the rest await its result.
//! A failed load is remembered as `OracleState::Unavailable` and is not retried.

use crate::error::{OracleError, Result};
use crate::grpc::GrpcRankingOracle;
use crate::precomputed::PrecomputedOracle;
use crate::RankingOracle;
use async_trait::async_trait;
use std::fmt;
use std::path::PathBuf;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;
use tokio::sync::OnceCell;
use tracing::{info, warn};

/// Whether a ranking oracle can serve requests.
///
/// Passed explicitly into the recommendation chain instead of being inferred
/// from an optional field.
#[derive(Clone)]
pub enum OracleState {
    Loaded(Arc<dyn RankingOracle>),
    Unavailable { reason: String },
}

impl OracleState {
    pub fn unavailable(reason: impl Into<String>) -> Self {
        Self::Unavailable {
            reason: reason.into(),
        }
    }

    pub fn is_loaded(&self) -> bool {
        matches!(self, Self::Loaded(_))
    }
}

impl fmt::Debug for OracleState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Loaded(oracle) => f.debug_tuple("Loaded").field(&oracle.name()).finish(),
            Self::Unavailable { reason } => f
                .debug_struct("Unavailable")
                .field("reason", reason)
                .finish(),
        }
    }
}

/// Produces a ranking oracle; run at most once per handle.
#[async_trait]
pub trait OracleLoader: Send + Sync {
    async fn load(&self) -> Result<Arc<dyn RankingOracle>>;
}

/// Which oracle a deployment uses, chosen by configuration.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum OracleSource {
    /// No model; requests go straight to the fallbacks
    Disabled,
    /// Ranking export on disk
    Precomputed(PathBuf),
    /// Remote ranking service address
    Grpc(String),
}

#[async_trait]
impl OracleLoader for OracleSource {
    async fn load(&self) -> Result<Arc<dyn RankingOracle>> {
        match self {
            OracleSource::Disabled => Err(OracleError::Disabled),
            OracleSource::Precomputed(path) => {
                let path = path.clone();
                let oracle = tokio::task::spawn_blocking(move || PrecomputedOracle::load(&path))
                    .await
                    .map_err(|e| OracleError::InvalidExport {
                        path: "<export>".to_string(),
                        reason: format!("loader task failed: {}", e),
                    })??;
                Ok(Arc::new(oracle))
            }
            OracleSource::Grpc(addr) => Ok(Arc::new(GrpcRankingOracle::connect(addr.clone()).await?)),
        }
    }
}

/// Service object owning the single ranking oracle instance.
pub struct OracleHandle {
    loader: Box<dyn OracleLoader>,
    state: OnceCell<OracleState>,
    load_attempts: AtomicUsize,
}

impl OracleHandle {
    pub fn new(loader: impl OracleLoader + 'static) -> Self {
        Self {
            loader: Box::new(loader),
            state: OnceCell::new(),
            load_attempts: AtomicUsize::new(0),
        }
    }

    /// Handle around an oracle that is already built
    pub fn from_oracle(oracle: Arc<dyn RankingOracle>) -> Self {
        Self {
            loader: Box::new(OracleSource::Disabled),
            state: OnceCell::from(OracleState::Loaded(oracle)),
            load_attempts: AtomicUsize::new(0),
        }
    }

    /// Handle that never has an oracle
    pub fn disabled() -> Self {
        Self::new(OracleSource::Disabled)
    }

    /// Current state, loading the oracle on first call
    pub async fn state(&self) -> OracleState {
        self.state.get_or_init(|| self.run_loader()).await.clone()
    }

    /// Load eagerly, typically at startup
    pub async fn preload(&self) -> &OracleState {
        self.state.get_or_init(|| self.run_loader()).await
    }

    /// How many times the loader has run (0 or 1)
    pub fn load_attempts(&self) -> usize {
        self.load_attempts.load(Ordering::SeqCst)
    }

    async fn run_loader(&self) -> OracleState {
        self.load_attempts.fetch_add(1, Ordering::SeqCst);
        match self.loader.load().await {
            Ok(oracle) => {
                info!("Ranking oracle '{}' loaded", oracle.name());
                OracleState::Loaded(oracle)
            }
            Err(OracleError::Disabled) => {
                info!("Ranking oracle disabled, serving fallbacks only");
                OracleState::unavailable(OracleError::Disabled.to_string())
            }
            Err(e) => {
                warn!("Failed to load ranking oracle: {}", e);
                OracleState::unavailable(e.to_string())
            }
        }
    }
}
