//! Client for a remote ranking model served over gRPC.

use crate::error::{OracleError, Result};
use crate::proto::{ranking_service_client::RankingServiceClient, RecommendRequest};
use crate::RankingOracle;
use async_trait::async_trait;
use std::time::Duration;
use tonic::transport::Channel;
use tracing::{debug, error, info};

/// Upper bound on establishing the channel
pub const CONNECT_TIMEOUT: Duration = Duration::from_secs(2);

/// Wraps the generated gRPC client behind the `RankingOracle` interface.
pub struct GrpcRankingOracle {
    client: RankingServiceClient<Channel>,
    service_addr: String,
}

impl GrpcRankingOracle {
    /// Connect to the ranking service.
    ///
    /// # Arguments
    /// * `addr` - Address of the gRPC service (e.g., "http://localhost:50051")
    pub async fn connect(addr: impl Into<String>) -> Result<Self> {
        let addr = addr.into();
        info!("Connecting to ranking service at {}", addr);

        let channel = Channel::from_shared(addr.clone())
            .map_err(|e| OracleError::ConnectionError(format!("invalid address {}: {}", addr, e)))?
            .connect_timeout(CONNECT_TIMEOUT)
            .connect()
            .await
            .map_err(|e| OracleError::ConnectionError(e.to_string()))?;

        Ok(Self {
            client: RankingServiceClient::new(channel),
            service_addr: addr,
        })
    }

    /// Get the address of the ranking service this client is connected to.
    pub fn service_address(&self) -> &str {
        &self.service_addr
    }
}

#[async_trait]
impl RankingOracle for GrpcRankingOracle {
    fn name(&self) -> &str {
        "grpc"
    }

    async fn recommend_for_user(&self, user_id: &str, k: usize) -> Result<Vec<String>> {
        debug!("Requesting {} items for user {} from {}", k, user_id, self.service_addr);

        // Channel clones share one connection
        let mut client = self.client.clone();
        let request = tonic::Request::new(RecommendRequest {
            user_id: user_id.to_string(),
            k: u32::try_from(k).unwrap_or(u32::MAX),
        });

        let response = client.recommend_for_user(request).await.map_err(|status| {
            error!("gRPC error while ranking for user {}: {}", user_id, status);
            OracleError::QueryFailed(status.to_string())
        })?;

        let mut item_ids = response.into_inner().item_ids;
        item_ids.truncate(k);
        Ok(item_ids)
    }
}
