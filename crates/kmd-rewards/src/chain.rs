//! Blockchain data source

use async_trait::async_trait;

use crate::Error;

/// Source of chain data needed to compute rewards
#[async_trait]
pub trait ChainSource: Send + Sync {
    /// Timestamp of the current chain tip (unix seconds)
    async fn tip_time(&self) -> Result<u64, Error>;
}
