//! Blockchain → consensus bridge.

use async_trait::async_trait;
use qn_02_blockchain::ConsensusStarter;
use qn_08_pbft::ConsensusCoordinator;
use shared_types::{short_hash, Block};
use std::sync::Arc;
use tracing::debug;

/// Hands staged proposals to the PBFT coordinator.
pub struct CoordinatorStarter {
    coordinator: Arc<ConsensusCoordinator>,
}

impl CoordinatorStarter {
    pub fn new(coordinator: Arc<ConsensusCoordinator>) -> Self {
        Self { coordinator }
    }
}

#[async_trait]
impl ConsensusStarter for CoordinatorStarter {
    async fn start_consensus(&self, block: Block) -> Result<(), String> {
        let hash = block.hash();
        let round = self
            .coordinator
            .start_consensus(block)
            .await
            .map_err(|e| e.to_string())?;
        debug!(
            "[qn-08] Round {} opened for block {}",
            round,
            short_hash(&hash)
        );
        Ok(())
    }
}
