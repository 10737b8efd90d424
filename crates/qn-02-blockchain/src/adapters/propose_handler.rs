//! `block.propose` RPC handler.
//!
//! In `Solo` mode a proposal is committed on the spot. In `Pbft` mode it is
//! staged and handed to the consensus engine; the engine later commits or
//! abandons it through the block API.

use crate::domain::{BlockchainError, BlockchainResult, EngineMode};
use crate::ports::ConsensusStarter;
use crate::service::BlockApi;
use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use shared_bus::{BusError, RpcHandler};
use shared_types::{hash_hex, short_hash, ProposeBlockCommand};
use std::sync::Arc;
use tracing::{info, warn};

/// Reply to a `block.propose` call.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ProposeBlockResponse {
    /// Hex-encoded hash of the new block.
    pub block_id: String,
    pub height: u64,
    /// True when the block is already on the chain (`Solo` mode).
    pub committed: bool,
}

pub struct BlockProposeCommandHandler {
    api: Arc<BlockApi>,
    mode: EngineMode,
    consensus: Option<Arc<dyn ConsensusStarter>>,
}

impl BlockProposeCommandHandler {
    pub fn new(api: Arc<BlockApi>, mode: EngineMode) -> Self {
        Self {
            api,
            mode,
            consensus: None,
        }
    }

    /// Attach the engine that `Pbft` proposals are handed to.
    pub fn with_consensus(mut self, consensus: Arc<dyn ConsensusStarter>) -> Self {
        self.consensus = Some(consensus);
        self
    }

    pub fn mode(&self) -> EngineMode {
        self.mode
    }

    pub async fn handle_propose_block(
        &self,
        command: ProposeBlockCommand,
    ) -> BlockchainResult<ProposeBlockResponse> {
        if command.transactions.is_empty() {
            return Err(BlockchainError::EmptyTransactionList);
        }

        match self.mode {
            EngineMode::Solo => {
                let block = self.api.create_proposed_block(command.transactions)?;
                self.api.commit_proposed_block(&block.hash()).await?;
                Ok(ProposeBlockResponse {
                    block_id: hash_hex(&block.hash()),
                    height: block.height(),
                    committed: true,
                })
            }
            EngineMode::Pbft => {
                let consensus = self
                    .consensus
                    .as_ref()
                    .ok_or(BlockchainError::NoConsensusEngine)?;
                let block = self.api.create_proposed_block(command.transactions)?;
                let hash = block.hash();
                let height = block.height();

                if let Err(e) = consensus.start_consensus(block).await {
                    warn!(
                        "[qn-02] Consensus for block {} did not start: {}",
                        short_hash(&hash),
                        e
                    );
                    self.api.abandon_proposed_block(&hash).await?;
                    return Err(BlockchainError::Consensus(e));
                }

                info!(
                    "[qn-02] Block {} at height {} handed to consensus",
                    short_hash(&hash),
                    height
                );
                Ok(ProposeBlockResponse {
                    block_id: hash_hex(&hash),
                    height,
                    committed: false,
                })
            }
        }
    }
}

#[async_trait]
impl RpcHandler for BlockProposeCommandHandler {
    async fn handle(&self, request: Value) -> Result<Value, BusError> {
        let command: ProposeBlockCommand = serde_json::from_value(request)?;
        let response = self
            .handle_propose_block(command)
            .await
            .map_err(|e| BusError::Handler(e.to_string()))?;
        Ok(serde_json::to_value(response)?)
    }
}
