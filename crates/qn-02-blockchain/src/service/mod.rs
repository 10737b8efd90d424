//! # Block API
//!
//! Builds candidate blocks on top of the chain tip, stages them in the block
//! pool and moves them into the repository once they are agreed on.
//!
//! ```text
//! create_proposed_block(txs) ──→ [pool] ──commit──→ [repository] ──→ block.committed
//!                                   │
//!                                   └──abandon──→ block.abandoned
//! ```

use crate::domain::{BlockchainError, BlockchainResult, GenesisConfig};
use crate::ports::{BlockPool, BlockRepository, TimeSource};
use shared_bus::{exchanges, topics, BusPayload, MessagePublisher};
use shared_types::{
    hash_hex, short_hash, Block, BlockAbandonedEvent, BlockCommittedEvent, Hash, PeerId,
    Transaction,
};
use std::sync::Arc;
use tracing::{debug, info, warn};

/// Dependencies for BlockApi
pub struct BlockApiDependencies {
    pub local_id: PeerId,
    pub repository: Arc<dyn BlockRepository>,
    pub pool: Arc<dyn BlockPool>,
    pub publisher: Arc<dyn MessagePublisher>,
    pub time_source: Arc<dyn TimeSource>,
}

pub struct BlockApi {
    local_id: PeerId,
    repository: Arc<dyn BlockRepository>,
    pool: Arc<dyn BlockPool>,
    publisher: Arc<dyn MessagePublisher>,
    time_source: Arc<dyn TimeSource>,
}

impl BlockApi {
    pub fn new(deps: BlockApiDependencies) -> Self {
        Self {
            local_id: deps.local_id,
            repository: deps.repository,
            pool: deps.pool,
            publisher: deps.publisher,
            time_source: deps.time_source,
        }
    }

    /// Commit the genesis block unless the chain already has one.
    ///
    /// Returns the committed block, or `None` when the chain was not empty.
    pub fn commit_genesis_block(&self, config: &GenesisConfig) -> BlockchainResult<Option<Block>> {
        let genesis = config.block();

        if self.repository.find_last()?.is_some() {
            match self.repository.find_by_height(0)? {
                Some(stored) if stored.hash() != genesis.hash() => warn!(
                    "[qn-02] Stored genesis {} differs from configured genesis {}",
                    short_hash(&stored.hash()),
                    short_hash(&genesis.hash())
                ),
                _ => debug!("[qn-02] Genesis already committed"),
            }
            return Ok(None);
        }

        self.repository.save(&genesis)?;
        info!(
            "[qn-02] 🌱 Genesis block {} committed",
            short_hash(&genesis.hash())
        );
        Ok(Some(genesis))
    }

    /// Build the next block from `transactions` and stage it.
    ///
    /// The block extends the highest staged block when that is above the
    /// chain tip, so back-to-back proposals form a chain.
    pub fn create_proposed_block(&self, transactions: Vec<Transaction>) -> BlockchainResult<Block> {
        if transactions.is_empty() {
            return Err(BlockchainError::EmptyTransactionList);
        }

        let tip = self
            .repository
            .find_last()?
            .ok_or(BlockchainError::EmptyChain)?;
        let parent = match self.pool.highest() {
            Some(staged) if staged.height() > tip.height() => staged,
            _ => tip,
        };

        let block = Block::new(
            parent.height() + 1,
            parent.hash(),
            self.local_id.clone(),
            self.time_source.now(),
            transactions,
        );
        self.pool.add(block.clone());

        debug!(
            "[qn-02] Staged block {} at height {} with {} transactions",
            short_hash(&block.hash()),
            block.height(),
            block.transactions.len()
        );
        Ok(block)
    }

    /// Commit a staged block.
    pub async fn commit_proposed_block(&self, hash: &Hash) -> BlockchainResult<Block> {
        let block = self
            .pool
            .get(hash)
            .ok_or_else(|| BlockchainError::BlockNotStaged(hash_hex(hash)))?;
        self.commit_block(block.clone()).await?;
        Ok(block)
    }

    /// Append `block` to the chain, unstage it and announce the commit.
    ///
    /// The block does not have to be staged locally; followers commit blocks
    /// proposed by the leader. Returns false when the block was already
    /// committed.
    pub async fn commit_block(&self, block: Block) -> BlockchainResult<bool> {
        let hash = block.hash();

        if self.repository.find_by_hash(&hash)?.is_some() {
            self.pool.remove(&hash);
            debug!("[qn-02] Block {} already committed", short_hash(&hash));
            return Ok(false);
        }

        self.repository.save(&block)?;
        self.pool.remove(&hash);

        let event = BlockCommittedEvent {
            id: hash_hex(&hash),
            height: block.height(),
            tx_ids: block.tx_ids(),
        };
        info!(
            "[qn-02] ⛓ Block {} committed at height {} ({} txs)",
            short_hash(&hash),
            event.height,
            event.tx_ids.len()
        );
        self.publisher
            .publish(
                exchanges::EVENT,
                topics::BLOCK_COMMITTED,
                BusPayload::BlockCommitted(event),
            )
            .await
            .map_err(|e| BlockchainError::Publish(e.to_string()))?;
        Ok(true)
    }

    /// Drop a staged block and announce it.
    pub async fn abandon_proposed_block(&self, hash: &Hash) -> BlockchainResult<Block> {
        let block = self
            .pool
            .get(hash)
            .ok_or_else(|| BlockchainError::BlockNotStaged(hash_hex(hash)))?;
        self.abandon_block(&block).await?;
        Ok(block)
    }

    /// Release `block` so its transactions return to the queue.
    ///
    /// Announced even when the block was never staged here. A block that was
    /// committed in the meantime is left alone; returns false in that case.
    pub async fn abandon_block(&self, block: &Block) -> BlockchainResult<bool> {
        let hash = block.hash();

        if self.repository.find_by_hash(&hash)?.is_some() {
            self.pool.remove(&hash);
            return Ok(false);
        }
        self.pool.remove(&hash);

        let event = BlockAbandonedEvent {
            id: hash_hex(&hash),
            height: block.height(),
            tx_ids: block.tx_ids(),
        };
        warn!(
            "[qn-02] Block {} at height {} abandoned",
            short_hash(&hash),
            event.height
        );
        self.publisher
            .publish(
                exchanges::EVENT,
                topics::BLOCK_ABANDONED,
                BusPayload::BlockAbandoned(event),
            )
            .await
            .map_err(|e| BlockchainError::Publish(e.to_string()))?;
        Ok(true)
    }

    pub fn last_block(&self) -> BlockchainResult<Option<Block>> {
        self.repository.find_last()
    }

    pub fn block_by_height(&self, height: u64) -> BlockchainResult<Option<Block>> {
        self.repository.find_by_height(height)
    }

    pub fn staged_count(&self) -> usize {
        self.pool.len()
    }
}
