//! Consensus → blockchain bridge.
//!
//! The PBFT coordinator reports each decided round through `BlockFinalizer`;
//! this adapter turns the decision into a chain commit or an abandonment.

use async_trait::async_trait;
use qn_02_blockchain::BlockApi;
use qn_08_pbft::BlockFinalizer;
use shared_types::{short_hash, Block};
use std::sync::Arc;
use tracing::{debug, error, warn};

pub struct ChainFinalizer {
    api: Arc<BlockApi>,
}

impl ChainFinalizer {
    pub fn new(api: Arc<BlockApi>) -> Self {
        Self { api }
    }
}

#[async_trait]
impl BlockFinalizer for ChainFinalizer {
    /// Commit a block the committee agreed on. A block the chain refuses is
    /// abandoned so its transactions return to the pool.
    async fn finalize(&self, block: Block) -> Result<(), String> {
        let hash = block.hash();
        match self.api.commit_block(block.clone()).await {
            Ok(true) => Ok(()),
            Ok(false) => {
                debug!(
                    "[qn-02] Block {} already on the chain",
                    short_hash(&hash)
                );
                Ok(())
            }
            Err(e) => {
                error!(
                    "[qn-02] Agreed block {} at height {} rejected: {}",
                    short_hash(&hash),
                    block.height(),
                    e
                );
                if let Err(abandon_err) = self.api.abandon_block(&block).await {
                    warn!(
                        "[qn-02] Could not release block {}: {}",
                        short_hash(&hash),
                        abandon_err
                    );
                }
                Err(e.to_string())
            }
        }
    }

    async fn abandon(&self, block: Block) -> Result<(), String> {
        self.api
            .abandon_block(&block)
            .await
            .map(|_| ())
            .map_err(|e| e.to_string())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use qn_02_blockchain::{
        BlockApiDependencies, GenesisConfig, InMemoryBlockPool, InMemoryKVStore,
        KvBlockRepository, TimeSource,
    };
    use shared_bus::testing::RecordingPublisher;
    use shared_bus::{topics, BusPayload};
    use shared_types::{PeerId, Transaction};

    struct FixedTime;

    impl TimeSource for FixedTime {
        fn now(&self) -> u64 {
            1_000
        }
    }

    fn api(publisher: Arc<RecordingPublisher>) -> Arc<BlockApi> {
        let api = BlockApi::new(BlockApiDependencies {
            local_id: PeerId::from("n1"),
            repository: Arc::new(KvBlockRepository::new(Box::new(InMemoryKVStore::new()))),
            pool: Arc::new(InMemoryBlockPool::new()),
            publisher,
            time_source: Arc::new(FixedTime),
        });
        api.commit_genesis_block(&GenesisConfig {
            timestamp: 0,
            creator: PeerId::from("genesis"),
        })
        .unwrap();
        Arc::new(api)
    }

    fn tx(id: &str) -> Transaction {
        Transaction::new(id, vec![1], 1)
    }

    #[tokio::test]
    async fn test_finalize_commits_staged_block() {
        let publisher = Arc::new(RecordingPublisher::new());
        let api = api(publisher.clone());
        let block = api.create_proposed_block(vec![tx("t1")]).unwrap();

        ChainFinalizer::new(api.clone()).finalize(block).await.unwrap();

        assert_eq!(api.last_block().unwrap().unwrap().height(), 1);
        assert_eq!(api.staged_count(), 0);
        assert_eq!(publisher.on_topic(topics::BLOCK_COMMITTED).len(), 1);
    }

    #[tokio::test]
    async fn test_finalize_twice_is_idempotent() {
        let api = api(Arc::new(RecordingPublisher::new()));
        let block = api.create_proposed_block(vec![tx("t1")]).unwrap();
        let finalizer = ChainFinalizer::new(api.clone());

        finalizer.finalize(block.clone()).await.unwrap();
        finalizer.finalize(block).await.unwrap();
        assert_eq!(api.last_block().unwrap().unwrap().height(), 1);
    }

    #[tokio::test]
    async fn test_rejected_block_is_abandoned() {
        let publisher = Arc::new(RecordingPublisher::new());
        let api = api(publisher.clone());
        let orphan = Block::new(7, [9u8; 32], PeerId::from("n2"), 5, vec![tx("t1")]);

        let result = ChainFinalizer::new(api.clone()).finalize(orphan).await;

        assert!(result.is_err());
        let abandoned = publisher.on_topic(topics::BLOCK_ABANDONED);
        assert_eq!(abandoned.len(), 1);
        match &abandoned[0].payload {
            BusPayload::BlockAbandoned(event) => assert_eq!(event.height, 7),
            other => panic!("unexpected payload {:?}", other),
        }
    }

    #[tokio::test]
    async fn test_abandon_releases_staged_block() {
        let api = api(Arc::new(RecordingPublisher::new()));
        let block = api.create_proposed_block(vec![tx("t1")]).unwrap();

        ChainFinalizer::new(api.clone()).abandon(block).await.unwrap();
        assert_eq!(api.staged_count(), 0);
    }
}
