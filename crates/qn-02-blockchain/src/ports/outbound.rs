//! Driven ports (Outbound dependencies)

use crate::domain::{BlockchainResult, KVStoreError};
use async_trait::async_trait;
use shared_types::{Block, Hash};

/// Result of a prefix scan: matching key/value pairs.
pub type ScanResult = Vec<(Vec<u8>, Vec<u8>)>;

/// Abstract interface for key-value storage.
///
/// Writes take `&mut self`; callers sharing a store wrap it in a lock.
pub trait KeyValueStore: Send + Sync {
    fn get(&self, key: &[u8]) -> Result<Option<Vec<u8>>, KVStoreError>;

    fn put(&mut self, key: &[u8], value: &[u8]) -> Result<(), KVStoreError>;

    fn delete(&mut self, key: &[u8]) -> Result<(), KVStoreError>;

    /// Apply all operations or none of them.
    fn atomic_batch_write(&mut self, operations: Vec<BatchOperation>) -> Result<(), KVStoreError>;

    fn exists(&self, key: &[u8]) -> Result<bool, KVStoreError> {
        Ok(self.get(key)?.is_some())
    }

    fn prefix_scan(&self, prefix: &[u8]) -> Result<ScanResult, KVStoreError>;
}

/// Single operation of an atomic batch.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum BatchOperation {
    Put { key: Vec<u8>, value: Vec<u8> },
    Delete { key: Vec<u8> },
}

impl BatchOperation {
    pub fn put(key: impl Into<Vec<u8>>, value: impl Into<Vec<u8>>) -> Self {
        Self::Put {
            key: key.into(),
            value: value.into(),
        }
    }

    pub fn delete(key: impl Into<Vec<u8>>) -> Self {
        Self::Delete { key: key.into() }
    }
}

/// Encodes blocks for the key/value store.
pub trait BlockSerializer: Send + Sync {
    fn serialize(&self, block: &Block) -> BlockchainResult<Vec<u8>>;

    fn deserialize(&self, data: &[u8]) -> BlockchainResult<Block>;
}

/// Append-only chain of committed blocks.
pub trait BlockRepository: Send + Sync {
    /// Append `block` to the chain.
    ///
    /// The first block must be a genesis block; every later block must sit at
    /// `last.height + 1` and link to `last` by `prev_hash`.
    fn save(&self, block: &Block) -> BlockchainResult<()>;

    fn find_by_height(&self, height: u64) -> BlockchainResult<Option<Block>>;

    fn find_by_hash(&self, hash: &Hash) -> BlockchainResult<Option<Block>>;

    /// The chain tip, `None` while the chain is empty.
    fn find_last(&self) -> BlockchainResult<Option<Block>>;
}

/// Staging area for proposed blocks awaiting consensus.
pub trait BlockPool: Send + Sync {
    /// Stage a block. Returns false when it was already staged.
    fn add(&self, block: Block) -> bool;

    fn remove(&self, hash: &Hash) -> Option<Block>;

    fn get(&self, hash: &Hash) -> Option<Block>;

    /// Highest staged block, if any.
    fn highest(&self) -> Option<Block>;

    fn len(&self) -> usize;

    fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

/// Hands a staged block to the consensus engine.
#[async_trait]
pub trait ConsensusStarter: Send + Sync {
    async fn start_consensus(&self, block: Block) -> Result<(), String>;
}

/// Time source for block timestamps
pub trait TimeSource: Send + Sync {
    /// Current unix timestamp in milliseconds
    fn now(&self) -> u64;
}

/// Default time source using system time
pub struct SystemTimeSource;

impl TimeSource for SystemTimeSource {
    fn now(&self) -> u64 {
        std::time::SystemTime::now()
            .duration_since(std::time::UNIX_EPOCH)
            .unwrap_or_default()
            .as_millis() as u64
    }
}
