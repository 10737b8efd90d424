//! Block repository over a key/value store.
//!
//! ## Key layout
//!
//! | Key | Value |
//! |-----|-------|
//! | `blk:` + hash | serialized block |
//! | `hgt:` + height (big-endian) | block hash |
//! | `meta:last` | tip height (big-endian) |
//!
//! A block and its indexes are written in one atomic batch.

use super::serializer::BincodeBlockSerializer;
use crate::domain::{BlockchainError, BlockchainResult, KVStoreError};
use crate::ports::{BatchOperation, BlockRepository, BlockSerializer, KeyValueStore};
use parking_lot::RwLock;
use shared_types::{hash_hex, short_hash, Block, Hash};
use tracing::debug;

const BLOCK_PREFIX: &[u8] = b"blk:";
const HEIGHT_PREFIX: &[u8] = b"hgt:";
const LAST_HEIGHT_KEY: &[u8] = b"meta:last";

fn block_key(hash: &Hash) -> Vec<u8> {
    [BLOCK_PREFIX, hash.as_slice()].concat()
}

fn height_key(height: u64) -> Vec<u8> {
    [HEIGHT_PREFIX, &height.to_be_bytes()[..]].concat()
}

fn decode_height(bytes: &[u8]) -> Result<u64, KVStoreError> {
    let raw: [u8; 8] = bytes
        .try_into()
        .map_err(|_| KVStoreError::Corruption("height index is not 8 bytes".to_string()))?;
    Ok(u64::from_be_bytes(raw))
}

fn decode_hash(bytes: &[u8]) -> Result<Hash, KVStoreError> {
    bytes
        .try_into()
        .map_err(|_| KVStoreError::Corruption("hash index is not 32 bytes".to_string()))
}

pub struct KvBlockRepository {
    store: RwLock<Box<dyn KeyValueStore>>,
    serializer: Box<dyn BlockSerializer>,
}

impl KvBlockRepository {
    pub fn new(store: Box<dyn KeyValueStore>) -> Self {
        Self::with_serializer(store, Box::new(BincodeBlockSerializer))
    }

    pub fn with_serializer(
        store: Box<dyn KeyValueStore>,
        serializer: Box<dyn BlockSerializer>,
    ) -> Self {
        Self {
            store: RwLock::new(store),
            serializer,
        }
    }

    fn last_height(store: &dyn KeyValueStore) -> BlockchainResult<Option<u64>> {
        match store.get(LAST_HEIGHT_KEY)? {
            Some(bytes) => Ok(Some(decode_height(&bytes)?)),
            None => Ok(None),
        }
    }

    fn hash_at(store: &dyn KeyValueStore, height: u64) -> BlockchainResult<Option<Hash>> {
        match store.get(&height_key(height))? {
            Some(bytes) => Ok(Some(decode_hash(&bytes)?)),
            None => Ok(None),
        }
    }

    fn load(&self, store: &dyn KeyValueStore, hash: &Hash) -> BlockchainResult<Option<Block>> {
        store
            .get(&block_key(hash))?
            .map(|bytes| self.serializer.deserialize(&bytes))
            .transpose()
    }
}

impl BlockRepository for KvBlockRepository {
    fn save(&self, block: &Block) -> BlockchainResult<()> {
        let hash = block.hash();
        let height = block.height();
        let mut store = self.store.write();

        if store.exists(&block_key(&hash))? {
            return Err(BlockchainError::BlockExists {
                hash: hash_hex(&hash),
            });
        }

        match Self::last_height(&**store)? {
            None if !block.is_genesis() => return Err(BlockchainError::InvalidGenesis),
            None => {}
            Some(last) => {
                if height != last + 1 {
                    return Err(BlockchainError::HeightMismatch {
                        expected: last + 1,
                        got: height,
                    });
                }
                if Self::hash_at(&**store, last)? != Some(block.header.prev_hash) {
                    return Err(BlockchainError::ParentMismatch { height });
                }
            }
        }

        let bytes = self.serializer.serialize(block)?;
        store.atomic_batch_write(vec![
            BatchOperation::put(block_key(&hash), bytes),
            BatchOperation::put(height_key(height), hash.to_vec()),
            BatchOperation::put(LAST_HEIGHT_KEY, height.to_be_bytes().to_vec()),
        ])?;

        debug!("[qn-02] Stored block {} at height {}", short_hash(&hash), height);
        Ok(())
    }

    fn find_by_height(&self, height: u64) -> BlockchainResult<Option<Block>> {
        let store = self.store.read();
        match Self::hash_at(&**store, height)? {
            Some(hash) => self.load(&**store, &hash),
            None => Ok(None),
        }
    }

    fn find_by_hash(&self, hash: &Hash) -> BlockchainResult<Option<Block>> {
        let store = self.store.read();
        self.load(&**store, hash)
    }

    fn find_last(&self) -> BlockchainResult<Option<Block>> {
        let store = self.store.read();
        let Some(last) = Self::last_height(&**store)? else {
            return Ok(None);
        };
        match Self::hash_at(&**store, last)? {
            Some(hash) => self.load(&**store, &hash),
            None => Err(KVStoreError::Corruption(format!("no block indexed at tip {last}")).into()),
        }
    }
}
