use crate::ports::BlockPool;
use parking_lot::RwLock;
use shared_types::{Block, Hash};
use std::collections::HashMap;

/// In-memory staging area keyed by block hash.
#[derive(Default)]
pub struct InMemoryBlockPool {
    blocks: RwLock<HashMap<Hash, Block>>,
}

impl InMemoryBlockPool {
    pub fn new() -> Self {
        Self::default()
    }
}

impl BlockPool for InMemoryBlockPool {
    fn add(&self, block: Block) -> bool {
        let mut blocks = self.blocks.write();
        let hash = block.hash();
        if blocks.contains_key(&hash) {
            return false;
        }
        blocks.insert(hash, block);
        true
    }

    fn remove(&self, hash: &Hash) -> Option<Block> {
        self.blocks.write().remove(hash)
    }

    fn get(&self, hash: &Hash) -> Option<Block> {
        self.blocks.read().get(hash).cloned()
    }

    fn highest(&self) -> Option<Block> {
        self.blocks
            .read()
            .values()
            .max_by_key(|b| b.height())
            .cloned()
    }

    fn len(&self) -> usize {
        self.blocks.read().len()
    }
}
