//! # Genesis Module
//!
//! Chain initialization at startup.
//!
//! The genesis block is the foundation of the chain:
//!
//! - Height: 0
//! - Parent hash: 32 zero bytes
//! - No transactions
//! - Timestamp and creator from `[genesis]` configuration
//!
//! Every node of a committee must use the same genesis parameters, otherwise
//! their chains diverge at height 1.

use anyhow::{Context, Result};
use qn_02_blockchain::{BlockApi, GenesisConfig};
use shared_types::{short_hash, Block};
use tracing::info;

/// Commit the genesis block unless the chain already has one.
///
/// Returns the chain's first block either way.
pub fn initialize_genesis(api: &BlockApi, config: &GenesisConfig) -> Result<Block> {
    info!("Checking for genesis block...");

    if let Some(created) = api
        .commit_genesis_block(config)
        .context("Failed to commit genesis block")?
    {
        info!(
            "🌱 Genesis block created: hash={}, creator={}",
            short_hash(&created.hash()),
            created.header.creator
        );
        return Ok(created);
    }

    let genesis = api
        .block_by_height(0)
        .context("Failed to read genesis block")?
        .context("Chain has blocks but no genesis")?;
    let tip = api.last_block().context("Failed to read chain tip")?;
    info!(
        "Genesis block found ({}), chain height {}",
        short_hash(&genesis.hash()),
        tip.map(|b| b.height()).unwrap_or_default()
    );
    Ok(genesis)
}

#[cfg(test)]
mod tests {
    use super::*;
    use qn_02_blockchain::{
        BlockApiDependencies, InMemoryBlockPool, InMemoryKVStore, KvBlockRepository,
        SystemTimeSource,
    };
    use shared_bus::testing::RecordingPublisher;
    use shared_types::{PeerId, ZERO_HASH};
    use std::sync::Arc;

    fn api() -> BlockApi {
        BlockApi::new(BlockApiDependencies {
            local_id: PeerId::from("n1"),
            repository: Arc::new(KvBlockRepository::new(Box::new(InMemoryKVStore::new()))),
            pool: Arc::new(InMemoryBlockPool::new()),
            publisher: Arc::new(RecordingPublisher::new()),
            time_source: Arc::new(SystemTimeSource),
        })
    }

    #[test]
    fn test_genesis_created_once() {
        let api = api();
        let config = GenesisConfig {
            timestamp: 42,
            creator: PeerId::from("genesis"),
        };

        let first = initialize_genesis(&api, &config).unwrap();
        assert_eq!(first.height(), 0);
        assert_eq!(first.header.prev_hash, ZERO_HASH);
        assert_eq!(first.header.timestamp, 42);

        let again = initialize_genesis(&api, &config).unwrap();
        assert_eq!(again, first);
        assert_eq!(api.last_block().unwrap(), Some(first));
    }
}
