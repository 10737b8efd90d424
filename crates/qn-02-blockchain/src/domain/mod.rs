//! Domain layer for the blockchain subsystem.

pub mod errors;

pub use errors::{BlockchainError, BlockchainResult, KVStoreError};

use serde::{Deserialize, Serialize};
use shared_types::{Block, PeerId, ZERO_HASH};
use std::fmt;
use std::str::FromStr;

/// How proposed blocks reach the chain.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum EngineMode {
    /// Single node: proposals are committed immediately.
    Solo,
    /// Proposals are staged and agreed on by the committee first.
    #[default]
    Pbft,
}

impl fmt::Display for EngineMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Solo => f.write_str("solo"),
            Self::Pbft => f.write_str("pbft"),
        }
    }
}

impl FromStr for EngineMode {
    type Err = BlockchainError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "solo" => Ok(Self::Solo),
            "pbft" => Ok(Self::Pbft),
            other => Err(BlockchainError::InvalidEngineMode(other.to_string())),
        }
    }
}

/// Parameters of the genesis block.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct GenesisConfig {
    /// Unix timestamp (milliseconds) written into the genesis header.
    pub timestamp: u64,
    pub creator: PeerId,
}

impl GenesisConfig {
    /// Every node with the same config derives the same genesis hash.
    pub fn block(&self) -> Block {
        Block::new(0, ZERO_HASH, self.creator.clone(), self.timestamp, Vec::new())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_engine_mode_parse() {
        assert_eq!("solo".parse::<EngineMode>(), Ok(EngineMode::Solo));
        assert_eq!(" PBFT ".parse::<EngineMode>(), Ok(EngineMode::Pbft));
        assert_eq!(
            "raft".parse::<EngineMode>(),
            Err(BlockchainError::InvalidEngineMode("raft".to_string()))
        );
    }

    #[test]
    fn test_genesis_is_deterministic() {
        let config = GenesisConfig {
            timestamp: 1_700_000_000_000,
            creator: PeerId::from("genesis"),
        };
        let a = config.block();
        let b = config.block();
        assert!(a.is_genesis());
        assert_eq!(a.hash(), b.hash());
    }
}
