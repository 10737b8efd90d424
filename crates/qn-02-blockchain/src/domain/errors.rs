//! # Domain Errors
//!
//! Error types for the blockchain subsystem.
//!
//! - Validation failures (empty batches, missing ids) are returned before any
//!   side effect.
//! - Chain violations (wrong height, wrong parent, duplicate block) leave the
//!   repository untouched.

use thiserror::Error;

/// Errors that can occur while building, staging or committing blocks.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum BlockchainError {
    /// A proposal arrived with no transactions.
    #[error("Empty transaction list proposed")]
    EmptyTransactionList,

    /// Event received without an id.
    #[error("Event id is missing")]
    NoEventId,

    /// A block with this hash is already stored.
    #[error("Block {hash} already exists")]
    BlockExists { hash: String },

    /// The block does not extend the current tip.
    #[error("Expected block at height {expected}, got {got}")]
    HeightMismatch { expected: u64, got: u64 },

    /// `prev_hash` does not point at the current tip.
    #[error("Block at height {height} does not link to the chain tip")]
    ParentMismatch { height: u64 },

    /// The first block of an empty chain must be a genesis block.
    #[error("First block must be a genesis block (height 0, zero parent)")]
    InvalidGenesis,

    /// Proposal attempted before the genesis block was committed.
    #[error("Chain has no genesis block")]
    EmptyChain,

    /// Commit or abandon requested for a block that is not staged.
    #[error("Block {0} is not in the block pool")]
    BlockNotStaged(String),

    /// `Pbft` mode without a consensus engine attached.
    #[error("No consensus engine attached")]
    NoConsensusEngine,

    /// Unknown engine mode in configuration.
    #[error("Invalid engine mode: {0}")]
    InvalidEngineMode(String),

    /// Starting a consensus round failed.
    #[error("Consensus error: {0}")]
    Consensus(String),

    /// The underlying key/value store failed.
    #[error(transparent)]
    Storage(#[from] KVStoreError),

    /// Block could not be encoded or decoded.
    #[error("Serialization error: {0}")]
    Serialization(String),

    /// Publishing an event failed.
    #[error("Publish error: {0}")]
    Publish(String),
}

/// Key/value store adapter errors.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum KVStoreError {
    /// I/O error during read/write.
    #[error("KV store I/O error: {0}")]
    Io(String),

    /// Stored bytes could not be decoded.
    #[error("KV store corruption: {0}")]
    Corruption(String),
}

/// Result type for blockchain operations.
pub type BlockchainResult<T> = Result<T, BlockchainError>;
