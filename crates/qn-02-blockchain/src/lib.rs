//! # Blockchain Subsystem
//!
//! **Subsystem ID:** 2
//!
//! ## Purpose
//!
//! Owns the chain: an append-only block repository over a key/value store,
//! a staging pool for proposed blocks and the block API that moves blocks
//! from one to the other.
//!
//! ## Chain Invariants
//!
//! - The first block is the genesis block (height 0, zero parent), committed
//!   once at startup.
//! - Every later block sits at `tip.height + 1` and links to the tip.
//! - A block hash is stored at most once.
//!
//! ## Bus Surface
//!
//! | Direction | Key | Handler / Payload |
//! |-----------|-----|-------------------|
//! | RPC | `block.propose` | `BlockProposeCommandHandler` |
//! | Consumed | `connection.saved` | `ConnectionEventHandler` |
//! | Published | `block.committed` | `BlockCommittedEvent` |
//! | Published | `block.abandoned` | `BlockAbandonedEvent` |
//!
//! ## Module Structure (Hexagonal Architecture)
//!
//! ```text
//! adapters/  - KV stores, block repository, block pool, bus handlers
//! ports/     - KeyValueStore, BlockRepository, BlockPool, ConsensusStarter
//! domain/    - errors, engine mode, genesis config
//! service/   - BlockApi
//! ```

pub mod adapters;
pub mod domain;
pub mod ports;
pub mod service;

pub use adapters::{
    BincodeBlockSerializer, BlockProposeCommandHandler, ConnectionEventHandler,
    FileBackedKVStore, InMemoryBlockPool, InMemoryKVStore, KvBlockRepository,
    ProposeBlockResponse,
};
pub use domain::{BlockchainError, BlockchainResult, EngineMode, GenesisConfig, KVStoreError};
pub use ports::{
    BatchOperation, BlockPool, BlockRepository, BlockSerializer, ConsensusStarter, KeyValueStore,
    SystemTimeSource, TimeSource,
};
pub use service::{BlockApi, BlockApiDependencies};
