//! # Runtime Adapters
//!
//! Bridges between subsystems that must call each other without depending
//! on each other's crates, plus the in-process peer transport.
//!
//! | Adapter | Implements | Backed by |
//! |---------|------------|-----------|
//! | `ChainFinalizer` | `qn_08_pbft::BlockFinalizer` | `BlockApi` |
//! | `CoordinatorStarter` | `qn_02_blockchain::ConsensusStarter` | `ConsensusCoordinator` |
//! | `LocalNetwork` | peer transport | one `InMemoryBus` per node |

mod consensus;
mod finalizer;
mod network;

pub use consensus::CoordinatorStarter;
pub use finalizer::ChainFinalizer;
pub use network::LocalNetwork;
