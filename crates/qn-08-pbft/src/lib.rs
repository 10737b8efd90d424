//! # qn-08-pbft
//!
//! PBFT consensus subsystem for Quorum-Node.
//!
//! ## Architecture
//!
//! Each proposed block is agreed on in its own round:
//!
//! ```text
//! Leader ──Preprepare(B)──→ committee
//!                            │ each member saves + broadcasts Prepare
//!                            ↓
//!                 ⌊2n/3⌋+1 Prepares ──→ Prepared
//!                            │ each member saves + broadcasts Commit
//!                            ↓
//!                 ⌊2n/3⌋+1 Commits  ──→ Committed ──→ BlockFinalizer::finalize(B)
//! ```
//!
//! Rounds that miss quorum within the round timeout are abandoned and their
//! block released through `BlockFinalizer::abandon`.
//!
//! ## Usage
//!
//! ```rust,ignore
//! use qn_08_pbft::{ConsensusCoordinator, ConsensusDependencies};
//!
//! let coordinator = Arc::new(ConsensusCoordinator::new(ConsensusDependencies {
//!     committee,
//!     prepare_votes: Arc::new(InMemoryVoteRepository::new()),
//!     commit_votes: Arc::new(InMemoryVoteRepository::new()),
//!     broadcaster,
//!     finalizer,
//!     config: ConsensusConfig::default(),
//! }));
//!
//! let round = coordinator.start_consensus(block).await?;
//! tokio::spawn(coordinator.clone().run_timeout_loop(shutdown_rx));
//! ```

pub mod adapters;
pub mod domain;
pub mod ports;
pub mod service;

// Re-export main types
pub use adapters::{BusBroadcaster, InMemoryVoteRepository};
pub use domain::{
    quorum_reached, quorum_threshold, Committee, ConsensusConfig, ConsensusError, ConsensusId,
    ConsensusMessage, ConsensusResult, ConsensusState, MessageHeader, MsgType, Phase, Preprepare,
    SequenceId, Stage, Vote,
};
pub use ports::{
    BlockFinalizer, ConsensusApi, ConsensusBroadcaster, SystemTimeSource, TimeSource,
    VoteRepository,
};
pub use service::{ConsensusCoordinator, ConsensusDependencies};
