//! # Transaction Pool Subsystem
//!
//! **Subsystem ID:** 6
//!
//! ## Purpose
//!
//! Accumulates client transactions, tracks the current leader and feeds the
//! leader-driven proposal pipeline. Committed transactions are pruned when
//! the block subsystem announces the commit.
//!
//! ## Transaction Lifecycle
//!
//! ```text
//! [Queued] ──propose/forward──→ [Proposed] ──BlockCommitted──→ (removed)
//!                                   │
//!                                   └── BlockAbandoned ──→ [Queued]
//! ```
//!
//! ## Events Consumed
//!
//! | Topic | Handler |
//! |-------|---------|
//! | `tx.created` | `RepositoryProjector::handle_tx_created` |
//! | `tx.deleted` | `RepositoryProjector::handle_tx_deleted` |
//! | `leader.changed` | `RepositoryProjector::handle_leader_changed` |
//! | `block.committed` | `TxEventHandler::handle_block_committed` |
//! | `block.abandoned` | `TxEventHandler::handle_block_abandoned` |
//!
//! Every handler rejects an event with an empty id (`TxPoolError::NoEventId`).
//!
//! ## Module Structure (Hexagonal Architecture)
//!
//! ```text
//! adapters/  - in-memory repositories, bus-backed MessageDispatcher
//! ports/     - TransactionRepository, LeaderRepository, TransactionDispatcher
//! domain/    - errors, proposal config and outcomes
//! service/   - ProposalService, RepositoryProjector, TxEventHandler
//! ```

pub mod adapters;
pub mod domain;
pub mod ports;
pub mod service;

pub use adapters::{InMemoryLeaderRepository, InMemoryTransactionRepository, MessageDispatcher};
pub use domain::{ProposalConfig, ProposalOutcome, TxPoolError, TxPoolResult};
pub use ports::{LeaderRepository, TransactionDispatcher, TransactionRepository};
pub use service::{ProposalDependencies, ProposalService, RepositoryProjector, TxEventHandler};
