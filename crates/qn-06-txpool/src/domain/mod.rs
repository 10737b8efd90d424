//! Domain layer for the transaction pool.

pub mod errors;

pub use errors::{TxPoolError, TxPoolResult};

use std::time::Duration;

/// Proposal pipeline configuration.
#[derive(Debug, Clone)]
pub struct ProposalConfig {
    /// Most transactions packaged into one proposal.
    pub max_txs_per_block: usize,
    /// Time between proposal attempts.
    pub interval: Duration,
}

impl Default for ProposalConfig {
    fn default() -> Self {
        Self {
            max_txs_per_block: 100,
            interval: Duration::from_secs(2),
        }
    }
}

/// What a single proposal attempt did.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ProposalOutcome {
    /// Nothing queued.
    Idle,
    /// Leader unknown; transactions stay queued.
    NoLeader,
    /// This node leads: `n` transactions proposed as a block.
    Proposed(usize),
    /// Another node leads: `n` transactions forwarded to it.
    Forwarded(usize),
}
