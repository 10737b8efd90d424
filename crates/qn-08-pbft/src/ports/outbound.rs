//! Driven ports (Outbound dependencies)

use crate::domain::{ConsensusId, ConsensusMessage, Vote};
use async_trait::async_trait;
use shared_types::Block;

/// Per-phase vote pool.
///
/// At most one vote per sender per round. Calls may arrive concurrently from
/// many peer paths; readers observe either the state before or after a write.
pub trait VoteRepository: Send + Sync {
    /// Store `vote`. Returns false when the sender already voted in this round.
    fn save(&self, vote: Vote) -> bool;

    /// Votes for a round in insertion order. Empty for unknown rounds.
    fn find_by_consensus_id(&self, id: &ConsensusId) -> Vec<Vote>;

    /// Number of distinct-sender votes for a round.
    fn count(&self, id: &ConsensusId) -> usize {
        self.find_by_consensus_id(id).len()
    }

    /// Drop every vote for a round.
    fn remove(&self, id: &ConsensusId);
}

/// Sends consensus messages to the other committee members.
#[async_trait]
pub trait ConsensusBroadcaster: Send + Sync {
    async fn broadcast(&self, message: ConsensusMessage) -> Result<(), String>;
}

/// Block boundary: what happens to a candidate once its round ends.
#[async_trait]
pub trait BlockFinalizer: Send + Sync {
    /// Persist a committed block and announce it.
    async fn finalize(&self, block: Block) -> Result<(), String>;

    /// Release a block whose round was abandoned.
    async fn abandon(&self, block: Block) -> Result<(), String>;
}

/// Time source for round timestamps and timeouts
pub trait TimeSource: Send + Sync {
    /// Current unix timestamp in milliseconds
    fn now(&self) -> u64;
}

/// Default time source using system time
pub struct SystemTimeSource;

impl TimeSource for SystemTimeSource {
    fn now(&self) -> u64 {
        std::time::SystemTime::now()
            .duration_since(std::time::UNIX_EPOCH)
            .unwrap_or_default()
            .as_millis() as u64
    }
}
