//! Driving ports (Inbound API)

use crate::domain::{ConsensusId, ConsensusMessage, ConsensusResult, Stage};
use async_trait::async_trait;
use shared_types::{Block, Leader};

/// Consensus API
///
/// Entry points used by the block subsystem (to open rounds), by the peer
/// transport (to deliver votes) and by the leader-change event handler.
#[async_trait]
pub trait ConsensusApi: Send + Sync {
    /// Open a round for `block`. Only the current leader may do this.
    async fn start_consensus(&self, block: Block) -> ConsensusResult<ConsensusId>;

    /// Process one message from a committee member.
    ///
    /// Returns the round's stage after processing, or `None` when the
    /// message was dropped as stray.
    async fn handle_message(&self, message: ConsensusMessage) -> ConsensusResult<Option<Stage>>;

    /// Apply a leader rotation.
    fn on_leader_changed(&self, leader: Leader);
}
