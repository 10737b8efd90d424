//! Error types for the consensus subsystem

use super::message::{ConsensusId, SequenceId};
use super::state::Stage;
use shared_types::{PeerId, ViewId};

/// Consensus error types
///
/// Rejected proposals are reported here; stray or late votes are not errors
/// and never surface as one.
#[derive(Debug, thiserror::Error)]
pub enum ConsensusError {
    #[error("Preprepare from non-leader: expected {expected}, got {actual}")]
    NotLeader { expected: PeerId, actual: PeerId },

    #[error("Local node is not the leader of the current view")]
    LocalNodeNotLeader,

    #[error("View mismatch: expected {expected}, got {actual}")]
    ViewMismatch { expected: ViewId, actual: ViewId },

    #[error("Stale sequence {got} in view {view}, highest accepted is {highest}")]
    StaleSequence {
        view: ViewId,
        highest: SequenceId,
        got: SequenceId,
    },

    #[error("Round already in progress: {0}")]
    DuplicateRound(ConsensusId),

    #[error("Empty consensus id")]
    EmptyConsensusId,

    #[error("Malformed block: {0}")]
    MalformedBlock(String),

    #[error("Sender {claimed} does not match connection {connection}")]
    SenderMismatch { claimed: PeerId, connection: PeerId },

    #[error("Invalid stage transition from {from} to {to}")]
    InvalidTransition { from: Stage, to: Stage },

    #[error("Cannot decode consensus message: {0}")]
    Decode(String),

    #[error("Broadcast failed: {0}")]
    Broadcast(String),

    #[error("Block finalization failed: {0}")]
    Finalization(String),
}

/// Result type for consensus operations
pub type ConsensusResult<T> = Result<T, ConsensusError>;
