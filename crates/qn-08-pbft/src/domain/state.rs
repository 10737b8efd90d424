//! Per-round consensus state machine.
//!
//! ```text
//! [Idle] ──preprepare──→ [PrePrepared] ──2f+1 prepare──→ [Prepared] ──2f+1 commit──→ [Committed]
//! ```

use super::error::{ConsensusError, ConsensusResult};
use super::message::{ConsensusId, SequenceId, Vote};
use serde::{Deserialize, Serialize};
use shared_types::{Block, Hash, ViewId};
use std::fmt;

/// Stage of one round. `Committed` is terminal.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize, Default)]
pub enum Stage {
    #[default]
    Idle,
    PrePrepared,
    Prepared,
    Committed,
}

impl fmt::Display for Stage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Self::Idle => "Idle",
            Self::PrePrepared => "PrePrepared",
            Self::Prepared => "Prepared",
            Self::Committed => "Committed",
        };
        f.write_str(name)
    }
}

/// One in-flight round.
///
/// `prepare_msgs` and `commit_msgs` are audit copies; the vote repositories
/// hold the authoritative counts.
#[derive(Debug, Clone)]
pub struct ConsensusState {
    pub id: ConsensusId,
    pub view_id: ViewId,
    pub sequence_id: SequenceId,
    pub current_stage: Stage,
    pub block: Block,
    pub prepare_msgs: Vec<Vote>,
    pub commit_msgs: Vec<Vote>,
    /// Unix timestamp (milliseconds) the round was opened.
    pub started_at: u64,
}

impl ConsensusState {
    pub fn new(
        id: ConsensusId,
        view_id: ViewId,
        sequence_id: SequenceId,
        block: Block,
        started_at: u64,
    ) -> Self {
        Self {
            id,
            view_id,
            sequence_id,
            current_stage: Stage::Idle,
            block,
            prepare_msgs: Vec::new(),
            commit_msgs: Vec::new(),
            started_at,
        }
    }

    pub fn block_hash(&self) -> Hash {
        self.block.hash()
    }

    pub fn pre_prepare(&mut self) -> ConsensusResult<()> {
        self.transition(Stage::Idle, Stage::PrePrepared)
    }

    pub fn prepare(&mut self) -> ConsensusResult<()> {
        self.transition(Stage::PrePrepared, Stage::Prepared)
    }

    pub fn commit(&mut self) -> ConsensusResult<()> {
        self.transition(Stage::Prepared, Stage::Committed)
    }

    pub fn is_committed(&self) -> bool {
        self.current_stage == Stage::Committed
    }

    /// Whether the round has been open for `timeout_ms` or longer at `now`.
    pub fn is_expired(&self, now: u64, timeout_ms: u64) -> bool {
        now.saturating_sub(self.started_at) >= timeout_ms
    }

    fn transition(&mut self, from: Stage, to: Stage) -> ConsensusResult<()> {
        if self.current_stage != from {
            return Err(ConsensusError::InvalidTransition {
                from: self.current_stage,
                to,
            });
        }
        self.current_stage = to;
        Ok(())
    }
}
