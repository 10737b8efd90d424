//! Domain layer for the consensus subsystem

pub mod committee;
pub mod error;
pub mod message;
pub mod quorum;
pub mod state;

pub use committee::Committee;
pub use error::{ConsensusError, ConsensusResult};
pub use message::{
    ConsensusId, ConsensusMessage, MessageHeader, MsgType, Phase, Preprepare, SequenceId, Vote,
};
pub use quorum::{max_faulty, quorum_reached, quorum_threshold};
pub use state::{ConsensusState, Stage};

use std::time::Duration;

/// Round timing configuration.
#[derive(Debug, Clone)]
pub struct ConsensusConfig {
    /// Rounds not committed within this window are abandoned.
    pub round_timeout: Duration,
    /// How often expired rounds are swept.
    pub sweep_interval: Duration,
}

impl Default for ConsensusConfig {
    fn default() -> Self {
        Self {
            round_timeout: Duration::from_secs(30),
            sweep_interval: Duration::from_secs(1),
        }
    }
}
