//! Consensus messages exchanged between committee members.
//!
//! A round moves through three message kinds. Only the Preprepare carries
//! the candidate block; votes reference it by hash.

use serde::{Deserialize, Serialize};
use shared_types::{Block, Hash, PeerId, ViewId};
use std::fmt;
use uuid::Uuid;

/// Monotonic position of a round within a view.
pub type SequenceId = u64;

/// Identifier of one consensus round.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct ConsensusId(pub String);

impl ConsensusId {
    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }

    /// Fresh random round id.
    pub fn generate() -> Self {
        Self(Uuid::new_v4().to_string())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    pub fn is_empty(&self) -> bool {
        self.0.trim().is_empty()
    }
}

impl fmt::Display for ConsensusId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<&str> for ConsensusId {
    fn from(id: &str) -> Self {
        Self::new(id)
    }
}

/// Fields common to every consensus message.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct MessageHeader {
    pub consensus_id: ConsensusId,
    pub view_id: ViewId,
    pub sequence_id: SequenceId,
    pub sender_id: PeerId,
    /// Unix timestamp (milliseconds) at the sender.
    pub timestamp: u64,
}

/// Leader proposal opening a round.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Preprepare {
    pub header: MessageHeader,
    pub block: Block,
}

/// A Prepare or Commit vote for the round's candidate block.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Vote {
    pub header: MessageHeader,
    pub block_hash: Hash,
}

impl Vote {
    pub fn consensus_id(&self) -> &ConsensusId {
        &self.header.consensus_id
    }

    pub fn sender(&self) -> &PeerId {
        &self.header.sender_id
    }
}

/// Message kind tag.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum MsgType {
    Preprepare,
    Prepare,
    Commit,
}

impl fmt::Display for MsgType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Self::Preprepare => "Preprepare",
            Self::Prepare => "Prepare",
            Self::Commit => "Commit",
        };
        f.write_str(name)
    }
}

/// Voting phase of a round.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Phase {
    Prepare,
    Commit,
}

/// Any message of the three-phase protocol.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type")]
pub enum ConsensusMessage {
    Preprepare(Preprepare),
    Prepare(Vote),
    Commit(Vote),
}

impl ConsensusMessage {
    pub fn msg_type(&self) -> MsgType {
        match self {
            Self::Preprepare(_) => MsgType::Preprepare,
            Self::Prepare(_) => MsgType::Prepare,
            Self::Commit(_) => MsgType::Commit,
        }
    }

    pub fn header(&self) -> &MessageHeader {
        match self {
            Self::Preprepare(p) => &p.header,
            Self::Prepare(v) | Self::Commit(v) => &v.header,
        }
    }

    pub fn consensus_id(&self) -> &ConsensusId {
        &self.header().consensus_id
    }

    pub fn sender(&self) -> &PeerId {
        &self.header().sender_id
    }
}
