//! # Domain Events
//!
//! Events published on the `Event` exchange. Every event carries a non-empty
//! identifier; handlers reject events whose id is empty.

use crate::entities::{Leader, Peer, PeerId, Transaction, TxId, TxStatus, ViewId};
use serde::{Deserialize, Serialize};

/// A peer connection was established and recorded.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ConnectionSavedEvent {
    /// Connection id (the remote peer id).
    pub id: String,
    pub address: String,
}

impl ConnectionSavedEvent {
    pub fn peer(&self) -> Peer {
        Peer::new(self.id.clone(), self.address.clone())
    }
}

/// A client transaction entered the node.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TxCreatedEvent {
    /// Transaction id.
    pub id: String,
    pub payload: Vec<u8>,
    pub timestamp: u64,
}

impl TxCreatedEvent {
    pub fn transaction(&self) -> Transaction {
        Transaction {
            id: TxId::new(self.id.clone()),
            payload: self.payload.clone(),
            status: TxStatus::Queued,
            timestamp: self.timestamp,
        }
    }
}

/// A transaction was withdrawn from the node.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TxDeletedEvent {
    pub id: String,
}

/// The leader (and with it the view) changed.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LeaderChangedEvent {
    /// New leader id.
    pub id: String,
    pub view_id: ViewId,
}

impl LeaderChangedEvent {
    pub fn leader(&self) -> Leader {
        Leader {
            leader_id: PeerId::new(self.id.clone()),
            view_id: self.view_id,
        }
    }
}

impl From<&Leader> for LeaderChangedEvent {
    fn from(leader: &Leader) -> Self {
        Self {
            id: leader.leader_id.0.clone(),
            view_id: leader.view_id,
        }
    }
}

/// A block reached consensus and was appended to the chain.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct BlockCommittedEvent {
    /// Hex-encoded block hash.
    pub id: String,
    pub height: u64,
    /// Ids of every transaction included in the block.
    pub tx_ids: Vec<TxId>,
}

/// A proposed block was dropped before reaching consensus.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct BlockAbandonedEvent {
    /// Hex-encoded block hash.
    pub id: String,
    pub height: u64,
    /// Transactions to return to the queue.
    pub tx_ids: Vec<TxId>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_tx_created_event_builds_queued_transaction() {
        let event = TxCreatedEvent {
            id: "tx-1".to_string(),
            payload: vec![1, 2, 3],
            timestamp: 99,
        };
        let tx = event.transaction();
        assert_eq!(tx.id, TxId::new("tx-1"));
        assert_eq!(tx.status, TxStatus::Queued);
        assert_eq!(tx.payload, vec![1, 2, 3]);
    }

    #[test]
    fn test_leader_changed_round_trips_leader() {
        let leader = Leader::new("n2", ViewId(3));
        let event = LeaderChangedEvent::from(&leader);
        assert_eq!(event.leader(), leader);
    }
}
