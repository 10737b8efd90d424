//! # Commands
//!
//! Peer-addressed commands and RPC request bodies exchanged between subsystems.
//!
//! All outbound peer traffic is a [`DeliverCommand`] published on the
//! `Command` exchange under `message.deliver`, so a single dispatcher can
//! route every peer command. Inbound peer traffic arrives as a
//! [`ReceivedMessage`] on `message.receive`.

use crate::entities::{PeerId, Transaction};
use serde::{Deserialize, Serialize};

/// Protocol tags carried by peer commands.
pub mod protocols {
    pub const LEADER_INFO_REQUEST: &str = "LeaderInfoRequestProtocol";
    pub const LEADER_INFO_DELIVER: &str = "LeaderInfoDeliverProtocol";
    pub const PEER_LIST_REQUEST: &str = "PeerListRequestProtocol";
    pub const PEER_LIST_DELIVER: &str = "PeerListDeliverProtocol";
    pub const LEADER_TRANSACTIONS: &str = "LeaderTransactionsProtocol";
    pub const CONSENSUS_MESSAGE: &str = "ConsensusMessageProtocol";
}

/// Outbound command addressed to one or more peers.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DeliverCommand {
    pub recipients: Vec<PeerId>,
    pub protocol: String,
    /// JSON-encoded protocol body.
    pub body: Vec<u8>,
}

impl DeliverCommand {
    /// Build a command whose body is the JSON encoding of `body`.
    pub fn json<T: Serialize>(
        recipients: Vec<PeerId>,
        protocol: &str,
        body: &T,
    ) -> Result<Self, serde_json::Error> {
        Ok(Self {
            recipients,
            protocol: protocol.to_string(),
            body: serde_json::to_vec(body)?,
        })
    }
}

/// Inbound message handed over by the transport.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ReceivedMessage {
    /// Connection (peer) the message came from.
    pub sender: PeerId,
    pub protocol: String,
    pub body: Vec<u8>,
}

impl ReceivedMessage {
    /// Decode the JSON body.
    pub fn decode<T: serde::de::DeserializeOwned>(&self) -> Result<T, serde_json::Error> {
        serde_json::from_slice(&self.body)
    }
}

/// Request to package transactions into the next block (`block.propose`).
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ProposeBlockCommand {
    pub transactions: Vec<Transaction>,
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::entities::Leader;

    #[test]
    fn test_deliver_command_json_body_decodes() {
        let leader = Leader::new("n1", crate::ViewId(2));
        let command = DeliverCommand::json(
            vec![PeerId::from("n2")],
            protocols::LEADER_INFO_DELIVER,
            &leader,
        )
        .unwrap();

        let received = ReceivedMessage {
            sender: PeerId::from("n1"),
            protocol: command.protocol.clone(),
            body: command.body.clone(),
        };
        let decoded: Leader = received.decode().unwrap();
        assert_eq!(decoded, leader);
    }
}
