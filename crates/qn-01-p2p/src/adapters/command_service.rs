//! Bus-backed command gateway.

use crate::domain::{
    LeaderInfoDeliverMessage, LeaderInfoRequestMessage, P2pError, P2pResult,
    PeerListDeliverMessage, PeerListRequestMessage,
};
use crate::ports::CommandGateway;
use async_trait::async_trait;
use serde::Serialize;
use shared_bus::{exchanges, topics, BusPayload, MessagePublisher};
use shared_types::{protocols, DeliverCommand, Leader, Peer, PeerId};
use std::sync::Arc;
use tracing::debug;

fn now_millis() -> u64 {
    std::time::SystemTime::now()
        .duration_since(std::time::UNIX_EPOCH)
        .unwrap_or_default()
        .as_millis() as u64
}

pub struct CommandService {
    publisher: Arc<dyn MessagePublisher>,
}

impl CommandService {
    pub fn new(publisher: Arc<dyn MessagePublisher>) -> Self {
        Self { publisher }
    }

    async fn deliver<T: Serialize + Sync>(
        &self,
        recipient: &PeerId,
        protocol: &str,
        body: &T,
    ) -> P2pResult<()> {
        let command = DeliverCommand::json(vec![recipient.clone()], protocol, body)
            .map_err(|e| P2pError::Serialization(e.to_string()))?;

        self.publisher
            .publish(
                exchanges::COMMAND,
                topics::MESSAGE_DELIVER,
                BusPayload::Deliver(command),
            )
            .await
            .map_err(|e| P2pError::Transport(e.to_string()))?;

        debug!("[qn-01] {} -> {}", protocol, recipient);
        Ok(())
    }
}

#[async_trait]
impl CommandGateway for CommandService {
    async fn request_leader_info(&self, connection_id: &PeerId) -> P2pResult<()> {
        if connection_id.is_empty() {
            return Err(P2pError::EmptyPeerId);
        }
        let body = LeaderInfoRequestMessage {
            timestamp: now_millis(),
        };
        self.deliver(connection_id, protocols::LEADER_INFO_REQUEST, &body)
            .await
    }

    async fn deliver_leader_info(&self, connection_id: &PeerId, leader: &Leader) -> P2pResult<()> {
        if connection_id.is_empty() {
            return Err(P2pError::EmptyPeerId);
        }
        if leader.leader_id.is_empty() {
            return Err(P2pError::EmptyLeaderId);
        }
        let body = LeaderInfoDeliverMessage {
            leader: leader.clone(),
        };
        self.deliver(connection_id, protocols::LEADER_INFO_DELIVER, &body)
            .await
    }

    async fn request_peer_list(&self, peer_id: &PeerId) -> P2pResult<()> {
        if peer_id.is_empty() {
            return Err(P2pError::EmptyPeerId);
        }
        let body = PeerListRequestMessage {
            timestamp: now_millis(),
        };
        self.deliver(peer_id, protocols::PEER_LIST_REQUEST, &body)
            .await
    }

    async fn deliver_peer_list(&self, connection_id: &PeerId, peers: &[Peer]) -> P2pResult<()> {
        if connection_id.is_empty() {
            return Err(P2pError::EmptyPeerId);
        }
        if peers.is_empty() {
            return Err(P2pError::EmptyPeerList);
        }
        let body = PeerListDeliverMessage {
            peers: peers.to_vec(),
        };
        self.deliver(connection_id, protocols::PEER_LIST_DELIVER, &body)
            .await
    }
}
