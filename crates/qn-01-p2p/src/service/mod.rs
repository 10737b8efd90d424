//! Inbound peer command handling.
//!
//! | Protocol | Action |
//! |----------|--------|
//! | `LeaderInfoRequestProtocol` | reply with our leader |
//! | `LeaderInfoDeliverProtocol` | adopt a newer leader, publish `leader.changed` |
//! | `PeerListRequestProtocol` | reply with our peer list |
//! | `PeerListDeliverProtocol` | store the delivered peers |

mod events;

pub use events::P2pEventHandler;

use crate::domain::{
    CommandOutcome, LeaderInfoDeliverMessage, LeaderInfoRequestMessage, P2pError, P2pResult,
    PeerListDeliverMessage, PeerListRequestMessage,
};
use crate::ports::{CommandGateway, LeaderRepository, PeerRepository};
use serde::de::DeserializeOwned;
use shared_bus::{exchanges, topics, BusPayload, MessagePublisher};
use shared_types::{protocols, LeaderChangedEvent, PeerId, ReceivedMessage};
use std::sync::Arc;
use tracing::{debug, info, warn};

/// Dependencies for the P2P handlers
pub struct P2pDependencies {
    pub local_id: PeerId,
    pub gateway: Arc<dyn CommandGateway>,
    pub peers: Arc<dyn PeerRepository>,
    pub leaders: Arc<dyn LeaderRepository>,
    pub publisher: Arc<dyn MessagePublisher>,
}

pub struct PeerCommandHandler {
    local_id: PeerId,
    gateway: Arc<dyn CommandGateway>,
    peers: Arc<dyn PeerRepository>,
    leaders: Arc<dyn LeaderRepository>,
    publisher: Arc<dyn MessagePublisher>,
}

fn decode<T: DeserializeOwned>(message: &ReceivedMessage) -> P2pResult<T> {
    message.decode().map_err(|e| P2pError::Decode {
        protocol: message.protocol.clone(),
        reason: e.to_string(),
    })
}

impl PeerCommandHandler {
    pub fn new(deps: &P2pDependencies) -> Self {
        Self {
            local_id: deps.local_id.clone(),
            gateway: deps.gateway.clone(),
            peers: deps.peers.clone(),
            leaders: deps.leaders.clone(),
            publisher: deps.publisher.clone(),
        }
    }

    /// Dispatch one inbound peer command by protocol.
    pub async fn handle(&self, message: &ReceivedMessage) -> P2pResult<CommandOutcome> {
        if message.sender.is_empty() {
            return Err(P2pError::EmptyPeerId);
        }

        match message.protocol.as_str() {
            protocols::LEADER_INFO_REQUEST => {
                decode::<LeaderInfoRequestMessage>(message)?;
                self.reply_leader_info(&message.sender).await
            }
            protocols::LEADER_INFO_DELIVER => {
                let body: LeaderInfoDeliverMessage = decode(message)?;
                self.adopt_leader(body).await
            }
            protocols::PEER_LIST_REQUEST => {
                decode::<PeerListRequestMessage>(message)?;
                self.reply_peer_list(&message.sender).await
            }
            protocols::PEER_LIST_DELIVER => {
                let body: PeerListDeliverMessage = decode(message)?;
                Ok(self.store_peers(body))
            }
            other => {
                warn!(
                    "[qn-01] Ignoring unknown protocol {} from {}",
                    other, message.sender
                );
                Ok(CommandOutcome::Ignored)
            }
        }
    }

    async fn reply_leader_info(&self, requester: &PeerId) -> P2pResult<CommandOutcome> {
        let Some(leader) = self.leaders.get_leader() else {
            debug!("[qn-01] {} asked for the leader, none known yet", requester);
            return Ok(CommandOutcome::Ignored);
        };
        self.gateway.deliver_leader_info(requester, &leader).await?;
        Ok(CommandOutcome::LeaderInfoSent)
    }

    async fn adopt_leader(&self, body: LeaderInfoDeliverMessage) -> P2pResult<CommandOutcome> {
        let leader = body.leader;
        if leader.leader_id.is_empty() {
            return Err(P2pError::EmptyLeaderId);
        }

        if let Some(current) = self.leaders.get_leader() {
            if current == leader || leader.view_id < current.view_id {
                return Ok(CommandOutcome::Ignored);
            }
        }

        self.leaders.set_leader(leader.clone());
        info!(
            "[qn-01] 👑 Leader {} learned from peer ({})",
            leader.leader_id, leader.view_id
        );
        self.publisher
            .publish(
                exchanges::EVENT,
                topics::LEADER_CHANGED,
                BusPayload::LeaderChanged(LeaderChangedEvent::from(&leader)),
            )
            .await
            .map_err(|e| P2pError::Transport(e.to_string()))?;
        Ok(CommandOutcome::LeaderUpdated(leader))
    }

    async fn reply_peer_list(&self, requester: &PeerId) -> P2pResult<CommandOutcome> {
        let peers: Vec<_> = self
            .peers
            .find_all()
            .into_iter()
            .filter(|p| &p.peer_id != requester)
            .collect();
        if peers.is_empty() {
            return Ok(CommandOutcome::Ignored);
        }
        self.gateway.deliver_peer_list(requester, &peers).await?;
        Ok(CommandOutcome::PeerListSent(peers.len()))
    }

    fn store_peers(&self, body: PeerListDeliverMessage) -> CommandOutcome {
        let stored = body
            .peers
            .into_iter()
            .filter(|p| !p.peer_id.is_empty() && p.peer_id != self.local_id)
            .filter(|p| self.peers.save(p.clone()))
            .count();
        debug!("[qn-01] Stored {} new peers", stored);
        CommandOutcome::PeersStored(stored)
    }
}

#[cfg(test)]
mod tests;
