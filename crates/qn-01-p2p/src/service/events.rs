//! Local event handling for the P2P subsystem.

use super::P2pDependencies;
use crate::domain::{P2pError, P2pResult};
use crate::ports::{CommandGateway, LeaderRepository, PeerRepository};
use shared_types::{ConnectionSavedEvent, LeaderChangedEvent, PeerId};
use std::sync::Arc;
use tracing::info;

pub struct P2pEventHandler {
    local_id: PeerId,
    gateway: Arc<dyn CommandGateway>,
    peers: Arc<dyn PeerRepository>,
    leaders: Arc<dyn LeaderRepository>,
}

impl P2pEventHandler {
    pub fn new(deps: &P2pDependencies) -> Self {
        Self {
            local_id: deps.local_id.clone(),
            gateway: deps.gateway.clone(),
            peers: deps.peers.clone(),
            leaders: deps.leaders.clone(),
        }
    }

    /// Record a new connection; ask it for the leader while ours is unknown.
    ///
    /// Returns whether the peer was new.
    pub async fn handle_connection_saved(&self, event: &ConnectionSavedEvent) -> P2pResult<bool> {
        if event.id.trim().is_empty() {
            return Err(P2pError::NoEventId);
        }
        let peer = event.peer();
        if peer.peer_id == self.local_id {
            return Ok(false);
        }

        let added = self.peers.save(peer.clone());
        if added {
            info!("[qn-01] Peer {} saved ({})", peer.peer_id, peer.address);
        }
        if self.leaders.get_leader().is_none() {
            self.gateway.request_leader_info(&peer.peer_id).await?;
        }
        Ok(added)
    }

    pub fn handle_leader_changed(&self, event: &LeaderChangedEvent) -> P2pResult<()> {
        if event.id.trim().is_empty() {
            return Err(P2pError::NoEventId);
        }
        self.leaders.set_leader(event.leader());
        Ok(())
    }
}
