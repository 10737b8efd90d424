//! Driven ports (Outbound dependencies)

use crate::domain::P2pResult;
use async_trait::async_trait;
use shared_types::{Leader, Peer, PeerId};

/// Known peers of the network.
pub trait PeerRepository: Send + Sync {
    /// Store a peer. Returns false when it was already known at that address.
    fn save(&self, peer: Peer) -> bool;

    fn remove(&self, id: &PeerId) -> Option<Peer>;

    fn find_by_id(&self, id: &PeerId) -> Option<Peer>;

    /// All peers, ordered by id.
    fn find_all(&self) -> Vec<Peer>;

    fn len(&self) -> usize;

    fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

/// The leader as this node knows it.
pub trait LeaderRepository: Send + Sync {
    fn get_leader(&self) -> Option<Leader>;

    fn set_leader(&self, leader: Leader);
}

/// Outbound leader/peer commands.
///
/// Every command is validated first, then published as a single deliver
/// command on `Command`/`message.deliver`.
#[async_trait]
pub trait CommandGateway: Send + Sync {
    async fn request_leader_info(&self, connection_id: &PeerId) -> P2pResult<()>;

    async fn deliver_leader_info(&self, connection_id: &PeerId, leader: &Leader) -> P2pResult<()>;

    async fn request_peer_list(&self, peer_id: &PeerId) -> P2pResult<()>;

    async fn deliver_peer_list(&self, connection_id: &PeerId, peers: &[Peer]) -> P2pResult<()>;
}
