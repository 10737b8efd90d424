//! In-memory repositories.

use crate::ports::{LeaderRepository, PeerRepository};
use parking_lot::RwLock;
use shared_types::{Leader, Peer, PeerId};
use std::collections::BTreeMap;

#[derive(Default)]
pub struct InMemoryPeerRepository {
    peers: RwLock<BTreeMap<PeerId, Peer>>,
}

impl InMemoryPeerRepository {
    pub fn new() -> Self {
        Self::default()
    }
}

impl PeerRepository for InMemoryPeerRepository {
    fn save(&self, peer: Peer) -> bool {
        let mut peers = self.peers.write();
        if peers.get(&peer.peer_id) == Some(&peer) {
            return false;
        }
        peers.insert(peer.peer_id.clone(), peer);
        true
    }

    fn remove(&self, id: &PeerId) -> Option<Peer> {
        self.peers.write().remove(id)
    }

    fn find_by_id(&self, id: &PeerId) -> Option<Peer> {
        self.peers.read().get(id).cloned()
    }

    fn find_all(&self) -> Vec<Peer> {
        self.peers.read().values().cloned().collect()
    }

    fn len(&self) -> usize {
        self.peers.read().len()
    }
}

#[derive(Default)]
pub struct InMemoryLeaderRepository {
    leader: RwLock<Option<Leader>>,
}

impl InMemoryLeaderRepository {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_leader(leader: Leader) -> Self {
        Self {
            leader: RwLock::new(Some(leader)),
        }
    }
}

impl LeaderRepository for InMemoryLeaderRepository {
    fn get_leader(&self) -> Option<Leader> {
        self.leader.read().clone()
    }

    fn set_leader(&self, leader: Leader) {
        *self.leader.write() = Some(leader);
    }
}
