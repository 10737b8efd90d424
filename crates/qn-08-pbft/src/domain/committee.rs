//! Committee: the peers voting in the current view, and who leads it.

use parking_lot::RwLock;
use shared_types::{Leader, PeerId, ViewId};
use std::collections::BTreeSet;

#[derive(Debug, Clone)]
struct CommitteeView {
    leader: Leader,
    members: BTreeSet<PeerId>,
}

/// Process-scoped committee state.
///
/// Shared by `Arc` between the coordinator and whatever reacts to leader
/// rotation. The local node is always a member.
#[derive(Debug)]
pub struct Committee {
    local_id: PeerId,
    view: RwLock<CommitteeView>,
}

impl Committee {
    pub fn new(local_id: PeerId, members: impl IntoIterator<Item = PeerId>, leader: Leader) -> Self {
        let mut members: BTreeSet<PeerId> = members.into_iter().filter(|m| !m.is_empty()).collect();
        members.insert(local_id.clone());
        Self {
            local_id,
            view: RwLock::new(CommitteeView { leader, members }),
        }
    }

    /// Committee of one: the local node leads view 0.
    pub fn solo(local_id: PeerId) -> Self {
        let leader = Leader {
            leader_id: local_id.clone(),
            view_id: ViewId::default(),
        };
        Self::new(local_id, std::iter::empty(), leader)
    }

    pub fn local_id(&self) -> &PeerId {
        &self.local_id
    }

    pub fn leader(&self) -> Leader {
        self.view.read().leader.clone()
    }

    pub fn view_id(&self) -> ViewId {
        self.view.read().leader.view_id
    }

    pub fn is_leader(&self, peer: &PeerId) -> bool {
        self.view.read().leader.leader_id == *peer
    }

    pub fn is_local_leader(&self) -> bool {
        self.is_leader(&self.local_id)
    }

    pub fn contains(&self, peer: &PeerId) -> bool {
        self.view.read().members.contains(peer)
    }

    pub fn size(&self) -> usize {
        self.view.read().members.len()
    }

    pub fn members(&self) -> Vec<PeerId> {
        self.view.read().members.iter().cloned().collect()
    }

    /// Members other than the local node.
    pub fn peers(&self) -> Vec<PeerId> {
        self.view
            .read()
            .members
            .iter()
            .filter(|m| **m != self.local_id)
            .cloned()
            .collect()
    }

    /// Replace the leader. Returns false when `leader` is already current.
    pub fn set_leader(&self, leader: Leader) -> bool {
        let mut view = self.view.write();
        if view.leader == leader {
            return false;
        }
        if !leader.leader_id.is_empty() {
            view.members.insert(leader.leader_id.clone());
        }
        view.leader = leader;
        true
    }
}
