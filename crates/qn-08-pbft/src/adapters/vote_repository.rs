//! In-memory vote pool guarded by a reader/writer lock.

use crate::domain::{ConsensusId, Vote};
use crate::ports::VoteRepository;
use parking_lot::RwLock;
use std::collections::HashMap;

/// `ConsensusId → votes` map. One instance per phase.
#[derive(Default)]
pub struct InMemoryVoteRepository {
    votes: RwLock<HashMap<ConsensusId, Vec<Vote>>>,
}

impl InMemoryVoteRepository {
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of rounds with at least one vote.
    pub fn round_count(&self) -> usize {
        self.votes.read().len()
    }
}

impl VoteRepository for InMemoryVoteRepository {
    fn save(&self, vote: Vote) -> bool {
        let mut votes = self.votes.write();
        let round = votes.entry(vote.consensus_id().clone()).or_default();
        if round.iter().any(|v| v.sender() == vote.sender()) {
            return false;
        }
        round.push(vote);
        true
    }

    fn find_by_consensus_id(&self, id: &ConsensusId) -> Vec<Vote> {
        self.votes.read().get(id).cloned().unwrap_or_default()
    }

    fn count(&self, id: &ConsensusId) -> usize {
        self.votes.read().get(id).map_or(0, Vec::len)
    }

    fn remove(&self, id: &ConsensusId) {
        self.votes.write().remove(id);
    }
}
