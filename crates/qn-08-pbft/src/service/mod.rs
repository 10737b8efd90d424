//! Consensus Coordinator - drives the per-round state machine
//!
//! # Architecture
//! - One mutex serializes every round decision: membership check, vote save,
//!   quorum count and stage transition happen under it, and so does retiring
//!   a round. A vote arriving after retirement finds no round and is dropped.
//! - Broadcasts and block finalization run after the lock is released.
//! - Committed rounds are finalized in `(view, sequence)` order. A round that
//!   commits while an earlier round is still open waits until that round
//!   commits or is abandoned.
//! - Quorum: strictly more than two thirds of the committee (see
//!   [`crate::domain::quorum`]).

use crate::domain::{
    quorum_reached, Committee, ConsensusConfig, ConsensusError, ConsensusId, ConsensusMessage,
    ConsensusResult, ConsensusState, MessageHeader, Phase, Preprepare, SequenceId, Stage, Vote,
};
use crate::ports::{
    BlockFinalizer, ConsensusApi, ConsensusBroadcaster, SystemTimeSource, TimeSource,
    VoteRepository,
};
use async_trait::async_trait;
use parking_lot::Mutex;
use shared_types::{short_hash, Block, Leader, ReceivedMessage, ViewId};
use std::collections::{BTreeMap, HashMap, HashSet, VecDeque};
use std::sync::Arc;
use tokio::sync::watch;
use tracing::{debug, info, warn};

/// Retired round ids remembered to reject replayed proposals.
const RETIRED_ROUNDS_CAPACITY: usize = 1024;

/// Dependencies for ConsensusCoordinator
pub struct ConsensusDependencies {
    pub committee: Arc<Committee>,
    pub prepare_votes: Arc<dyn VoteRepository>,
    pub commit_votes: Arc<dyn VoteRepository>,
    pub broadcaster: Arc<dyn ConsensusBroadcaster>,
    pub finalizer: Arc<dyn BlockFinalizer>,
    pub config: ConsensusConfig,
}

/// Side effect decided under the lock, executed after it is released.
enum Action {
    Broadcast(ConsensusMessage),
    Finalize(Block),
    Abandon(Block),
}

/// Position of a round in the finalization order.
type RoundKey = (ViewId, SequenceId, ConsensusId);

#[derive(Default)]
struct Rounds {
    active: HashMap<ConsensusId, ConsensusState>,
    committed: BTreeMap<RoundKey, Block>,
    highest_sequence: HashMap<ViewId, SequenceId>,
    retired: HashSet<ConsensusId>,
    retired_order: VecDeque<ConsensusId>,
}

impl Rounds {
    fn next_sequence(&self, view: ViewId) -> SequenceId {
        self.highest_sequence.get(&view).map_or(0, |h| h + 1)
    }

    fn record_sequence(&mut self, view: ViewId, sequence: SequenceId) {
        let highest = self.highest_sequence.entry(view).or_insert(sequence);
        *highest = (*highest).max(sequence);
    }

    fn is_known(&self, id: &ConsensusId) -> bool {
        self.active.contains_key(id) || self.retired.contains(id)
    }

    /// Hold a committed block until every earlier open round is resolved.
    fn queue_committed(&mut self, state: ConsensusState) {
        self.committed
            .insert((state.view_id, state.sequence_id, state.id), state.block);
    }

    /// Pop committed blocks that no open round precedes, in order.
    fn release_committed(&mut self) -> Vec<Block> {
        let mut released = Vec::new();
        while let Some(entry) = self.committed.first_entry() {
            let (view, sequence, _) = entry.key();
            let blocked = self
                .active
                .values()
                .any(|open| (open.view_id, open.sequence_id) < (*view, *sequence));
            if blocked {
                break;
            }
            released.push(entry.remove());
        }
        released
    }

    fn mark_retired(&mut self, id: ConsensusId) {
        if self.retired.insert(id.clone()) {
            self.retired_order.push_back(id);
        }
        while self.retired_order.len() > RETIRED_ROUNDS_CAPACITY {
            if let Some(oldest) = self.retired_order.pop_front() {
                self.retired.remove(&oldest);
            }
        }
    }
}

/// Consensus Coordinator
pub struct ConsensusCoordinator {
    committee: Arc<Committee>,
    prepare_votes: Arc<dyn VoteRepository>,
    commit_votes: Arc<dyn VoteRepository>,
    broadcaster: Arc<dyn ConsensusBroadcaster>,
    finalizer: Arc<dyn BlockFinalizer>,
    config: ConsensusConfig,
    rounds: Mutex<Rounds>,
    time_source: Box<dyn TimeSource>,
}

impl ConsensusCoordinator {
    pub fn new(deps: ConsensusDependencies) -> Self {
        Self {
            committee: deps.committee,
            prepare_votes: deps.prepare_votes,
            commit_votes: deps.commit_votes,
            broadcaster: deps.broadcaster,
            finalizer: deps.finalizer,
            config: deps.config,
            rounds: Mutex::new(Rounds::default()),
            time_source: Box::new(SystemTimeSource),
        }
    }

    /// Set custom time source (for testing)
    pub fn with_time_source(mut self, time_source: Box<dyn TimeSource>) -> Self {
        self.time_source = time_source;
        self
    }

    pub fn committee(&self) -> &Arc<Committee> {
        &self.committee
    }

    pub fn config(&self) -> &ConsensusConfig {
        &self.config
    }

    /// Stage of an in-flight round. `None` once committed or abandoned.
    pub fn stage(&self, id: &ConsensusId) -> Option<Stage> {
        self.rounds.lock().active.get(id).map(|s| s.current_stage)
    }

    /// Snapshot of an in-flight round.
    pub fn round(&self, id: &ConsensusId) -> Option<ConsensusState> {
        self.rounds.lock().active.get(id).cloned()
    }

    pub fn active_rounds(&self) -> usize {
        self.rounds.lock().active.len()
    }

    /// Committed rounds waiting for an earlier round to resolve.
    pub fn pending_finalizations(&self) -> usize {
        self.rounds.lock().committed.len()
    }

    // === INBOUND ===

    /// Open a round for `block` as the current leader.
    pub async fn start_consensus(&self, block: Block) -> ConsensusResult<ConsensusId> {
        if !self.committee.is_local_leader() {
            return Err(ConsensusError::LocalNodeNotLeader);
        }
        if !block.verify_tx_root() {
            return Err(ConsensusError::MalformedBlock(
                "transaction root mismatch".to_string(),
            ));
        }

        let id = ConsensusId::generate();
        let view = self.committee.view_id();
        let height = block.height();
        let block_hash = block.hash();

        let mut actions = Vec::new();
        {
            let mut rounds = self.rounds.lock();
            let sequence = rounds.next_sequence(view);
            let preprepare = Preprepare {
                header: self.header(&id, view, sequence),
                block: block.clone(),
            };
            actions.push(Action::Broadcast(ConsensusMessage::Preprepare(preprepare)));
            self.open_round(&mut rounds, id.clone(), view, sequence, block, &mut actions)?;
        }

        info!(
            "[qn-08] Started round {} ({}, height {}, block {})",
            id,
            view,
            height,
            short_hash(&block_hash)
        );

        self.execute(actions).await?;
        Ok(id)
    }

    /// Process one message from a committee member.
    ///
    /// Returns the round's stage after processing, `None` if dropped.
    pub async fn handle_message(
        &self,
        message: ConsensusMessage,
    ) -> ConsensusResult<Option<Stage>> {
        if message.consensus_id().is_empty() {
            return Err(ConsensusError::EmptyConsensusId);
        }

        let sender = message.sender().clone();
        if sender == *self.committee.local_id() {
            debug!("[qn-08] Ignoring own {} echo", message.msg_type());
            return Ok(None);
        }
        if !self.committee.contains(&sender) {
            debug!(
                "[qn-08] Dropping {} from non-member {}",
                message.msg_type(),
                sender
            );
            return Ok(None);
        }

        let mut actions = Vec::new();
        let stage = {
            let mut rounds = self.rounds.lock();
            match message {
                ConsensusMessage::Preprepare(preprepare) => {
                    Some(self.accept_preprepare(&mut rounds, preprepare, &mut actions)?)
                }
                ConsensusMessage::Prepare(vote) => {
                    self.accept_vote(&mut rounds, Phase::Prepare, vote, &mut actions)?
                }
                ConsensusMessage::Commit(vote) => {
                    self.accept_vote(&mut rounds, Phase::Commit, vote, &mut actions)?
                }
            }
        };

        self.execute(actions).await?;
        Ok(stage)
    }

    /// Decode a message delivered by the peer transport and process it.
    ///
    /// The connection the message arrived on is the sole authority for the
    /// sender's identity.
    pub async fn handle_received(
        &self,
        received: &ReceivedMessage,
    ) -> ConsensusResult<Option<Stage>> {
        let message: ConsensusMessage = received
            .decode()
            .map_err(|e| ConsensusError::Decode(e.to_string()))?;

        if *message.sender() != received.sender {
            return Err(ConsensusError::SenderMismatch {
                claimed: message.sender().clone(),
                connection: received.sender.clone(),
            });
        }

        self.handle_message(message).await
    }

    /// Apply a leader rotation.
    ///
    /// In-flight rounds of earlier views keep running until they commit or
    /// time out.
    pub fn on_leader_changed(&self, leader: Leader) {
        let view = leader.view_id;
        let leader_id = leader.leader_id.clone();
        if !self.committee.set_leader(leader) {
            return;
        }

        self.rounds
            .lock()
            .highest_sequence
            .retain(|tracked, _| *tracked >= view);

        info!("[qn-08] Leader changed to {} ({})", leader_id, view);
    }

    // === TIMEOUTS ===

    /// Abandon every round open for at least the round timeout at `now`
    /// (unix milliseconds). Committed rounds queued behind them are
    /// finalized. Returns the abandoned round ids.
    pub async fn abandon_expired_rounds(&self, now: u64) -> Vec<ConsensusId> {
        let timeout_ms = self.config.round_timeout.as_millis() as u64;
        let mut actions = Vec::new();

        let expired: Vec<ConsensusId> = {
            let mut rounds = self.rounds.lock();
            let expired: Vec<ConsensusId> = rounds
                .active
                .values()
                .filter(|state| state.is_expired(now, timeout_ms))
                .map(|state| state.id.clone())
                .collect();

            for id in &expired {
                if let Some(state) = self.retire(&mut rounds, id) {
                    warn!(
                        "[qn-08] Abandoning round {} at stage {} (height {}, {} prepares, {} commits)",
                        id,
                        state.current_stage,
                        state.block.height(),
                        state.prepare_msgs.len(),
                        state.commit_msgs.len()
                    );
                    actions.push(Action::Abandon(state.block));
                }
            }
            actions.extend(rounds.release_committed().into_iter().map(Action::Finalize));
            expired
        };

        if let Err(e) = self.execute(actions).await {
            warn!(
                "[qn-08] Timeout sweep over {} round(s) incomplete: {}",
                expired.len(),
                e
            );
        }
        expired
    }

    /// Sweep expired rounds every `sweep_interval` until shutdown.
    pub async fn run_timeout_loop(self: Arc<Self>, mut shutdown: watch::Receiver<bool>) {
        let mut ticker = tokio::time::interval(self.config.sweep_interval);
        info!(
            "[qn-08] Round timeout loop started (timeout {:?}, sweep {:?})",
            self.config.round_timeout, self.config.sweep_interval
        );

        loop {
            tokio::select! {
                _ = ticker.tick() => {
                    let now = self.time_source.now();
                    self.abandon_expired_rounds(now).await;
                }
                _ = shutdown.changed() => {
                    info!("[qn-08] Round timeout loop stopped");
                    break;
                }
            }
        }
    }

    // === STATE MACHINE ===

    fn header(&self, id: &ConsensusId, view: ViewId, sequence: SequenceId) -> MessageHeader {
        MessageHeader {
            consensus_id: id.clone(),
            view_id: view,
            sequence_id: sequence,
            sender_id: self.committee.local_id().clone(),
            timestamp: self.time_source.now(),
        }
    }

    fn accept_preprepare(
        &self,
        rounds: &mut Rounds,
        preprepare: Preprepare,
        actions: &mut Vec<Action>,
    ) -> ConsensusResult<Stage> {
        let Preprepare { header, block } = preprepare;
        let leader = self.committee.leader();

        if header.sender_id != leader.leader_id {
            return Err(ConsensusError::NotLeader {
                expected: leader.leader_id,
                actual: header.sender_id,
            });
        }
        if header.view_id != leader.view_id {
            return Err(ConsensusError::ViewMismatch {
                expected: leader.view_id,
                actual: header.view_id,
            });
        }
        if let Some(&highest) = rounds.highest_sequence.get(&header.view_id) {
            if header.sequence_id < highest {
                return Err(ConsensusError::StaleSequence {
                    view: header.view_id,
                    highest,
                    got: header.sequence_id,
                });
            }
        }
        if rounds.is_known(&header.consensus_id) {
            return Err(ConsensusError::DuplicateRound(header.consensus_id));
        }
        if !block.verify_tx_root() {
            return Err(ConsensusError::MalformedBlock(
                "transaction root mismatch".to_string(),
            ));
        }

        debug!(
            "[qn-08] Accepted preprepare {} from {} (seq {}, height {})",
            header.consensus_id,
            header.sender_id,
            header.sequence_id,
            block.height()
        );

        let id = header.consensus_id;
        self.open_round(rounds, id.clone(), header.view_id, header.sequence_id, block, actions)
    }

    /// Create the round at PrePrepared, cast and broadcast the local Prepare.
    fn open_round(
        &self,
        rounds: &mut Rounds,
        id: ConsensusId,
        view: ViewId,
        sequence: SequenceId,
        block: Block,
        actions: &mut Vec<Action>,
    ) -> ConsensusResult<Stage> {
        let mut state = ConsensusState::new(id.clone(), view, sequence, block, self.time_source.now());
        state.pre_prepare()?;

        let vote = Vote {
            header: self.header(&id, view, sequence),
            block_hash: state.block_hash(),
        };
        if self.prepare_votes.save(vote.clone()) {
            state.prepare_msgs.push(vote.clone());
        }

        rounds.active.insert(id.clone(), state);
        rounds.record_sequence(view, sequence);
        actions.push(Action::Broadcast(ConsensusMessage::Prepare(vote)));

        self.advance(rounds, &id, actions)
    }

    fn accept_vote(
        &self,
        rounds: &mut Rounds,
        phase: Phase,
        vote: Vote,
        actions: &mut Vec<Action>,
    ) -> ConsensusResult<Option<Stage>> {
        let id = vote.consensus_id().clone();
        let Some(state) = rounds.active.get_mut(&id) else {
            debug!("[qn-08] Dropping stray {:?} vote for round {}", phase, id);
            return Ok(None);
        };

        if vote.header.view_id != state.view_id || vote.block_hash != state.block_hash() {
            debug!(
                "[qn-08] Dropping {:?} vote from {} for round {}: view or block mismatch",
                phase,
                vote.sender(),
                id
            );
            return Ok(None);
        }

        let (repository, audit) = match phase {
            Phase::Prepare => (&self.prepare_votes, &mut state.prepare_msgs),
            Phase::Commit => (&self.commit_votes, &mut state.commit_msgs),
        };
        if repository.save(vote.clone()) {
            audit.push(vote);
        }

        self.advance(rounds, &id, actions).map(Some)
    }

    /// Re-evaluate quorum for a round and apply every transition it allows.
    fn advance(
        &self,
        rounds: &mut Rounds,
        id: &ConsensusId,
        actions: &mut Vec<Action>,
    ) -> ConsensusResult<Stage> {
        let committee_size = self.committee.size();
        let (stage, view, sequence) = {
            let Some(state) = rounds.active.get_mut(id) else {
                return Ok(Stage::Idle);
            };

            if state.current_stage == Stage::PrePrepared
                && quorum_reached(self.prepare_votes.count(id), committee_size)
            {
                state.prepare()?;
                info!(
                    "[qn-08] Round {} prepared ({}/{} prepares)",
                    id,
                    self.prepare_votes.count(id),
                    committee_size
                );

                let vote = Vote {
                    header: self.header(id, state.view_id, state.sequence_id),
                    block_hash: state.block_hash(),
                };
                if self.commit_votes.save(vote.clone()) {
                    state.commit_msgs.push(vote.clone());
                }
                actions.push(Action::Broadcast(ConsensusMessage::Commit(vote)));
            }

            if state.current_stage == Stage::Prepared
                && quorum_reached(self.commit_votes.count(id), committee_size)
            {
                state.commit()?;
                info!(
                    "[qn-08] Round {} committed block {} at height {}",
                    id,
                    short_hash(&state.block_hash()),
                    state.block.height()
                );
            }

            (state.current_stage, state.view_id, state.sequence_id)
        };

        if stage == Stage::Committed {
            if let Some(state) = self.retire(rounds, id) {
                rounds.queue_committed(state);
            }
            let released = rounds.release_committed();
            if rounds.committed.contains_key(&(view, sequence, id.clone())) {
                debug!(
                    "[qn-08] Round {} (seq {}) waits for earlier rounds before finalizing",
                    id, sequence
                );
            }
            actions.extend(released.into_iter().map(Action::Finalize));
        }
        Ok(stage)
    }

    /// Evict a round and purge its votes.
    fn retire(&self, rounds: &mut Rounds, id: &ConsensusId) -> Option<ConsensusState> {
        let state = rounds.active.remove(id)?;
        self.prepare_votes.remove(id);
        self.commit_votes.remove(id);
        rounds.mark_retired(id.clone());
        Some(state)
    }

    /// Run the side effects in order; report the first failure.
    async fn execute(&self, actions: Vec<Action>) -> ConsensusResult<()> {
        let mut first_error = None;

        for action in actions {
            let result = match action {
                Action::Broadcast(message) => self
                    .broadcaster
                    .broadcast(message)
                    .await
                    .map_err(ConsensusError::Broadcast),
                Action::Finalize(block) => self
                    .finalizer
                    .finalize(block)
                    .await
                    .map_err(ConsensusError::Finalization),
                Action::Abandon(block) => self
                    .finalizer
                    .abandon(block)
                    .await
                    .map_err(ConsensusError::Finalization),
            };

            if let Err(e) = result {
                warn!("[qn-08] {}", e);
                first_error.get_or_insert(e);
            }
        }

        first_error.map_or(Ok(()), Err)
    }
}

#[async_trait]
impl ConsensusApi for ConsensusCoordinator {
    async fn start_consensus(&self, block: Block) -> ConsensusResult<ConsensusId> {
        ConsensusCoordinator::start_consensus(self, block).await
    }

    async fn handle_message(&self, message: ConsensusMessage) -> ConsensusResult<Option<Stage>> {
        ConsensusCoordinator::handle_message(self, message).await
    }

    fn on_leader_changed(&self, leader: Leader) {
        ConsensusCoordinator::on_leader_changed(self, leader);
    }
}
