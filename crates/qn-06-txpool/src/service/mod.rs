//! Proposal pipeline.
//!
//! Every tick the pool's queued transactions are either proposed as a block
//! (this node leads) or forwarded to the leader (another node leads). Either
//! way they move to `Proposed` until a block commit removes them or an
//! abandoned round returns them to `Queued`. A change of leader also returns
//! them to `Queued` so they reach the new leader.

mod handlers;
mod projector;

pub use handlers::TxEventHandler;
pub use projector::RepositoryProjector;

use crate::domain::{ProposalConfig, ProposalOutcome, TxPoolResult};
use crate::ports::{LeaderRepository, TransactionDispatcher, TransactionRepository};
use shared_types::{PeerId, Transaction, TxStatus};
use std::sync::Arc;
use tokio::sync::watch;
use tracing::{debug, info, warn};

/// Dependencies for ProposalService
pub struct ProposalDependencies {
    pub local_id: PeerId,
    pub transactions: Arc<dyn TransactionRepository>,
    pub leaders: Arc<dyn LeaderRepository>,
    pub dispatcher: Arc<dyn TransactionDispatcher>,
    pub config: ProposalConfig,
}

pub struct ProposalService {
    local_id: PeerId,
    transactions: Arc<dyn TransactionRepository>,
    leaders: Arc<dyn LeaderRepository>,
    dispatcher: Arc<dyn TransactionDispatcher>,
    config: ProposalConfig,
}

impl ProposalService {
    pub fn new(deps: ProposalDependencies) -> Self {
        Self {
            local_id: deps.local_id,
            transactions: deps.transactions,
            leaders: deps.leaders,
            dispatcher: deps.dispatcher,
            config: deps.config,
        }
    }

    /// One proposal attempt.
    pub async fn propose_once(&self) -> TxPoolResult<ProposalOutcome> {
        let mut batch = self.transactions.find_by_status(TxStatus::Queued);
        if batch.is_empty() {
            return Ok(ProposalOutcome::Idle);
        }
        batch.truncate(self.config.max_txs_per_block.max(1));

        let Some(leader) = self.leaders.get_leader() else {
            debug!("[qn-06] {} transactions waiting for a leader", batch.len());
            return Ok(ProposalOutcome::NoLeader);
        };

        // Proposed before dispatch: the commit may land before the call returns.
        self.mark(&batch, TxStatus::Proposed);
        let count = batch.len();

        let result = if leader.leader_id == self.local_id {
            self.dispatcher
                .propose_block(batch.clone())
                .await
                .map(|()| ProposalOutcome::Proposed(count))
        } else {
            self.dispatcher
                .send_leader_transactions(batch.clone(), &leader)
                .await
                .map(|()| ProposalOutcome::Forwarded(count))
        };

        match result {
            Ok(outcome) => {
                info!("[qn-06] {:?}", outcome);
                Ok(outcome)
            }
            Err(e) => {
                self.mark(&batch, TxStatus::Queued);
                Err(e)
            }
        }
    }

    /// Run `propose_once` every `interval` until shutdown.
    pub async fn run(self: Arc<Self>, mut shutdown: watch::Receiver<bool>) {
        let mut ticker = tokio::time::interval(self.config.interval);
        info!(
            "[qn-06] Proposal loop started (every {:?}, up to {} txs)",
            self.config.interval, self.config.max_txs_per_block
        );

        loop {
            tokio::select! {
                _ = ticker.tick() => {
                    if let Err(e) = self.propose_once().await {
                        warn!("[qn-06] Proposal failed: {}", e);
                    }
                }
                _ = shutdown.changed() => {
                    info!("[qn-06] Proposal loop stopped");
                    break;
                }
            }
        }
    }

    fn mark(&self, batch: &[Transaction], status: TxStatus) {
        for tx in batch {
            // A commit may already have removed it.
            let _ = self.transactions.update_status(&tx.id, status);
        }
    }
}
