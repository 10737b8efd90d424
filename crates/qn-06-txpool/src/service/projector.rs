//! Projects transaction and leader events onto the repositories.

use crate::domain::{TxPoolError, TxPoolResult};
use crate::ports::{LeaderRepository, TransactionRepository};
use shared_types::{
    LeaderChangedEvent, Transaction, TxCreatedEvent, TxDeletedEvent, TxId, TxStatus,
};
use std::sync::Arc;
use tracing::{debug, info};

pub struct RepositoryProjector {
    transactions: Arc<dyn TransactionRepository>,
    leaders: Arc<dyn LeaderRepository>,
}

impl RepositoryProjector {
    pub fn new(
        transactions: Arc<dyn TransactionRepository>,
        leaders: Arc<dyn LeaderRepository>,
    ) -> Self {
        Self {
            transactions,
            leaders,
        }
    }

    pub fn handle_tx_created(&self, event: &TxCreatedEvent) -> TxPoolResult<()> {
        if event.id.trim().is_empty() {
            return Err(TxPoolError::NoEventId);
        }
        if self.transactions.save(event.transaction())? {
            debug!("[qn-06] Queued transaction {}", event.id);
        }
        Ok(())
    }

    pub fn handle_tx_deleted(&self, event: &TxDeletedEvent) -> TxPoolResult<()> {
        if event.id.trim().is_empty() {
            return Err(TxPoolError::NoEventId);
        }
        self.transactions.remove(&TxId::new(event.id.clone()));
        Ok(())
    }

    pub fn handle_leader_changed(&self, event: &LeaderChangedEvent) -> TxPoolResult<()> {
        if event.id.trim().is_empty() {
            return Err(TxPoolError::NoEventId);
        }
        let leader = event.leader();
        info!(
            "[qn-06] Leader is now {} ({})",
            leader.leader_id, leader.view_id
        );
        let changed = self
            .leaders
            .get_leader()
            .map_or(false, |previous| previous.leader_id != leader.leader_id);
        self.leaders.set_leader(leader);
        if changed {
            self.requeue_proposed()?;
        }
        Ok(())
    }

    /// Proposed transactions were handed to the old leader, which may never
    /// turn them into a block. Queue them again for the new one.
    fn requeue_proposed(&self) -> TxPoolResult<usize> {
        let proposed = self.transactions.find_by_status(TxStatus::Proposed);
        for tx in &proposed {
            self.transactions.update_status(&tx.id, TxStatus::Queued)?;
        }
        if !proposed.is_empty() {
            info!(
                "[qn-06] Requeued {} proposed transactions after leader change",
                proposed.len()
            );
        }
        Ok(proposed.len())
    }

    /// Queue transactions forwarded by other nodes to this leader.
    ///
    /// Returns how many were new.
    pub fn handle_leader_transactions(&self, transactions: Vec<Transaction>) -> TxPoolResult<usize> {
        let mut added = 0;
        for mut tx in transactions {
            tx.status = TxStatus::Queued;
            if self.transactions.save(tx)? {
                added += 1;
            }
        }
        debug!("[qn-06] Accepted {} forwarded transactions", added);
        Ok(added)
    }
}
