//! Block lifecycle event handling for the pool.

use crate::domain::{TxPoolError, TxPoolResult};
use crate::ports::TransactionRepository;
use shared_types::{BlockAbandonedEvent, BlockCommittedEvent, TxStatus};
use std::sync::Arc;
use tracing::{debug, info};

pub struct TxEventHandler {
    transactions: Arc<dyn TransactionRepository>,
}

impl TxEventHandler {
    pub fn new(transactions: Arc<dyn TransactionRepository>) -> Self {
        Self { transactions }
    }

    /// Remove every transaction included in the committed block.
    ///
    /// Returns how many were present.
    pub fn handle_block_committed(&self, event: &BlockCommittedEvent) -> TxPoolResult<usize> {
        if event.id.trim().is_empty() {
            return Err(TxPoolError::NoEventId);
        }

        let removed = event
            .tx_ids
            .iter()
            .filter(|id| self.transactions.remove(id))
            .count();

        info!(
            "[qn-06] Block {} at height {} committed, removed {}/{} transactions",
            event.id.chars().take(8).collect::<String>(),
            event.height,
            removed,
            event.tx_ids.len()
        );
        Ok(removed)
    }

    /// Return the abandoned block's transactions to the queue.
    pub fn handle_block_abandoned(&self, event: &BlockAbandonedEvent) -> TxPoolResult<usize> {
        if event.id.trim().is_empty() {
            return Err(TxPoolError::NoEventId);
        }

        let requeued = event
            .tx_ids
            .iter()
            .filter(|id| self.transactions.update_status(id, TxStatus::Queued).is_ok())
            .count();

        debug!(
            "[qn-06] Block at height {} abandoned, requeued {} transactions",
            event.height, requeued
        );
        Ok(requeued)
    }
}
