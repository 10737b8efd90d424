//! Outbound (Driven) ports for the transaction pool.

use crate::domain::TxPoolResult;
use async_trait::async_trait;
use shared_types::{Leader, Transaction, TxId, TxStatus};

/// Transaction storage.
///
/// Concurrent saves and removes from the proposal path and the event
/// handlers must never lose an update.
pub trait TransactionRepository: Send + Sync {
    /// Add a transaction. Returns `Ok(false)` when the id is already present;
    /// a re-submission is not an error. An empty id is.
    fn save(&self, tx: Transaction) -> TxPoolResult<bool>;

    /// Delete one transaction. Returns whether it was present.
    fn remove(&self, id: &TxId) -> bool;

    fn find_by_id(&self, id: &TxId) -> Option<Transaction>;

    /// Every transaction, oldest first.
    fn find_all(&self) -> Vec<Transaction>;

    /// Transactions in `status`, oldest first.
    fn find_by_status(&self, status: TxStatus) -> Vec<Transaction>;

    fn update_status(&self, id: &TxId, status: TxStatus) -> TxPoolResult<()>;

    fn len(&self) -> usize;

    fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

/// The single current leader, replaced atomically.
pub trait LeaderRepository: Send + Sync {
    fn get_leader(&self) -> Option<Leader>;

    fn set_leader(&self, leader: Leader);
}

/// Hands batches to the block subsystem or to the leader.
#[async_trait]
pub trait TransactionDispatcher: Send + Sync {
    /// Ask the local block subsystem to build and propose a block.
    async fn propose_block(&self, transactions: Vec<Transaction>) -> TxPoolResult<()>;

    /// Forward transactions to the leader.
    async fn send_leader_transactions(
        &self,
        transactions: Vec<Transaction>,
        leader: &Leader,
    ) -> TxPoolResult<()>;
}
