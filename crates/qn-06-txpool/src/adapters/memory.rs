//! In-memory repositories guarded by reader/writer locks.

use crate::domain::{TxPoolError, TxPoolResult};
use crate::ports::{LeaderRepository, TransactionRepository};
use parking_lot::RwLock;
use shared_types::{Leader, Transaction, TxId, TxStatus};
use std::collections::HashMap;

/// Transaction pool keyed by id.
#[derive(Default)]
pub struct InMemoryTransactionRepository {
    transactions: RwLock<HashMap<TxId, Transaction>>,
}

impl InMemoryTransactionRepository {
    pub fn new() -> Self {
        Self::default()
    }
}

fn oldest_first(mut txs: Vec<Transaction>) -> Vec<Transaction> {
    txs.sort_by(|a, b| a.timestamp.cmp(&b.timestamp).then_with(|| a.id.cmp(&b.id)));
    txs
}

impl TransactionRepository for InMemoryTransactionRepository {
    fn save(&self, tx: Transaction) -> TxPoolResult<bool> {
        if tx.id.is_empty() {
            return Err(TxPoolError::EmptyTransactionId);
        }
        let mut transactions = self.transactions.write();
        if transactions.contains_key(&tx.id) {
            return Ok(false);
        }
        transactions.insert(tx.id.clone(), tx);
        Ok(true)
    }

    fn remove(&self, id: &TxId) -> bool {
        self.transactions.write().remove(id).is_some()
    }

    fn find_by_id(&self, id: &TxId) -> Option<Transaction> {
        self.transactions.read().get(id).cloned()
    }

    fn find_all(&self) -> Vec<Transaction> {
        oldest_first(self.transactions.read().values().cloned().collect())
    }

    fn find_by_status(&self, status: TxStatus) -> Vec<Transaction> {
        oldest_first(
            self.transactions
                .read()
                .values()
                .filter(|tx| tx.status == status)
                .cloned()
                .collect(),
        )
    }

    fn update_status(&self, id: &TxId, status: TxStatus) -> TxPoolResult<()> {
        let mut transactions = self.transactions.write();
        let tx = transactions
            .get_mut(id)
            .ok_or_else(|| TxPoolError::TransactionNotFound(id.clone()))?;
        tx.status = status;
        Ok(())
    }

    fn len(&self) -> usize {
        self.transactions.read().len()
    }
}

/// Current leader slot.
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
