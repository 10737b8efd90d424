//! Message dispatcher.
//!
//! Proposals go to the local block subsystem through the `block.propose`
//! RPC; forwards go to the leader as a deliver command on
//! `Command`/`message.deliver`. Empty batches are refused before either.

use crate::domain::{TxPoolError, TxPoolResult};
use crate::ports::TransactionDispatcher;
use async_trait::async_trait;
use shared_bus::{exchanges, methods, topics, BusPayload, MessagePublisher, RpcClient};
use shared_types::{protocols, DeliverCommand, Leader, ProposeBlockCommand, Transaction};
use std::sync::Arc;
use tracing::debug;

pub struct MessageDispatcher {
    rpc: Arc<dyn RpcClient>,
    publisher: Arc<dyn MessagePublisher>,
}

impl MessageDispatcher {
    pub fn new(rpc: Arc<dyn RpcClient>, publisher: Arc<dyn MessagePublisher>) -> Self {
        Self { rpc, publisher }
    }
}

#[async_trait]
impl TransactionDispatcher for MessageDispatcher {
    async fn propose_block(&self, transactions: Vec<Transaction>) -> TxPoolResult<()> {
        if transactions.is_empty() {
            return Err(TxPoolError::EmptyTransactionList);
        }

        let count = transactions.len();
        let request = serde_json::to_value(ProposeBlockCommand { transactions })
            .map_err(|e| TxPoolError::Serialization(e.to_string()))?;

        self.rpc
            .call(methods::BLOCK_PROPOSE, request)
            .await
            .map_err(|e| TxPoolError::Transport(e.to_string()))?;

        debug!("[qn-06] Proposed block with {} transactions", count);
        Ok(())
    }

    async fn send_leader_transactions(
        &self,
        transactions: Vec<Transaction>,
        leader: &Leader,
    ) -> TxPoolResult<()> {
        if transactions.is_empty() {
            return Err(TxPoolError::EmptyTransactionList);
        }
        if leader.leader_id.is_empty() {
            return Err(TxPoolError::NoLeader);
        }

        let count = transactions.len();
        let command = DeliverCommand::json(
            vec![leader.leader_id.clone()],
            protocols::LEADER_TRANSACTIONS,
            &transactions,
        )
        .map_err(|e| TxPoolError::Serialization(e.to_string()))?;

        self.publisher
            .publish(
                exchanges::COMMAND,
                topics::MESSAGE_DELIVER,
                BusPayload::Deliver(command),
            )
            .await
            .map_err(|e| TxPoolError::Transport(e.to_string()))?;

        debug!(
            "[qn-06] Forwarded {} transactions to leader {}",
            count, leader.leader_id
        );
        Ok(())
    }
}
