//! Transaction pool handler.

use std::sync::Arc;

use anyhow::{Context, Result};
use tracing::{info, warn};

use qn_06_txpool::{RepositoryProjector, TxEventHandler};
use shared_bus::{topics, BusPayload, Envelope, InMemoryBus, Subscription};
use shared_types::{protocols, Transaction};

use super::topics_filter;

pub struct TxPoolHandler {
    subscription: Subscription,
    projector: Arc<RepositoryProjector>,
    events: Arc<TxEventHandler>,
}

impl TxPoolHandler {
    /// Subscribe on `bus`. Envelopes published after this call are seen.
    pub fn new(
        bus: &InMemoryBus,
        projector: Arc<RepositoryProjector>,
        events: Arc<TxEventHandler>,
    ) -> Self {
        let subscription = bus.subscribe_filter(topics_filter(&[
            topics::TX_CREATED,
            topics::TX_DELETED,
            topics::LEADER_CHANGED,
            topics::BLOCK_COMMITTED,
            topics::BLOCK_ABANDONED,
            topics::MESSAGE_RECEIVE,
        ]));
        Self {
            subscription,
            projector,
            events,
        }
    }

    /// Run the handler loop.
    pub async fn run(mut self) {
        info!("[qn-06] Transaction pool handler started");

        while let Some(envelope) = self.subscription.recv().await {
            if let Err(e) = self.handle(envelope) {
                warn!("[qn-06] {:#}", e);
            }
        }

        info!("[qn-06] Transaction pool handler stopped");
    }

    fn handle(&self, envelope: Envelope) -> Result<()> {
        match envelope.payload {
            BusPayload::TxCreated(event) => {
                self.projector
                    .handle_tx_created(&event)
                    .context("Rejected tx.created")?;
            }
            BusPayload::TxDeleted(event) => {
                self.projector
                    .handle_tx_deleted(&event)
                    .context("Rejected tx.deleted")?;
            }
            BusPayload::LeaderChanged(event) => {
                self.projector
                    .handle_leader_changed(&event)
                    .context("Rejected leader.changed")?;
            }
            BusPayload::BlockCommitted(event) => {
                self.events
                    .handle_block_committed(&event)
                    .context("Rejected block.committed")?;
            }
            BusPayload::BlockAbandoned(event) => {
                self.events
                    .handle_block_abandoned(&event)
                    .context("Rejected block.abandoned")?;
            }
            BusPayload::Receive(message) if message.protocol == protocols::LEADER_TRANSACTIONS => {
                let transactions: Vec<Transaction> = message
                    .decode()
                    .with_context(|| format!("Malformed transactions from {}", message.sender))?;
                self.projector
                    .handle_leader_transactions(transactions)
                    .context("Rejected forwarded transactions")?;
            }
            _ => {}
        }
        Ok(())
    }
}
