//! Consensus handler.

use std::sync::Arc;

use tracing::{debug, info, warn};

use qn_08_pbft::ConsensusCoordinator;
use shared_bus::{topics, BusPayload, Envelope, InMemoryBus, Subscription};
use shared_types::protocols;

use super::topics_filter;

pub struct ConsensusHandler {
    subscription: Subscription,
    coordinator: Arc<ConsensusCoordinator>,
}

impl ConsensusHandler {
    pub fn new(bus: &InMemoryBus, coordinator: Arc<ConsensusCoordinator>) -> Self {
        Self {
            subscription: bus.subscribe_filter(topics_filter(&[
                topics::LEADER_CHANGED,
                topics::MESSAGE_RECEIVE,
            ])),
            coordinator,
        }
    }

    /// Run the handler loop.
    pub async fn run(mut self) {
        info!("[qn-08] Consensus handler started");

        while let Some(envelope) = self.subscription.recv().await {
            self.handle(envelope).await;
        }

        info!("[qn-08] Consensus handler stopped");
    }

    async fn handle(&self, envelope: Envelope) {
        match envelope.payload {
            BusPayload::LeaderChanged(event) => {
                if event.id.trim().is_empty() {
                    warn!("[qn-08] Ignoring leader.changed without leader id");
                    return;
                }
                self.coordinator.on_leader_changed(event.leader());
            }
            BusPayload::Receive(message) if message.protocol == protocols::CONSENSUS_MESSAGE => {
                match self.coordinator.handle_received(&message).await {
                    Ok(Some(stage)) => {
                        debug!("[qn-08] Message from {} → {}", message.sender, stage)
                    }
                    Ok(None) => {}
                    Err(e) => warn!("[qn-08] Rejected message from {}: {}", message.sender, e),
                }
            }
            _ => {}
        }
    }
}
