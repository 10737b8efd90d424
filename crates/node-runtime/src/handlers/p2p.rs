//! P2P handler.

use std::sync::Arc;

use tracing::{debug, info, warn};

use qn_01_p2p::{CommandOutcome, P2pEventHandler, PeerCommandHandler};
use shared_bus::{topics, BusPayload, Envelope, InMemoryBus, Subscription};
use shared_types::protocols;

use super::topics_filter;

/// Protocols consumed by other handlers.
const ROUTED_ELSEWHERE: [&str; 2] = [
    protocols::CONSENSUS_MESSAGE,
    protocols::LEADER_TRANSACTIONS,
];

pub struct P2pHandler {
    subscription: Subscription,
    commands: Arc<PeerCommandHandler>,
    events: Arc<P2pEventHandler>,
}

impl P2pHandler {
    pub fn new(
        bus: &InMemoryBus,
        commands: Arc<PeerCommandHandler>,
        events: Arc<P2pEventHandler>,
    ) -> Self {
        Self {
            subscription: bus.subscribe_filter(topics_filter(&[
                topics::CONNECTION_SAVED,
                topics::LEADER_CHANGED,
                topics::MESSAGE_RECEIVE,
            ])),
            commands,
            events,
        }
    }

    /// Run the handler loop.
    pub async fn run(mut self) {
        info!("[qn-01] P2P handler started");

        while let Some(envelope) = self.subscription.recv().await {
            self.handle(envelope).await;
        }

        info!("[qn-01] P2P handler stopped");
    }

    async fn handle(&self, envelope: Envelope) {
        match envelope.payload {
            BusPayload::ConnectionSaved(event) => {
                if let Err(e) = self.events.handle_connection_saved(&event).await {
                    warn!("[qn-01] Rejected connection.saved: {}", e);
                }
            }
            BusPayload::LeaderChanged(event) => {
                if let Err(e) = self.events.handle_leader_changed(&event) {
                    warn!("[qn-01] Rejected leader.changed: {}", e);
                }
            }
            BusPayload::Receive(message)
                if !ROUTED_ELSEWHERE.contains(&message.protocol.as_str()) =>
            {
                match self.commands.handle(&message).await {
                    Ok(CommandOutcome::Ignored) => {}
                    Ok(outcome) => debug!(
                        "[qn-01] {} from {}: {:?}",
                        message.protocol, message.sender, outcome
                    ),
                    Err(e) => warn!(
                        "[qn-01] Rejected {} from {}: {}",
                        message.protocol, message.sender, e
                    ),
                }
            }
            _ => {}
        }
    }
}
