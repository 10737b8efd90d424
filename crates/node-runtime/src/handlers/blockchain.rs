//! Blockchain handler.

use std::sync::Arc;

use tracing::{info, warn};

use qn_02_blockchain::ConnectionEventHandler;
use shared_bus::{exchanges, topics, BusPayload, InMemoryBus, Subscription};

pub struct BlockchainHandler {
    subscription: Subscription,
    connections: Arc<ConnectionEventHandler>,
}

impl BlockchainHandler {
    pub fn new(bus: &InMemoryBus, connections: Arc<ConnectionEventHandler>) -> Self {
        Self {
            subscription: bus.subscribe(exchanges::EVENT, topics::CONNECTION_SAVED),
            connections,
        }
    }

    /// Run the handler loop.
    pub async fn run(mut self) {
        info!("[qn-02] Blockchain handler started");

        while let Some(envelope) = self.subscription.recv().await {
            if let BusPayload::ConnectionSaved(event) = envelope.payload {
                if let Err(e) = self.connections.handle_connection_saved(&event) {
                    warn!("[qn-02] Rejected connection.saved: {}", e);
                }
            }
        }

        info!("[qn-02] Blockchain handler stopped");
    }
}
