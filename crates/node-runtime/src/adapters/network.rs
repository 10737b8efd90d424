//! # In-Process Peer Network
//!
//! Connects the buses of several nodes running in one process. Every
//! `DeliverCommand` a node publishes on `Command`/`message.deliver` is handed
//! to each recipient's bus as a `ReceivedMessage` on `Command`/`message.receive`,
//! stamped with the sending node's id.
//!
//! ```text
//! node A bus ──message.deliver──→ LocalNetwork ──message.receive──→ node B bus
//! ```
//!
//! Attaching a node also announces the connection to both sides through
//! `connection.saved`.

use parking_lot::RwLock;
use shared_bus::{exchanges, topics, BusError, BusPayload, InMemoryBus, MessagePublisher};
use shared_types::{ConnectionSavedEvent, DeliverCommand, PeerId, ReceivedMessage};
use std::collections::HashMap;
use std::sync::Arc;
use tokio::task::JoinHandle;
use tracing::{debug, info, warn};

struct Endpoint {
    address: String,
    bus: Arc<InMemoryBus>,
    forwarder: JoinHandle<()>,
}

#[derive(Default)]
pub struct LocalNetwork {
    endpoints: RwLock<HashMap<PeerId, Endpoint>>,
}

impl LocalNetwork {
    pub fn new() -> Arc<Self> {
        Arc::new(Self::default())
    }

    /// Connect `bus` as `peer_id` and start forwarding its outbound commands.
    pub async fn attach(
        self: &Arc<Self>,
        peer_id: PeerId,
        address: impl Into<String>,
        bus: Arc<InMemoryBus>,
    ) -> Result<(), BusError> {
        let address = address.into();
        let mut outbound = bus.subscribe(exchanges::COMMAND, topics::MESSAGE_DELIVER);

        let network = Arc::downgrade(self);
        let sender = peer_id.clone();
        let forwarder = tokio::spawn(async move {
            while let Some(envelope) = outbound.recv().await {
                let BusPayload::Deliver(command) = envelope.payload else {
                    continue;
                };
                let Some(network) = network.upgrade() else {
                    break;
                };
                network.forward(&sender, command).await;
            }
        });

        let existing: Vec<(PeerId, String, Arc<InMemoryBus>)> = {
            let mut endpoints = self.endpoints.write();
            let existing = endpoints
                .iter()
                .filter(|(id, _)| **id != peer_id)
                .map(|(id, e)| (id.clone(), e.address.clone(), e.bus.clone()))
                .collect();
            if let Some(previous) = endpoints.insert(
                peer_id.clone(),
                Endpoint {
                    address: address.clone(),
                    bus: bus.clone(),
                    forwarder,
                },
            ) {
                previous.forwarder.abort();
            }
            existing
        };

        info!(
            "🔌 {} attached to local network ({} peers)",
            peer_id,
            existing.len()
        );

        for (other_id, other_address, other_bus) in existing {
            announce(&other_bus, &peer_id, &address).await?;
            announce(&bus, &other_id, &other_address).await?;
        }
        Ok(())
    }

    /// Disconnect `peer_id`. Traffic addressed to it is dropped afterwards.
    pub fn detach(&self, peer_id: &PeerId) -> bool {
        match self.endpoints.write().remove(peer_id) {
            Some(endpoint) => {
                endpoint.forwarder.abort();
                info!("{} detached from local network", peer_id);
                true
            }
            None => false,
        }
    }

    pub fn len(&self) -> usize {
        self.endpoints.read().len()
    }

    pub fn is_empty(&self) -> bool {
        self.endpoints.read().is_empty()
    }

    async fn forward(&self, sender: &PeerId, command: DeliverCommand) {
        let targets: Vec<(PeerId, Arc<InMemoryBus>)> = {
            let endpoints = self.endpoints.read();
            command
                .recipients
                .iter()
                .filter_map(|id| match endpoints.get(id) {
                    Some(endpoint) => Some((id.clone(), endpoint.bus.clone())),
                    None => {
                        debug!("Dropping {} for unknown peer {}", command.protocol, id);
                        None
                    }
                })
                .collect()
        };

        for (recipient, bus) in targets {
            let message = ReceivedMessage {
                sender: sender.clone(),
                protocol: command.protocol.clone(),
                body: command.body.clone(),
            };
            if let Err(e) = bus
                .publish(
                    exchanges::COMMAND,
                    topics::MESSAGE_RECEIVE,
                    BusPayload::Receive(message),
                )
                .await
            {
                warn!("Delivery {} → {} failed: {}", sender, recipient, e);
            }
        }
    }
}

impl Drop for LocalNetwork {
    fn drop(&mut self) {
        for endpoint in self.endpoints.get_mut().values() {
            endpoint.forwarder.abort();
        }
    }
}

async fn announce(bus: &InMemoryBus, peer_id: &PeerId, address: &str) -> Result<(), BusError> {
    bus.publish(
        exchanges::EVENT,
        topics::CONNECTION_SAVED,
        BusPayload::ConnectionSaved(ConnectionSavedEvent {
            id: peer_id.to_string(),
            address: address.to_string(),
        }),
    )
    .await
}
