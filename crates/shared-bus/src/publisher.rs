//! # Publisher
//!
//! Defines the publishing side of the bus and the in-memory implementation.

use crate::error::BusError;
use crate::events::{BusPayload, Envelope, EnvelopeFilter};
use crate::subscriber::{EnvelopeStream, Subscription};
use crate::DEFAULT_CHANNEL_CAPACITY;
use async_trait::async_trait;
use std::collections::HashMap;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, RwLock};
use tokio::sync::broadcast;
use tracing::{debug, warn};

/// Trait for publishing payloads to the bus.
///
/// This is the only outbound channel subsystems use to reach each other and
/// the peer transport.
#[async_trait]
pub trait MessagePublisher: Send + Sync {
    /// Publish `payload` under the `(exchange, topic)` routing key.
    ///
    /// Having no subscribers is not an error; transport failures are.
    async fn publish(&self, exchange: &str, topic: &str, payload: BusPayload)
        -> Result<(), BusError>;
}

/// In-memory bus.
///
/// Uses `tokio::sync::broadcast` for multi-producer, multi-consumer delivery.
/// Each subscription filters the shared stream by routing key.
pub struct InMemoryBus {
    sender: broadcast::Sender<Envelope>,

    /// Active subscription count by routing key.
    subscriptions: Arc<RwLock<HashMap<String, usize>>>,

    published: AtomicU64,

    capacity: usize,
}

impl InMemoryBus {
    #[must_use]
    pub fn new() -> Self {
        Self::with_capacity(DEFAULT_CHANNEL_CAPACITY)
    }

    #[must_use]
    pub fn with_capacity(capacity: usize) -> Self {
        let (sender, _) = broadcast::channel(capacity);
        Self {
            sender,
            subscriptions: Arc::new(RwLock::new(HashMap::new())),
            published: AtomicU64::new(0),
            capacity,
        }
    }

    /// Subscribe to one topic of one exchange.
    #[must_use]
    pub fn subscribe(&self, exchange: &str, topic: &str) -> Subscription {
        self.subscribe_filter(EnvelopeFilter::topic(exchange, topic))
    }

    /// Subscribe with an arbitrary filter.
    #[must_use]
    pub fn subscribe_filter(&self, filter: EnvelopeFilter) -> Subscription {
        let receiver = self.sender.subscribe();
        let key = routing_key(&filter);

        if let Ok(mut subs) = self.subscriptions.write() {
            *subs.entry(key.clone()).or_insert(0) += 1;
        }

        debug!(key = %key, "New subscription created");

        Subscription::new(receiver, filter, self.subscriptions.clone(), key)
    }

    /// Stream of envelopes matching `filter`.
    #[must_use]
    pub fn stream(&self, filter: EnvelopeFilter) -> EnvelopeStream {
        EnvelopeStream::new(self.subscribe_filter(filter))
    }

    /// Number of live receivers.
    #[must_use]
    pub fn subscriber_count(&self) -> usize {
        self.sender.receiver_count()
    }

    /// Number of subscriptions registered under a routing key.
    #[must_use]
    pub fn subscriptions_for(&self, exchange: &str, topic: &str) -> usize {
        let key = routing_key(&EnvelopeFilter::topic(exchange, topic));
        self.subscriptions
            .read()
            .map(|subs| subs.get(&key).copied().unwrap_or(0))
            .unwrap_or(0)
    }

    /// Total publish attempts.
    #[must_use]
    pub fn published(&self) -> u64 {
        self.published.load(Ordering::Relaxed)
    }

    #[must_use]
    pub fn capacity(&self) -> usize {
        self.capacity
    }
}

impl Default for InMemoryBus {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl MessagePublisher for InMemoryBus {
    async fn publish(
        &self,
        exchange: &str,
        topic: &str,
        payload: BusPayload,
    ) -> Result<(), BusError> {
        self.published.fetch_add(1, Ordering::Relaxed);
        let kind = payload.kind();

        let envelope = Envelope {
            exchange: exchange.to_string(),
            topic: topic.to_string(),
            payload,
        };

        match self.sender.send(envelope) {
            Ok(receivers) => {
                debug!(exchange, topic, kind, receivers, "Payload published");
            }
            Err(_) => {
                warn!(exchange, topic, kind, "Payload dropped (no receivers)");
            }
        }
        Ok(())
    }
}

fn routing_key(filter: &EnvelopeFilter) -> String {
    format!(
        "{}/{}",
        filter.exchange.as_deref().unwrap_or("*"),
        filter.topics.join(",")
    )
}
