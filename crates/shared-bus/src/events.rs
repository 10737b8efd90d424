//! # Bus Payloads
//!
//! Defines every payload that flows through the bus and the envelope that
//! carries it under an `(exchange, topic)` routing key.

use serde::{Deserialize, Serialize};
use shared_types::{
    BlockAbandonedEvent, BlockCommittedEvent, ConnectionSavedEvent, DeliverCommand,
    LeaderChangedEvent, ReceivedMessage, TxCreatedEvent, TxDeletedEvent,
};

/// All payloads that can be published to the bus.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum BusPayload {
    // =========================================================================
    // EVENTS
    // =========================================================================
    /// A peer connection was recorded.
    ConnectionSaved(ConnectionSavedEvent),
    /// A transaction entered the node.
    TxCreated(TxCreatedEvent),
    /// A transaction was withdrawn.
    TxDeleted(TxDeletedEvent),
    /// Leader rotation.
    LeaderChanged(LeaderChangedEvent),
    /// A block was appended to the chain.
    BlockCommitted(BlockCommittedEvent),
    /// A proposed block was dropped before consensus.
    BlockAbandoned(BlockAbandonedEvent),

    // =========================================================================
    // PEER TRAFFIC
    // =========================================================================
    /// Outbound, peer-addressed command.
    Deliver(DeliverCommand),
    /// Inbound message handed over by the transport.
    Receive(ReceivedMessage),
}

impl BusPayload {
    /// Short name of the payload kind, for logging.
    #[must_use]
    pub fn kind(&self) -> &'static str {
        match self {
            Self::ConnectionSaved(_) => "ConnectionSaved",
            Self::TxCreated(_) => "TxCreated",
            Self::TxDeleted(_) => "TxDeleted",
            Self::LeaderChanged(_) => "LeaderChanged",
            Self::BlockCommitted(_) => "BlockCommitted",
            Self::BlockAbandoned(_) => "BlockAbandoned",
            Self::Deliver(_) => "Deliver",
            Self::Receive(_) => "Receive",
        }
    }
}

/// A payload together with its routing key.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Envelope {
    pub exchange: String,
    pub topic: String,
    pub payload: BusPayload,
}

/// Filter for subscribing to specific routing keys.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct EnvelopeFilter {
    /// Exchange to match. `None` matches every exchange.
    pub exchange: Option<String>,
    /// Topics to include. Empty means all topics.
    pub topics: Vec<String>,
}

impl EnvelopeFilter {
    /// Create a filter that accepts all envelopes.
    #[must_use]
    pub fn all() -> Self {
        Self::default()
    }

    /// Create a filter for one topic of one exchange.
    #[must_use]
    pub fn topic(exchange: &str, topic: &str) -> Self {
        Self {
            exchange: Some(exchange.to_string()),
            topics: vec![topic.to_string()],
        }
    }

    /// Create a filter for several topics of one exchange.
    #[must_use]
    pub fn topics(exchange: &str, topics: &[&str]) -> Self {
        Self {
            exchange: Some(exchange.to_string()),
            topics: topics.iter().map(|t| t.to_string()).collect(),
        }
    }

    /// Check if an envelope matches this filter.
    #[must_use]
    pub fn matches(&self, envelope: &Envelope) -> bool {
        let exchange_match = self
            .exchange
            .as_ref()
            .map_or(true, |exchange| *exchange == envelope.exchange);

        let topic_match = self.topics.is_empty() || self.topics.contains(&envelope.topic);

        exchange_match && topic_match
    }
}
