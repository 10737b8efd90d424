//! # Shared Bus - Message Gateway for Node Subsystems
//!
//! Subsystems never call each other directly. They publish payloads under an
//! `(exchange, topic)` routing key, subscribe to the keys they consume, and
//! expose synchronous operations as named RPC methods.
//!
//! ```text
//! ┌──────────────┐                    ┌──────────────┐
//! │ Subsystem A  │                    │ Subsystem B  │
//! │              │  publish(ex, tp)   │              │
//! │              │ ──────┐            │              │
//! └──────────────┘       │            └──────────────┘
//!                        ▼                    ↑
//!                  ┌──────────────┐          │
//!                  │ InMemoryBus  │ ─────────┘
//!                  └──────────────┘  subscribe(ex, tp)
//!
//!   caller ── call("block.propose", req) ──→ RpcServer ──→ handler
//! ```
//!
//! ## Delivery
//!
//! - Events are fire-and-forget; a publish with no subscribers is not an error.
//! - RPC calls are bounded by the server's call timeout.

#![allow(clippy::missing_const_for_fn)]
#![cfg_attr(test, allow(clippy::unwrap_used))]
#![cfg_attr(test, allow(clippy::expect_used))]

pub mod error;
pub mod events;
pub mod publisher;
pub mod rpc;
pub mod subscriber;

#[cfg(any(test, feature = "test-utils"))]
pub mod testing;

pub use error::BusError;
pub use events::{BusPayload, Envelope, EnvelopeFilter};
pub use publisher::{InMemoryBus, MessagePublisher};
pub use rpc::{call_typed, RpcClient, RpcHandler, RpcServer};
pub use subscriber::{EnvelopeStream, Subscription, SubscriptionError};

use std::time::Duration;

/// Maximum envelopes to buffer per subscriber before it lags.
pub const DEFAULT_CHANNEL_CAPACITY: usize = 1000;

/// Upper bound on a single RPC call.
pub const DEFAULT_RPC_TIMEOUT: Duration = Duration::from_secs(5);

/// Exchange names.
pub mod exchanges {
    /// Domain events.
    pub const EVENT: &str = "Event";
    /// Peer-addressed commands.
    pub const COMMAND: &str = "Command";
}

/// Topic names.
pub mod topics {
    pub const MESSAGE_DELIVER: &str = "message.deliver";
    pub const MESSAGE_RECEIVE: &str = "message.receive";
    pub const CONNECTION_SAVED: &str = "connection.saved";
    pub const TX_CREATED: &str = "tx.created";
    pub const TX_DELETED: &str = "tx.deleted";
    pub const LEADER_CHANGED: &str = "leader.changed";
    pub const BLOCK_COMMITTED: &str = "block.committed";
    pub const BLOCK_ABANDONED: &str = "block.abandoned";
}

/// RPC method names.
pub mod methods {
    pub const BLOCK_PROPOSE: &str = "block.propose";
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_capacity() {
        assert_eq!(DEFAULT_CHANNEL_CAPACITY, 1000);
    }
}
