//! # Event Handlers
//!
//! One handler loop per subsystem. Each owns a bus subscription covering
//! the events it consumes and the inbound peer protocols routed to it.
//!
//! ## Inbound Routing (`message.receive`)
//!
//! | Protocol | Handler |
//! |----------|---------|
//! | `ConsensusMessageProtocol` | `ConsensusHandler` |
//! | `LeaderTransactionsProtocol` | `TxPoolHandler` |
//! | anything else | `P2pHandler` |
//!
//! Handler errors are logged and the loop moves on to the next envelope.

mod blockchain;
mod consensus;
mod p2p;
mod txpool;

pub use blockchain::BlockchainHandler;
pub use consensus::ConsensusHandler;
pub use p2p::P2pHandler;
pub use txpool::TxPoolHandler;

use shared_bus::EnvelopeFilter;

/// Filter over topics of both exchanges. Topic names are unique across
/// exchanges, so the exchange is left open.
fn topics_filter(topics: &[&str]) -> EnvelopeFilter {
    EnvelopeFilter {
        exchange: None,
        topics: topics.iter().map(|t| t.to_string()).collect(),
    }
}
