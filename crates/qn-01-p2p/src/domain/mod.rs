//! Domain layer for the P2P command gateway.

pub mod errors;

pub use errors::{P2pError, P2pResult};

use serde::{Deserialize, Serialize};
use shared_types::{Leader, Peer};

/// Body of a `LeaderInfoRequestProtocol` command.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct LeaderInfoRequestMessage {
    /// Unix timestamp (milliseconds) of the request.
    pub timestamp: u64,
}

/// Body of a `LeaderInfoDeliverProtocol` command.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LeaderInfoDeliverMessage {
    pub leader: Leader,
}

/// Body of a `PeerListRequestProtocol` command.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct PeerListRequestMessage {
    pub timestamp: u64,
}

/// Body of a `PeerListDeliverProtocol` command.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PeerListDeliverMessage {
    pub peers: Vec<Peer>,
}

/// What an inbound peer command resulted in.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CommandOutcome {
    /// Our leader was sent back to the requester.
    LeaderInfoSent,
    /// A newer leader was learned and announced.
    LeaderUpdated(Leader),
    /// Our peer list was sent back; carries its length.
    PeerListSent(usize),
    /// Peers from a delivered list were stored; carries how many were new.
    PeersStored(usize),
    /// Nothing to do (unknown protocol, no leader yet, stale leader).
    Ignored,
}
