//! # P2P Command Gateway
//!
//! **Subsystem ID:** 1
//!
//! Builds the leader and peer-list commands exchanged between nodes and
//! answers the ones other nodes send us. Connection management and the wire
//! transport are not part of this crate: outbound commands leave as
//! `DeliverCommand`s on `Command`/`message.deliver`, inbound ones arrive as
//! `ReceivedMessage`s on `message.receive`.
//!
//! ## Validation
//!
//! | Error | Raised when |
//! |-------|-------------|
//! | `EmptyPeerId` | connection or peer id is empty (checked first) |
//! | `EmptyLeaderId` | a delivered leader has an empty id |
//! | `EmptyPeerList` | a peer list to deliver is empty |
//!
//! Nothing is published when validation fails.

pub mod adapters;
pub mod domain;
pub mod ports;
pub mod service;

pub use adapters::{CommandService, InMemoryLeaderRepository, InMemoryPeerRepository};
pub use domain::{
    CommandOutcome, LeaderInfoDeliverMessage, LeaderInfoRequestMessage, P2pError, P2pResult,
    PeerListDeliverMessage, PeerListRequestMessage,
};
pub use ports::{CommandGateway, LeaderRepository, PeerRepository};
pub use service::{P2pDependencies, P2pEventHandler, PeerCommandHandler};
