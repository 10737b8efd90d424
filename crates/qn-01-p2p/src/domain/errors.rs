//! Domain Errors for the P2P command gateway

use thiserror::Error;

/// Errors raised while building or handling peer commands.
///
/// Validation variants are returned before anything is published.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum P2pError {
    /// Connection or peer id is empty.
    #[error("empty peer id proposed")]
    EmptyPeerId,

    /// Leader id is empty.
    #[error("empty leader id proposed")]
    EmptyLeaderId,

    /// Peer list is empty.
    #[error("empty peer list proposed")]
    EmptyPeerList,

    /// Event received without an id.
    #[error("Event id is missing")]
    NoEventId,

    /// A peer command body could not be decoded.
    #[error("Malformed {protocol} body: {reason}")]
    Decode { protocol: String, reason: String },

    /// Command body could not be encoded.
    #[error("Serialization error: {0}")]
    Serialization(String),

    /// Publishing to the bus failed.
    #[error("Transport error: {0}")]
    Transport(String),
}

/// Result type for P2P operations.
pub type P2pResult<T> = Result<T, P2pError>;
