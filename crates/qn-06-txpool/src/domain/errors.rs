//! Transaction pool error types.

use shared_types::TxId;
use thiserror::Error;

/// Transaction pool error type.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum TxPoolError {
    /// Transaction submitted without an id.
    #[error("Transaction id is empty")]
    EmptyTransactionId,

    /// Event received without an id.
    #[error("Event id is missing")]
    NoEventId,

    /// A proposal or forward was attempted with no transactions.
    #[error("Empty transaction list proposed")]
    EmptyTransactionList,

    /// Transaction not found in the pool.
    #[error("Transaction not found: {0}")]
    TransactionNotFound(TxId),

    /// The current leader is not known yet.
    #[error("Leader is not known")]
    NoLeader,

    /// Publish or RPC call failed.
    #[error("Transport error: {0}")]
    Transport(String),

    /// Payload could not be encoded.
    #[error("Serialization error: {0}")]
    Serialization(String),
}

/// Result type for transaction pool operations.
pub type TxPoolResult<T> = Result<T, TxPoolError>;
