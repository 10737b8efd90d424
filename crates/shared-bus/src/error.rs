//! Bus errors.

use thiserror::Error;

/// Errors surfaced by publish, subscribe and RPC operations.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum BusError {
    /// The bus was shut down.
    #[error("Message bus closed")]
    Closed,

    /// No handler is registered for the RPC method.
    #[error("No handler registered for method: {0}")]
    NoHandler(String),

    /// A handler is already registered for the RPC method.
    #[error("Handler already registered for method: {0}")]
    HandlerExists(String),

    /// The RPC call did not complete in time.
    #[error("Call to {method} timed out after {timeout_ms}ms")]
    Timeout { method: String, timeout_ms: u64 },

    /// The RPC handler reported a failure.
    #[error("Handler error: {0}")]
    Handler(String),

    /// Request or response could not be (de)serialized.
    #[error("Serialization error: {0}")]
    Serialization(String),

    /// Underlying transport failure.
    #[error("Transport error: {0}")]
    Transport(String),
}

impl From<serde_json::Error> for BusError {
    fn from(err: serde_json::Error) -> Self {
        Self::Serialization(err.to_string())
    }
}
