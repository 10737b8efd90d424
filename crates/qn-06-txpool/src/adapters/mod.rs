//! Adapters for the transaction pool.

pub mod dispatcher;
pub mod memory;

pub use dispatcher::MessageDispatcher;
pub use memory::{InMemoryLeaderRepository, InMemoryTransactionRepository};
