//! Adapters for the P2P subsystem.

pub mod command_service;
pub mod memory;

pub use command_service::CommandService;
pub use memory::{InMemoryLeaderRepository, InMemoryPeerRepository};
