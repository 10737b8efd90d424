//! # Subsystem Container
//!
//! Configuration and construction of every subsystem a node runs.
//!
//! - All inter-subsystem traffic goes through the shared bus or the RPC
//!   gateway.
//! - Adapters in `crate::adapters` implement the ports one subsystem
//!   exposes to another.

pub mod config;
pub mod subsystems;

pub use config::{ConfigError, NodeConfig};
pub use subsystems::SubsystemContainer;
