//! # Node Runtime Library
//!
//! Builds and runs a Quorum-Node. The `quorum-node` binary is a thin shell
//! around [`NodeRuntime`]; tests drive it directly.
//!
//! ## Architectural Patterns
//!
//! - **EDA (Event-Driven Architecture)**: Subsystems communicate via the bus only
//! - **Hexagonal Architecture**: Ports define contracts, Adapters implement them
//!
//! ## Subsystems
//!
//! | ID | Crate | Role |
//! |----|-------|------|
//! | 1 | `qn-01-p2p` | leader and peer-list commands |
//! | 2 | `qn-02-blockchain` | block store, proposals, commits |
//! | 6 | `qn-06-txpool` | transaction pool, proposal loop |
//! | 8 | `qn-08-pbft` | three-phase consensus |

pub mod adapters;
pub mod container;
pub mod genesis;
pub mod handlers;
pub mod node;
pub mod wiring;

pub use adapters::LocalNetwork;
pub use container::{ConfigError, NodeConfig, SubsystemContainer};
pub use node::NodeRuntime;
