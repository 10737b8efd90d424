//! # Shared Types Crate
//!
//! This crate contains the domain entities, events and peer commands shared by
//! every subsystem of the node.
//!
//! ## Design Principles
//!
//! - **Single Source of Truth**: All cross-subsystem types are defined here.
//! - **Non-empty identity**: Events and commands are identified by string ids;
//!   handlers treat an empty id as a malformed message.

pub mod commands;
pub mod entities;
pub mod events;

pub use commands::*;
pub use entities::*;
pub use events::*;
