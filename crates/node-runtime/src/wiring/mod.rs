//! # Subsystem Wiring Module
//!
//! Connects the subsystems built by the container through bus subscriptions
//! and starts their loops.

pub mod event_routing;

pub use event_routing::spawn_subsystems;
