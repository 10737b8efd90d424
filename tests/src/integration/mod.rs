//! # Integration Scenarios
//!
//! Every scenario runs complete `NodeRuntime`s: file-backed block store,
//! bus handlers, proposal loop and round timeouts.
//!
//! | Module | Scenario |
//! |--------|----------|
//! | `solo_pipeline` | one node, `Solo` engine: transaction → committed block |
//! | `pbft_follower` | one follower driven by scripted committee messages |
//! | `multi_node` | four nodes over `LocalNetwork`, forwarding and rotation |

#[cfg(test)]
mod support;

#[cfg(test)]
mod multi_node;
#[cfg(test)]
mod pbft_follower;
#[cfg(test)]
mod solo_pipeline;
