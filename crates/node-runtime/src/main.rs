//! # Quorum-Node Runtime
//!
//! The main entry point for a Quorum-Node PBFT blockchain node.
//!
//! ## Modular Structure
//!
//! - `container/` - Configuration and subsystem construction
//! - `genesis/` - Chain initialization
//! - `adapters/` - Port implementations connecting subsystems
//! - `handlers/` - Bus handler loops per subsystem
//! - `wiring/` - Subscriptions and task spawning
//!
//! ## Flow
//!
//! ```text
//! tx.created → TxPool ──block.propose──→ Blockchain ──→ PBFT rounds
//!                ↑                                         │
//!                └────── block.committed / abandoned ──────┘
//! ```
//!
//! ## Configuration
//!
//! Defaults overridden by `QN_*` environment variables; see
//! `container::config`.

use anyhow::Result;
use tracing::{info, warn};
use tracing_subscriber::{EnvFilter, FmtSubscriber};

use node_runtime::container::NodeConfig;
use node_runtime::NodeRuntime;

/// Load configuration from the environment.
///
/// Rejected overrides are returned so they can be logged once the
/// subscriber is installed.
fn load_config() -> (NodeConfig, Vec<String>) {
    let mut config = NodeConfig::default();
    let rejected = config
        .apply_env(|key| std::env::var(key).ok())
        .into_iter()
        .map(|e| e.to_string())
        .collect();
    (config, rejected)
}

#[tokio::main]
async fn main() -> Result<()> {
    let (config, rejected) = load_config();

    // Initialize logging
    let filter = EnvFilter::try_new(&config.logging.level)
        .unwrap_or_else(|_| EnvFilter::new("info"));
    let subscriber = FmtSubscriber::builder()
        .with_env_filter(filter)
        .with_target(true)
        .with_thread_ids(true)
        .finish();
    tracing::subscriber::set_global_default(subscriber)?;

    for reason in rejected {
        warn!("Ignoring configuration override: {}", reason);
    }

    // Create and start the node runtime
    let runtime = NodeRuntime::new(config)?;
    runtime.start().await?;

    // Keep the node running
    info!("Node is running. Press Ctrl+C to stop.");
    tokio::signal::ctrl_c().await?;

    // Graceful shutdown
    runtime.shutdown().await;

    Ok(())
}
