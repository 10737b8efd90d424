//! # Event Routing
//!
//! Subscribes each subsystem's handler on the node bus and spawns every
//! long-running task under one shutdown signal.
//!
//! ## Event Flow
//!
//! ```text
//! tx.created ──→ TxPool ──(leader) block.propose RPC──→ Blockchain
//!                   │                                       │ Pbft
//!                   └─(follower) LeaderTransactions ─→ peer ▼
//!                                                       Consensus
//!                                                           │ quorum
//!                                                           ▼
//!                      TxPool ←── block.committed ──── Blockchain
//!                      TxPool ←── block.abandoned ──── (timeout / rejection)
//! ```

use tokio::sync::watch;
use tokio::task::JoinHandle;
use tracing::info;

use crate::container::SubsystemContainer;
use crate::handlers::{BlockchainHandler, ConsensusHandler, P2pHandler, TxPoolHandler};

/// Spawn the handler loops, the proposal loop and the round timeout loop.
///
/// Subscriptions are taken before this returns, so nothing published
/// afterwards is missed.
pub fn spawn_subsystems(
    container: &SubsystemContainer,
    shutdown: &watch::Receiver<bool>,
) -> Vec<JoinHandle<()>> {
    let bus = &container.bus;
    let mut tasks = Vec::new();

    let txpool = TxPoolHandler::new(
        bus,
        container.projector.clone(),
        container.tx_events.clone(),
    );
    tasks.push(until_shutdown("qn-06", shutdown.clone(), txpool.run()));

    let blockchain = BlockchainHandler::new(bus, container.connection_handler.clone());
    tasks.push(until_shutdown("qn-02", shutdown.clone(), blockchain.run()));

    let consensus = ConsensusHandler::new(bus, container.coordinator.clone());
    tasks.push(until_shutdown("qn-08", shutdown.clone(), consensus.run()));

    let p2p = P2pHandler::new(
        bus,
        container.peer_commands.clone(),
        container.p2p_events.clone(),
    );
    tasks.push(until_shutdown("qn-01", shutdown.clone(), p2p.run()));

    tasks.push(tokio::spawn(
        container.proposal.clone().run(shutdown.clone()),
    ));
    tasks.push(tokio::spawn(
        container.coordinator.clone().run_timeout_loop(shutdown.clone()),
    ));

    info!(
        "Event routing established ({} bus subscriptions)",
        bus.subscriber_count()
    );
    tasks
}

fn until_shutdown<F>(
    subsystem: &'static str,
    mut shutdown: watch::Receiver<bool>,
    handler: F,
) -> JoinHandle<()>
where
    F: std::future::Future<Output = ()> + Send + 'static,
{
    tokio::spawn(async move {
        tokio::select! {
            _ = handler => {}
            _ = shutdown.changed() => {
                info!("[{}] Shutdown signal received", subsystem);
            }
        }
    })
}
