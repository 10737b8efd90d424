//! # Node Lifecycle
//!
//! ```text
//! NodeRuntime::new(config)   build subsystems, open the block store
//!        │
//!        ▼
//! start()                    commit genesis, subscribe handlers, spawn loops
//!        │
//!        ▼
//! shutdown()                 signal loops, wait for them, drop ephemeral data
//! ```

use std::fs;
use std::sync::Arc;
use std::time::{Duration, SystemTime, UNIX_EPOCH};

use anyhow::{Context, Result};
use parking_lot::Mutex;
use tokio::sync::watch;
use tokio::task::JoinHandle;
use tracing::{error, info, warn};
use uuid::Uuid;

use shared_bus::{exchanges, topics, BusPayload, InMemoryBus, MessagePublisher};
use shared_types::{PeerId, TxCreatedEvent, TxId};

use crate::container::{NodeConfig, SubsystemContainer};
use crate::genesis::initialize_genesis;
use crate::wiring::spawn_subsystems;

/// How long shutdown waits for the loops to finish.
const SHUTDOWN_GRACE: Duration = Duration::from_secs(2);

/// A running node: its subsystems plus the tasks driving them.
pub struct NodeRuntime {
    container: Arc<SubsystemContainer>,
    shutdown_tx: watch::Sender<bool>,
    shutdown_rx: watch::Receiver<bool>,
    tasks: Mutex<Vec<JoinHandle<()>>>,
}

impl NodeRuntime {
    pub fn new(config: NodeConfig) -> Result<Self> {
        let container = Arc::new(SubsystemContainer::new(config)?);
        let (shutdown_tx, shutdown_rx) = watch::channel(false);
        Ok(Self {
            container,
            shutdown_tx,
            shutdown_rx,
            tasks: Mutex::new(Vec::new()),
        })
    }

    /// Start the node runtime.
    pub async fn start(&self) -> Result<()> {
        let config = &self.container.config;
        info!("===========================================");
        info!("  Quorum-Node Runtime v{}", env!("CARGO_PKG_VERSION"));
        info!("  Node: {} ({})", config.node.peer_id, config.node.address);
        info!("  Engine: {}", config.consensus.engine_mode);
        info!("===========================================");

        initialize_genesis(&self.container.block_api, &config.chain_genesis())
            .context("Chain initialization failed")?;

        let tasks = spawn_subsystems(&self.container, &self.shutdown_rx);
        self.tasks.lock().extend(tasks);

        info!("All subsystems initialized and running");
        info!("Data Dir: {}", config.storage.data_dir.display());
        Ok(())
    }

    /// Queue a client transaction. Returns its generated id.
    pub async fn submit_transaction(&self, payload: Vec<u8>) -> Result<TxId> {
        let id = Uuid::new_v4().to_string();
        let timestamp = SystemTime::now()
            .duration_since(UNIX_EPOCH)
            .map(|d| d.as_millis() as u64)
            .unwrap_or_default();

        self.container
            .bus
            .publish(
                exchanges::EVENT,
                topics::TX_CREATED,
                BusPayload::TxCreated(TxCreatedEvent {
                    id: id.clone(),
                    payload,
                    timestamp,
                }),
            )
            .await
            .context("Failed to publish tx.created")?;
        Ok(TxId::new(id))
    }

    /// Stop every loop and release the node's resources.
    pub async fn shutdown(&self) {
        info!("Initiating graceful shutdown...");

        if let Err(e) = self.shutdown_tx.send(true) {
            error!("Failed to send shutdown signal: {}", e);
        }

        let tasks = std::mem::take(&mut *self.tasks.lock());
        let drain = async {
            for task in tasks {
                let _ = task.await;
            }
        };
        if tokio::time::timeout(SHUTDOWN_GRACE, drain).await.is_err() {
            warn!("Some tasks did not stop within {:?}", SHUTDOWN_GRACE);
        }

        let storage = &self.container.config.storage;
        if storage.ephemeral {
            match fs::remove_dir_all(&storage.data_dir) {
                Ok(()) => info!("Removed {}", storage.data_dir.display()),
                Err(e) => warn!("Could not remove {}: {}", storage.data_dir.display(), e),
            }
        }

        info!("Shutdown complete");
    }

    /// Get a reference to the subsystem container.
    pub fn container(&self) -> Arc<SubsystemContainer> {
        Arc::clone(&self.container)
    }

    pub fn bus(&self) -> Arc<InMemoryBus> {
        Arc::clone(&self.container.bus)
    }

    pub fn peer_id(&self) -> &PeerId {
        &self.container.config.node.peer_id
    }
}
