//! Shared fixtures for the scenarios.

use std::future::Future;
use std::time::Duration;

use node_runtime::{NodeConfig, NodeRuntime};
use qn_02_blockchain::EngineMode;
use serde::Serialize;
use shared_bus::{exchanges, topics, BusPayload, InMemoryBus, MessagePublisher, Subscription};
use shared_types::{PeerId, ReceivedMessage};
use tempfile::TempDir;

pub const COMMITTEE: [&str; 4] = ["n1", "n2", "n3", "n4"];

/// A started node plus the directory holding its block store.
pub struct TestNode {
    pub runtime: NodeRuntime,
    _dir: TempDir,
}

impl TestNode {
    pub async fn start(config: NodeConfig, dir: TempDir) -> Self {
        let runtime = NodeRuntime::new(config).expect("node builds");
        runtime.start().await.expect("node starts");
        Self { runtime, _dir: dir }
    }

    pub fn chain_height(&self) -> u64 {
        self.runtime
            .container()
            .block_api
            .last_block()
            .unwrap()
            .map(|b| b.height())
            .unwrap_or_default()
    }
}

pub fn config(id: &str, mode: EngineMode, dir: &TempDir) -> NodeConfig {
    let mut config = NodeConfig::default();
    config.node.peer_id = PeerId::from(id);
    config.node.address = format!("mem://{id}");
    config.consensus.engine_mode = mode;
    config.consensus.committee = COMMITTEE.iter().copied().map(PeerId::from).collect();
    config.txpool.proposal_interval_ms = 50;
    config.storage.data_dir = dir.path().join(id);
    config
}

pub async fn committee_node(id: &str) -> TestNode {
    let dir = tempfile::tempdir().unwrap();
    let config = config(id, EngineMode::Pbft, &dir);
    TestNode::start(config, dir).await
}

/// Poll `check` until it holds or five seconds pass.
pub async fn eventually<F>(what: &str, mut check: F)
where
    F: FnMut() -> bool,
{
    for _ in 0..250 {
        if check() {
            return;
        }
        tokio::time::sleep(Duration::from_millis(20)).await;
    }
    panic!("timed out waiting for {what}");
}

/// Await the next envelope payload on `subscription`.
pub async fn next_payload(subscription: &mut Subscription) -> BusPayload {
    within(subscription.recv())
        .await
        .expect("bus closed")
        .payload
}

pub async fn within<F: Future>(future: F) -> F::Output {
    tokio::time::timeout(Duration::from_secs(5), future)
        .await
        .expect("timed out")
}

/// Hand `body` to `bus` as if `sender`'s connection delivered it.
pub async fn receive<T: Serialize>(bus: &InMemoryBus, sender: &str, protocol: &str, body: &T) {
    bus.publish(
        exchanges::COMMAND,
        topics::MESSAGE_RECEIVE,
        BusPayload::Receive(ReceivedMessage {
            sender: PeerId::from(sender),
            protocol: protocol.to_string(),
            body: serde_json::to_vec(body).unwrap(),
        }),
    )
    .await
    .unwrap();
}
