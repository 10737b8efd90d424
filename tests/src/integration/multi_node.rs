//! # Multi-Node Committee
//!
//! Four `Pbft` nodes joined by a `LocalNetwork`:
//!
//! ```text
//! client → n3 ──LeaderTransactions──→ n1 (leader)
//!                                      │ block.propose → Preprepare
//!                  n2, n3, n4 ←────────┘
//!                  Prepare / Commit between all four
//!                  every chain appends the same block
//! ```

use std::collections::BTreeSet;

use node_runtime::LocalNetwork;
use qn_01_p2p::{LeaderInfoDeliverMessage, PeerRepository};
use qn_06_txpool::{LeaderRepository, TransactionRepository};
use shared_bus::{exchanges, topics, BusPayload, MessagePublisher};
use shared_types::{
    protocols, DeliverCommand, Hash, Leader, LeaderChangedEvent, PeerId, TxId, ViewId,
};

use super::support::{committee_node, eventually, TestNode, COMMITTEE};

async fn committee() -> (Vec<TestNode>, std::sync::Arc<LocalNetwork>) {
    let mut nodes = Vec::new();
    for id in COMMITTEE {
        nodes.push(committee_node(id).await);
    }

    let network = LocalNetwork::new();
    for node in &nodes {
        let id = node.runtime.peer_id().clone();
        network
            .attach(id.clone(), format!("mem://{id}"), node.runtime.bus())
            .await
            .unwrap();
    }
    (nodes, network)
}

fn member<'a>(nodes: &'a [TestNode], id: &str) -> &'a TestNode {
    nodes
        .iter()
        .find(|n| n.runtime.peer_id().as_str() == id)
        .expect("committee member")
}

fn chain(node: &TestNode) -> Vec<Hash> {
    let api = node.runtime.container().block_api.clone();
    (0..=node.chain_height())
        .filter_map(|h| api.block_by_height(h).unwrap())
        .map(|b| b.hash())
        .collect()
}

fn committed_ids(node: &TestNode) -> BTreeSet<TxId> {
    let api = node.runtime.container().block_api.clone();
    (1..=node.chain_height())
        .filter_map(|h| api.block_by_height(h).unwrap())
        .flat_map(|b| b.tx_ids())
        .collect()
}

async fn shutdown(nodes: Vec<TestNode>) {
    for node in nodes {
        node.runtime.shutdown().await;
    }
}

#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn test_connections_are_recorded_by_every_node() {
    let (nodes, network) = committee().await;
    assert_eq!(network.len(), 4);

    for node in &nodes {
        let peers = node.runtime.container().peers.clone();
        eventually("peers recorded", || peers.len() == 3).await;
        assert!(peers
            .find_all()
            .iter()
            .all(|p| p.peer_id != *node.runtime.peer_id()));
    }
    shutdown(nodes).await;
}

#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn test_forwarded_transactions_commit_on_every_chain() {
    let (nodes, _network) = committee().await;
    let entry = member(&nodes, "n3");

    let mut submitted = BTreeSet::new();
    for payload in [b"x".to_vec(), b"y".to_vec()] {
        submitted.insert(entry.runtime.submit_transaction(payload).await.unwrap());
    }

    for node in &nodes {
        eventually("transactions committed everywhere", || {
            committed_ids(node) == submitted
        })
        .await;
    }

    let reference = chain(&nodes[0]);
    for node in &nodes[1..] {
        assert_eq!(chain(node), reference);
    }

    let api = member(&nodes, "n1").runtime.container().block_api.clone();
    let first = api.block_by_height(1).unwrap().unwrap();
    assert_eq!(first.header.creator, PeerId::from("n1"));

    let pool = entry.runtime.container().transactions.clone();
    eventually("entry pool drained", || pool.is_empty()).await;
    shutdown(nodes).await;
}

#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn test_leadership_handover_moves_proposals() {
    let (nodes, _network) = committee().await;
    let handover = Leader::new("n2", ViewId(2));

    // n1 steps down locally and tells the others who leads next.
    let n1 = member(&nodes, "n1").runtime.bus();
    n1.publish(
        exchanges::EVENT,
        topics::LEADER_CHANGED,
        BusPayload::LeaderChanged(LeaderChangedEvent::from(&handover)),
    )
    .await
    .unwrap();
    let command = DeliverCommand::json(
        ["n2", "n3", "n4"].into_iter().map(PeerId::from).collect(),
        protocols::LEADER_INFO_DELIVER,
        &LeaderInfoDeliverMessage {
            leader: handover.clone(),
        },
    )
    .unwrap();
    n1.publish(
        exchanges::COMMAND,
        topics::MESSAGE_DELIVER,
        BusPayload::Deliver(command),
    )
    .await
    .unwrap();

    for node in &nodes {
        let container = node.runtime.container();
        eventually("leader adopted", || {
            container.tx_leaders.get_leader() == Some(handover.clone())
                && container.committee.leader() == handover
        })
        .await;
    }

    let entry = member(&nodes, "n4");
    let id = entry.runtime.submit_transaction(b"z".to_vec()).await.unwrap();
    let expected: BTreeSet<TxId> = [id].into_iter().collect();

    for node in &nodes {
        eventually("transaction committed everywhere", || {
            committed_ids(node) == expected
        })
        .await;
    }

    let api = member(&nodes, "n3").runtime.container().block_api.clone();
    let block = api.block_by_height(1).unwrap().unwrap();
    assert_eq!(block.header.creator, PeerId::from("n2"));
    shutdown(nodes).await;
}
