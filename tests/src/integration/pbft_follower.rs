//! # PBFT Follower Scenarios
//!
//! Node `n2` of the committee {n1, n2, n3, n4} (quorum 3, view 1 led by n1)
//! is driven by scripted messages from the other members.
//!
//! - **C1**: Preprepare accepted, Prepares from n1 and n3 plus its own reach
//!   Prepared, Commits from n1 and n3 plus its own reach Committed. The block
//!   lands on n2's chain and its transactions leave n2's pool.
//! - **C2**: Preprepare and a single Prepare, then silence. The round times
//!   out, the block is abandoned and later votes for it change nothing.
//! - **Reordered quorums**: two pipelined rounds where the second reaches
//!   its commit quorum first. Both blocks still land in height order.

use std::time::Duration;

use qn_06_txpool::TransactionRepository;
use qn_08_pbft::{ConsensusId, ConsensusMessage, MessageHeader, MsgType, Preprepare, Vote};
use shared_bus::{exchanges, topics, BusPayload, InMemoryBus, Subscription};
use shared_types::{protocols, Block, PeerId, Transaction, TxId, ViewId};

use super::support::{config, eventually, next_payload, receive, TestNode};

fn header(id: &str, sender: &str, sequence: u64) -> MessageHeader {
    MessageHeader {
        consensus_id: ConsensusId::from(id),
        view_id: ViewId(1),
        sequence_id: sequence,
        sender_id: PeerId::from(sender),
        timestamp: 0,
    }
}

async fn send(bus: &InMemoryBus, message: ConsensusMessage) {
    let sender = message.sender().to_string();
    receive(bus, &sender, protocols::CONSENSUS_MESSAGE, &message).await;
}

fn preprepare(id: &str, block: &Block) -> ConsensusMessage {
    ConsensusMessage::Preprepare(Preprepare {
        header: header(id, "n1", 0),
        block: block.clone(),
    })
}

fn prepare(id: &str, sender: &str, block: &Block) -> ConsensusMessage {
    ConsensusMessage::Prepare(Vote {
        header: header(id, sender, 0),
        block_hash: block.hash(),
    })
}

fn commit(id: &str, sender: &str, block: &Block) -> ConsensusMessage {
    ConsensusMessage::Commit(Vote {
        header: header(id, sender, 0),
        block_hash: block.hash(),
    })
}

/// Submit transactions on `node`, wait until its pool holds them and build
/// the leader's next block from them.
async fn pooled_block(node: &TestNode, payloads: &[&[u8]]) -> (Block, Vec<TxId>) {
    let container = node.runtime.container();
    let mut ids = Vec::new();
    for payload in payloads {
        ids.push(node.runtime.submit_transaction(payload.to_vec()).await.unwrap());
    }

    let transactions = container.transactions.clone();
    eventually("transactions pooled", || {
        ids.iter().all(|id| transactions.find_by_id(id).is_some())
    })
    .await;

    let pooled: Vec<Transaction> = ids
        .iter()
        .filter_map(|id| transactions.find_by_id(id))
        .collect();
    let genesis = container.block_api.block_by_height(0).unwrap().unwrap();
    let block = Block::new(1, genesis.hash(), PeerId::from("n1"), 1, pooled);
    (block, ids)
}

/// Consensus messages `n2` sent, in order.
fn sent_votes(outbound: &mut Subscription) -> Vec<(MsgType, ConsensusId)> {
    let mut votes = Vec::new();
    while let Ok(Some(envelope)) = outbound.try_recv() {
        if let BusPayload::Deliver(command) = envelope.payload {
            if command.protocol == protocols::CONSENSUS_MESSAGE {
                let message: ConsensusMessage = serde_json::from_slice(&command.body).unwrap();
                votes.push((message.msg_type(), message.consensus_id().clone()));
            }
        }
    }
    votes
}

#[tokio::test]
async fn test_c1_round_commits_block_on_follower() {
    let dir = tempfile::tempdir().unwrap();
    let node = TestNode::start(config("n2", qn_02_blockchain::EngineMode::Pbft, &dir), dir).await;
    let bus = node.runtime.bus();
    let container = node.runtime.container();
    let mut outbound = bus.subscribe(exchanges::COMMAND, topics::MESSAGE_DELIVER);

    let (b1, ids) = pooled_block(&node, &[b"t1", b"t2"]).await;

    send(&bus, preprepare("C1", &b1)).await;
    send(&bus, prepare("C1", "n1", &b1)).await;
    send(&bus, prepare("C1", "n3", &b1)).await;
    send(&bus, commit("C1", "n1", &b1)).await;
    send(&bus, commit("C1", "n3", &b1)).await;

    let api = container.block_api.clone();
    eventually("B1 persisted", || api.block_by_height(1).unwrap().is_some()).await;
    assert_eq!(api.block_by_height(1).unwrap(), Some(b1.clone()));
    assert_eq!(container.coordinator.active_rounds(), 0);

    let transactions = container.transactions.clone();
    eventually("pool entries removed", || {
        ids.iter().all(|id| transactions.find_by_id(id).is_none())
    })
    .await;

    let c1 = ConsensusId::from("C1");
    assert_eq!(
        sent_votes(&mut outbound),
        vec![(MsgType::Prepare, c1.clone()), (MsgType::Commit, c1)]
    );
    node.runtime.shutdown().await;
}

#[tokio::test]
async fn test_c2_round_times_out_and_late_votes_are_dropped() {
    let dir = tempfile::tempdir().unwrap();
    let mut config = config("n2", qn_02_blockchain::EngineMode::Pbft, &dir);
    config.consensus.round_timeout_secs = 1;
    config.consensus.sweep_interval_ms = 100;
    let node = TestNode::start(config, dir).await;
    let bus = node.runtime.bus();
    let container = node.runtime.container();
    let mut outbound = bus.subscribe(exchanges::COMMAND, topics::MESSAGE_DELIVER);
    let mut abandoned = bus.subscribe(exchanges::EVENT, topics::BLOCK_ABANDONED);

    let (b2, ids) = pooled_block(&node, &[b"t3"]).await;

    send(&bus, preprepare("C2", &b2)).await;
    send(&bus, prepare("C2", "n3", &b2)).await;

    match next_payload(&mut abandoned).await {
        BusPayload::BlockAbandoned(event) => {
            assert_eq!(event.height, 1);
            assert_eq!(event.tx_ids, ids);
        }
        other => panic!("unexpected payload {other:?}"),
    }
    assert_eq!(container.coordinator.active_rounds(), 0);

    send(&bus, prepare("C2", "n4", &b2)).await;
    send(&bus, prepare("C2", "n1", &b2)).await;
    tokio::time::sleep(Duration::from_millis(200)).await;

    assert_eq!(container.coordinator.active_rounds(), 0);
    assert_eq!(node.chain_height(), 0);
    assert_eq!(
        sent_votes(&mut outbound),
        vec![(MsgType::Prepare, ConsensusId::from("C2"))]
    );
    assert!(container.transactions.find_by_id(&ids[0]).is_some());
    node.runtime.shutdown().await;
}

#[tokio::test]
async fn test_pipelined_rounds_commit_in_sequence_order() {
    let dir = tempfile::tempdir().unwrap();
    let node = TestNode::start(config("n2", qn_02_blockchain::EngineMode::Pbft, &dir), dir).await;
    let bus = node.runtime.bus();
    let container = node.runtime.container();

    let (b1, _) = pooled_block(&node, &[b"t1"]).await;
    let (next, _) = pooled_block(&node, &[b"t2"]).await;
    let b2 = Block::new(2, b1.hash(), PeerId::from("n1"), 2, next.transactions);

    send(&bus, preprepare("C1", &b1)).await;
    let mut second = preprepare("C2", &b2);
    if let ConsensusMessage::Preprepare(p) = &mut second {
        p.header.sequence_id = 1;
    }
    send(&bus, second).await;

    for (id, block) in [("C2", &b2), ("C1", &b1)] {
        for sender in ["n1", "n3"] {
            send(&bus, prepare(id, sender, block)).await;
        }
        for sender in ["n1", "n3"] {
            send(&bus, commit(id, sender, block)).await;
        }
    }

    eventually("both blocks persisted", || node.chain_height() == 2).await;
    let api = container.block_api.clone();
    assert_eq!(api.block_by_height(1).unwrap(), Some(b1));
    assert_eq!(api.block_by_height(2).unwrap(), Some(b2));
    assert_eq!(container.coordinator.active_rounds(), 0);
    assert_eq!(container.coordinator.pending_finalizations(), 0);
    node.runtime.shutdown().await;
}
