//! # Solo Pipeline
//!
//! One node with the `Solo` engine: queued transactions are proposed by the
//! proposal loop and committed on the spot by the `block.propose` handler.

use std::collections::BTreeSet;

use qn_02_blockchain::EngineMode;
use qn_06_txpool::TransactionRepository;
use shared_bus::{exchanges, topics, BusPayload};
use shared_types::TxId;

use super::support::{config, eventually, next_payload, TestNode};

async fn solo_node(max_txs_per_block: usize) -> TestNode {
    let dir = tempfile::tempdir().unwrap();
    let mut config = config("n1", EngineMode::Solo, &dir);
    config.consensus.max_txs_per_block = max_txs_per_block;
    TestNode::start(config, dir).await
}

fn committed_ids(node: &TestNode) -> BTreeSet<TxId> {
    let api = node.runtime.container().block_api.clone();
    (1..=node.chain_height())
        .filter_map(|h| api.block_by_height(h).unwrap())
        .flat_map(|b| b.tx_ids())
        .collect()
}

#[tokio::test]
async fn test_transactions_reach_the_chain() {
    let node = solo_node(100).await;
    let mut committed = node
        .runtime
        .bus()
        .subscribe(exchanges::EVENT, topics::BLOCK_COMMITTED);

    let mut submitted = BTreeSet::new();
    for payload in [b"a".to_vec(), b"b".to_vec(), b"c".to_vec()] {
        submitted.insert(node.runtime.submit_transaction(payload).await.unwrap());
    }

    eventually("all transactions committed", || committed_ids(&node) == submitted).await;

    match next_payload(&mut committed).await {
        BusPayload::BlockCommitted(event) => {
            assert_eq!(event.height, 1);
            assert!(event.tx_ids.iter().all(|id| submitted.contains(id)));
        }
        other => panic!("unexpected payload {other:?}"),
    }

    let transactions = node.runtime.container().transactions.clone();
    eventually("pool drained", || transactions.is_empty()).await;
    node.runtime.shutdown().await;
}

#[tokio::test]
async fn test_blocks_respect_size_limit_and_chain() {
    let node = solo_node(2).await;

    let mut submitted = BTreeSet::new();
    for i in 0..5u8 {
        submitted.insert(node.runtime.submit_transaction(vec![i]).await.unwrap());
    }

    eventually("all transactions committed", || committed_ids(&node) == submitted).await;

    let api = node.runtime.container().block_api.clone();
    let tip = node.chain_height();
    assert!(tip >= 3);
    for height in 1..=tip {
        let block = api.block_by_height(height).unwrap().unwrap();
        let parent = api.block_by_height(height - 1).unwrap().unwrap();
        assert_eq!(block.header.prev_hash, parent.hash());
        assert!(!block.transactions.is_empty() && block.transactions.len() <= 2);
        assert!(block.verify_tx_root());
    }
    node.runtime.shutdown().await;
}
