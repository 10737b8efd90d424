//! # Quorum-Node Subsystem Benchmarks
//!
//! Hot paths of a consensus round:
//!
//! | Subsystem | Path | Per round |
//! |-----------|------|-----------|
//! | qn-08 PBFT | quorum check, vote pool insert/count | once per vote |
//! | qn-02 Blockchain | append, height lookup | once per commit |
//! | shared-types | transaction root | once per proposal and preprepare |

use criterion::{black_box, criterion_group, criterion_main, BenchmarkId, Criterion, Throughput};
use rand::Rng;
use std::time::Duration;

use qn_02_blockchain::{BlockRepository, InMemoryKVStore, KvBlockRepository};
use qn_08_pbft::{
    quorum_reached, quorum_threshold, ConsensusId, InMemoryVoteRepository, MessageHeader,
    Vote, VoteRepository,
};
use shared_types::{compute_tx_root, Block, PeerId, Transaction, ViewId, ZERO_HASH};

fn transactions(count: usize) -> Vec<Transaction> {
    let mut rng = rand::thread_rng();
    (0..count)
        .map(|i| {
            let payload: Vec<u8> = (0..64).map(|_| rng.gen()).collect();
            Transaction::new(format!("tx-{i}"), payload, i as u64)
        })
        .collect()
}

fn vote(round: &ConsensusId, sender: usize) -> Vote {
    Vote {
        header: MessageHeader {
            consensus_id: round.clone(),
            view_id: ViewId(1),
            sequence_id: 0,
            sender_id: PeerId::new(format!("n{sender}")),
            timestamp: 0,
        },
        block_hash: [7u8; 32],
    }
}

// ============================================================================
// QN-08: PBFT
// ============================================================================

fn bench_quorum(c: &mut Criterion) {
    let mut group = c.benchmark_group("qn-08-pbft-quorum");

    for size in [4usize, 16, 64, 256] {
        group.bench_with_input(BenchmarkId::new("threshold", size), &size, |b, &n| {
            b.iter(|| black_box(quorum_threshold(black_box(n))))
        });
        group.bench_with_input(BenchmarkId::new("reached", size), &size, |b, &n| {
            b.iter(|| {
                (0..=n)
                    .filter(|votes| quorum_reached(black_box(*votes), n))
                    .count()
            })
        });
    }

    group.finish();
}

fn bench_vote_pool(c: &mut Criterion) {
    let mut group = c.benchmark_group("qn-08-pbft-votes");
    group.measurement_time(Duration::from_secs(5));

    for size in [4usize, 16, 64] {
        group.throughput(Throughput::Elements(size as u64));
        group.bench_with_input(BenchmarkId::new("save_round", size), &size, |b, &n| {
            b.iter(|| {
                let repo = InMemoryVoteRepository::new();
                let round = ConsensusId::generate();
                for sender in 0..n {
                    repo.save(vote(&round, sender));
                }
                // A second vote from the same sender is rejected.
                black_box(repo.save(vote(&round, 0)));
                black_box(repo.count(&round))
            })
        });
    }

    // Counting while many rounds are in flight.
    let repo = InMemoryVoteRepository::new();
    let rounds: Vec<ConsensusId> = (0..1_000).map(|_| ConsensusId::generate()).collect();
    for round in &rounds {
        for sender in 0..4 {
            repo.save(vote(round, sender));
        }
    }
    group.bench_function("count_1000_rounds", |b| {
        let mut i = 0;
        b.iter(|| {
            i = (i + 1) % rounds.len();
            black_box(repo.count(&rounds[i]))
        })
    });

    group.finish();
}

// ============================================================================
// QN-02: Blockchain
// ============================================================================

fn chain(length: u64, txs_per_block: usize) -> Vec<Block> {
    let mut blocks = vec![Block::new(0, ZERO_HASH, PeerId::from("genesis"), 0, vec![])];
    for height in 1..=length {
        let prev = blocks[blocks.len() - 1].hash();
        blocks.push(Block::new(
            height,
            prev,
            PeerId::from("n1"),
            height,
            transactions(txs_per_block),
        ));
    }
    blocks
}

fn bench_block_repository(c: &mut Criterion) {
    let mut group = c.benchmark_group("qn-02-blockchain");

    let blocks = chain(100, 10);
    group.throughput(Throughput::Elements(blocks.len() as u64));
    group.bench_function("append_100_blocks", |b| {
        b.iter(|| {
            let repo = KvBlockRepository::new(Box::new(InMemoryKVStore::new()));
            for block in &blocks {
                repo.save(block).unwrap();
            }
            black_box(repo.find_last().unwrap())
        })
    });

    let repo = KvBlockRepository::new(Box::new(InMemoryKVStore::new()));
    for block in chain(1_000, 10) {
        repo.save(&block).unwrap();
    }
    group.throughput(Throughput::Elements(1));
    group.bench_function("find_by_height_1000", |b| {
        let mut rng = rand::thread_rng();
        b.iter(|| {
            let height = rng.gen_range(0..=1_000);
            black_box(repo.find_by_height(height).unwrap())
        })
    });

    group.finish();
}

// ============================================================================
// Shared types
// ============================================================================

fn bench_tx_root(c: &mut Criterion) {
    let mut group = c.benchmark_group("shared-types-tx-root");

    for size in [1usize, 10, 100, 1_000] {
        let txs = transactions(size);
        group.throughput(Throughput::Elements(size as u64));
        group.bench_with_input(BenchmarkId::new("compute_tx_root", size), &txs, |b, txs| {
            b.iter(|| black_box(compute_tx_root(black_box(txs))))
        });
    }

    group.finish();
}

criterion_group!(pbft_benches, bench_quorum, bench_vote_pool);
criterion_group!(blockchain_benches, bench_block_repository, bench_tx_root);
criterion_main!(pbft_benches, blockchain_benches);
