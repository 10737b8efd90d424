//! # Subsystem Container
//!
//! Holds all subsystem instances and the shared infrastructure they talk
//! through.
//!
//! ## Initialization Order
//!
//! ```text
//! Level 0: Bus, RPC gateway, committee
//! Level 1: Blockchain (block store, block API)
//! Level 2: Consensus (finalizes through the block API)
//! Level 3: Propose handler (starts consensus), registered on block.propose
//! Level 4: Transaction pool, P2P command gateway
//! ```
//!
//! Blockchain and consensus refer to each other only through the
//! `ChainFinalizer` and `CoordinatorStarter` adapters, so construction order
//! breaks the cycle.

use std::fs;
use std::sync::Arc;

use anyhow::{Context, Result};
use tracing::info;

use qn_01_p2p::{
    CommandService, InMemoryLeaderRepository as PeerLeaderRepository, InMemoryPeerRepository,
    P2pDependencies, P2pEventHandler, PeerCommandHandler,
};
use qn_02_blockchain::{
    BlockApi, BlockApiDependencies, BlockProposeCommandHandler, ConnectionEventHandler,
    EngineMode, FileBackedKVStore, InMemoryBlockPool, KvBlockRepository, SystemTimeSource,
};
use qn_06_txpool::{
    InMemoryLeaderRepository as TxLeaderRepository, InMemoryTransactionRepository,
    MessageDispatcher, ProposalDependencies, ProposalService, RepositoryProjector,
    TxEventHandler,
};
use qn_08_pbft::{
    BusBroadcaster, Committee, ConsensusCoordinator, ConsensusDependencies,
    InMemoryVoteRepository,
};
use shared_bus::{methods, InMemoryBus, RpcServer};

use crate::adapters::{ChainFinalizer, CoordinatorStarter};
use crate::container::config::NodeConfig;

/// Central container holding all subsystem instances.
pub struct SubsystemContainer {
    pub config: NodeConfig,

    // =========================================================================
    // SHARED INFRASTRUCTURE
    // =========================================================================
    pub bus: Arc<InMemoryBus>,
    pub rpc: Arc<RpcServer>,
    pub committee: Arc<Committee>,

    // =========================================================================
    // BLOCKCHAIN (Subsystem 2)
    // =========================================================================
    pub block_api: Arc<BlockApi>,
    pub propose_handler: Arc<BlockProposeCommandHandler>,
    pub connection_handler: Arc<ConnectionEventHandler>,

    // =========================================================================
    // CONSENSUS (Subsystem 8)
    // =========================================================================
    pub coordinator: Arc<ConsensusCoordinator>,

    // =========================================================================
    // TRANSACTION POOL (Subsystem 6)
    // =========================================================================
    pub transactions: Arc<InMemoryTransactionRepository>,
    pub tx_leaders: Arc<TxLeaderRepository>,
    pub proposal: Arc<ProposalService>,
    pub projector: Arc<RepositoryProjector>,
    pub tx_events: Arc<TxEventHandler>,

    // =========================================================================
    // P2P (Subsystem 1)
    // =========================================================================
    pub peers: Arc<InMemoryPeerRepository>,
    pub peer_leaders: Arc<PeerLeaderRepository>,
    pub peer_commands: Arc<PeerCommandHandler>,
    pub p2p_events: Arc<P2pEventHandler>,
}

impl SubsystemContainer {
    /// Build every subsystem from `config`.
    pub fn new(config: NodeConfig) -> Result<Self> {
        config.validate().context("Invalid node configuration")?;
        let local_id = config.node.peer_id.clone();
        let leader = config.initial_leader();

        info!("Initializing subsystems for node {}...", local_id);

        // Level 0
        let bus = Arc::new(InMemoryBus::new());
        let rpc = Arc::new(RpcServer::with_timeout(config.rpc.call_timeout()));
        let committee = Arc::new(Committee::new(
            local_id.clone(),
            config.committee_members(),
            leader.clone(),
        ));
        info!(
            "  [0] Committee of {} ({} leads {})",
            committee.size(),
            leader.leader_id,
            leader.view_id
        );

        // Level 1
        fs::create_dir_all(&config.storage.data_dir).with_context(|| {
            format!(
                "Failed to create data directory {}",
                config.storage.data_dir.display()
            )
        })?;
        let block_file = config.storage.block_file();
        let store = FileBackedKVStore::open(&block_file)
            .with_context(|| format!("Failed to open block store {}", block_file.display()))?;
        let block_api = Arc::new(BlockApi::new(BlockApiDependencies {
            local_id: local_id.clone(),
            repository: Arc::new(KvBlockRepository::new(Box::new(store))),
            pool: Arc::new(InMemoryBlockPool::new()),
            publisher: bus.clone(),
            time_source: Arc::new(SystemTimeSource),
        }));
        let connection_handler = Arc::new(ConnectionEventHandler::new(block_api.clone()));
        info!("  [2] Blockchain initialized ({})", block_file.display());

        // Level 2
        let coordinator = Arc::new(ConsensusCoordinator::new(ConsensusDependencies {
            committee: committee.clone(),
            prepare_votes: Arc::new(InMemoryVoteRepository::new()),
            commit_votes: Arc::new(InMemoryVoteRepository::new()),
            broadcaster: Arc::new(BusBroadcaster::new(bus.clone(), committee.clone())),
            finalizer: Arc::new(ChainFinalizer::new(block_api.clone())),
            config: config.pbft(),
        }));
        info!(
            "  [8] Consensus initialized (round timeout {:?})",
            config.pbft().round_timeout
        );

        // Level 3
        let mode = config.consensus.engine_mode;
        let mut propose_handler = BlockProposeCommandHandler::new(block_api.clone(), mode);
        if mode == EngineMode::Pbft {
            propose_handler = propose_handler
                .with_consensus(Arc::new(CoordinatorStarter::new(coordinator.clone())));
        }
        let propose_handler = Arc::new(propose_handler);
        rpc.register(methods::BLOCK_PROPOSE, propose_handler.clone())
            .context("Failed to register block.propose")?;
        info!("  [2] {} registered ({} mode)", methods::BLOCK_PROPOSE, mode);

        // Level 4
        let transactions = Arc::new(InMemoryTransactionRepository::new());
        let tx_leaders = Arc::new(TxLeaderRepository::with_leader(leader.clone()));
        let proposal = Arc::new(ProposalService::new(ProposalDependencies {
            local_id: local_id.clone(),
            transactions: transactions.clone(),
            leaders: tx_leaders.clone(),
            dispatcher: Arc::new(MessageDispatcher::new(rpc.clone(), bus.clone())),
            config: config.proposal(),
        }));
        let projector = Arc::new(RepositoryProjector::new(
            transactions.clone(),
            tx_leaders.clone(),
        ));
        let tx_events = Arc::new(TxEventHandler::new(transactions.clone()));
        info!(
            "  [6] Transaction pool initialized (max {} txs per block)",
            config.consensus.max_txs_per_block
        );

        let peers = Arc::new(InMemoryPeerRepository::new());
        let peer_leaders = Arc::new(PeerLeaderRepository::with_leader(leader));
        let p2p = P2pDependencies {
            local_id,
            gateway: Arc::new(CommandService::new(bus.clone())),
            peers: peers.clone(),
            leaders: peer_leaders.clone(),
            publisher: bus.clone(),
        };
        let peer_commands = Arc::new(PeerCommandHandler::new(&p2p));
        let p2p_events = Arc::new(P2pEventHandler::new(&p2p));
        info!("  [1] P2P command gateway initialized");

        Ok(Self {
            config,
            bus,
            rpc,
            committee,
            block_api,
            propose_handler,
            connection_handler,
            coordinator,
            transactions,
            tx_leaders,
            proposal,
            projector,
            tx_events,
            peers,
            peer_leaders,
            peer_commands,
            p2p_events,
        })
    }
}
