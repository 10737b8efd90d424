//! # Node Configuration
//!
//! Unified configuration for all subsystems and runtime parameters.
//!
//! Every section has a `Default`. Environment variables override single
//! fields; an invalid value is reported and the previous value kept.
//!
//! | Variable | Field |
//! |----------|-------|
//! | `QN_PEER_ID` | `node.peer_id` |
//! | `QN_ADDRESS` | `node.address` |
//! | `QN_ENGINE_MODE` | `consensus.engine_mode` (`solo` / `pbft`) |
//! | `QN_ROUND_TIMEOUT_SECS` | `consensus.round_timeout_secs` |
//! | `QN_COMMITTEE` | `consensus.committee` (comma separated) |
//! | `QN_LEADER` | `consensus.leader` |
//! | `QN_MAX_TXS_PER_BLOCK` | `consensus.max_txs_per_block` |
//! | `QN_PROPOSAL_INTERVAL_MS` | `txpool.proposal_interval_ms` |
//! | `QN_DATA_DIR` | `storage.data_dir` |
//! | `QN_EPHEMERAL` | `storage.ephemeral` |
//! | `QN_RPC_TIMEOUT_MS` | `rpc.call_timeout_ms` |
//! | `QN_LOG_LEVEL` | `logging.level` |

use qn_02_blockchain::{EngineMode, GenesisConfig as ChainGenesis};
use shared_types::{Leader, PeerId, ViewId};
use std::path::PathBuf;
use std::str::FromStr;
use std::time::Duration;
use thiserror::Error;
use tracing::warn;

/// Complete node configuration.
#[derive(Debug, Clone, Default)]
pub struct NodeConfig {
    pub node: NodeIdentityConfig,
    pub consensus: ConsensusConfig,
    pub txpool: TxPoolConfig,
    pub storage: StorageConfig,
    pub rpc: RpcConfig,
    pub genesis: GenesisConfig,
    pub logging: LoggingConfig,
}

/// Configuration errors.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ConfigError {
    #[error("Invalid value {value:?} for {key}: {reason}")]
    InvalidValue {
        key: &'static str,
        value: String,
        reason: String,
    },

    #[error("Peer id must not be empty")]
    EmptyPeerId,

    #[error("Committee must not be empty")]
    EmptyCommittee,

    #[error("Leader {0} is not a committee member")]
    LeaderNotInCommittee(PeerId),

    #[error("{0} must be greater than zero")]
    Zero(&'static str),
}

impl NodeConfig {
    /// Defaults overridden by the process environment.
    pub fn from_env() -> Self {
        let mut config = Self::default();
        for err in config.apply_env(|key| std::env::var(key).ok()) {
            warn!("Ignoring configuration override: {}", err);
        }
        config
    }

    /// Apply overrides from `lookup`. Returns one error per rejected value.
    pub fn apply_env<F>(&mut self, lookup: F) -> Vec<ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let mut errors = Vec::new();

        if let Some(id) = lookup("QN_PEER_ID") {
            if id.trim().is_empty() {
                errors.push(ConfigError::EmptyPeerId);
            } else {
                self.node.peer_id = PeerId::new(id.trim());
            }
        }
        if let Some(address) = lookup("QN_ADDRESS") {
            self.node.address = address;
        }
        if let Some(mode) = lookup("QN_ENGINE_MODE") {
            match EngineMode::from_str(&mode) {
                Ok(mode) => self.consensus.engine_mode = mode,
                Err(e) => errors.push(invalid("QN_ENGINE_MODE", &mode, e)),
            }
        }
        parse_into(
            &lookup,
            "QN_ROUND_TIMEOUT_SECS",
            &mut self.consensus.round_timeout_secs,
            &mut errors,
        );
        parse_into(
            &lookup,
            "QN_MAX_TXS_PER_BLOCK",
            &mut self.consensus.max_txs_per_block,
            &mut errors,
        );
        parse_into(
            &lookup,
            "QN_PROPOSAL_INTERVAL_MS",
            &mut self.txpool.proposal_interval_ms,
            &mut errors,
        );
        parse_into(
            &lookup,
            "QN_RPC_TIMEOUT_MS",
            &mut self.rpc.call_timeout_ms,
            &mut errors,
        );
        parse_into(&lookup, "QN_EPHEMERAL", &mut self.storage.ephemeral, &mut errors);

        if let Some(committee) = lookup("QN_COMMITTEE") {
            let members: Vec<PeerId> = committee
                .split(',')
                .map(str::trim)
                .filter(|id| !id.is_empty())
                .map(PeerId::new)
                .collect();
            if members.is_empty() {
                errors.push(ConfigError::EmptyCommittee);
            } else {
                self.consensus.committee = members;
            }
        }
        if let Some(leader) = lookup("QN_LEADER") {
            if leader.trim().is_empty() {
                errors.push(ConfigError::EmptyPeerId);
            } else {
                self.consensus.leader = Some(PeerId::new(leader.trim()));
            }
        }
        if let Some(dir) = lookup("QN_DATA_DIR") {
            self.storage.data_dir = PathBuf::from(dir);
        }
        if let Some(level) = lookup("QN_LOG_LEVEL") {
            self.logging.level = level;
        }

        errors
    }

    /// Check cross-field constraints before the node is built.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.node.peer_id.is_empty() {
            return Err(ConfigError::EmptyPeerId);
        }
        if self.consensus.round_timeout_secs == 0 {
            return Err(ConfigError::Zero("consensus.round_timeout_secs"));
        }
        if self.consensus.max_txs_per_block == 0 {
            return Err(ConfigError::Zero("consensus.max_txs_per_block"));
        }
        if self.txpool.proposal_interval_ms == 0 {
            return Err(ConfigError::Zero("txpool.proposal_interval_ms"));
        }
        let leader = self.initial_leader().leader_id;
        if !self.committee_members().contains(&leader) {
            return Err(ConfigError::LeaderNotInCommittee(leader));
        }
        Ok(())
    }

    /// Configured committee plus the local node.
    pub fn committee_members(&self) -> Vec<PeerId> {
        let mut members = self.consensus.committee.clone();
        members.push(self.node.peer_id.clone());
        members.sort();
        members.dedup();
        members
    }

    /// Leader of the first view: the configured one, else the lowest
    /// committee member, so every node picks the same one.
    pub fn initial_leader(&self) -> Leader {
        let leader_id = self
            .consensus
            .leader
            .clone()
            .or_else(|| self.committee_members().into_iter().next())
            .unwrap_or_else(|| self.node.peer_id.clone());
        Leader {
            leader_id,
            view_id: ViewId(1),
        }
    }

    pub fn pbft(&self) -> qn_08_pbft::ConsensusConfig {
        qn_08_pbft::ConsensusConfig {
            round_timeout: Duration::from_secs(self.consensus.round_timeout_secs),
            sweep_interval: Duration::from_millis(self.consensus.sweep_interval_ms),
        }
    }

    pub fn proposal(&self) -> qn_06_txpool::ProposalConfig {
        qn_06_txpool::ProposalConfig {
            max_txs_per_block: self.consensus.max_txs_per_block,
            interval: Duration::from_millis(self.txpool.proposal_interval_ms),
        }
    }

    pub fn chain_genesis(&self) -> ChainGenesis {
        ChainGenesis {
            timestamp: self.genesis.timestamp,
            creator: self.genesis.creator.clone(),
        }
    }
}

fn invalid(key: &'static str, value: &str, reason: impl ToString) -> ConfigError {
    ConfigError::InvalidValue {
        key,
        value: value.to_string(),
        reason: reason.to_string(),
    }
}

fn parse_into<F, T>(lookup: &F, key: &'static str, target: &mut T, errors: &mut Vec<ConfigError>)
where
    F: Fn(&str) -> Option<String>,
    T: FromStr,
    T::Err: ToString,
{
    if let Some(raw) = lookup(key) {
        match raw.trim().parse() {
            Ok(value) => *target = value,
            Err(e) => errors.push(invalid(key, &raw, e)),
        }
    }
}

/// Identity of this node.
#[derive(Debug, Clone)]
pub struct NodeIdentityConfig {
    pub peer_id: PeerId,
    /// Network address advertised to peers (IP:Port).
    pub address: String,
}

impl Default for NodeIdentityConfig {
    fn default() -> Self {
        Self {
            peer_id: PeerId::new("node-1"),
            address: "127.0.0.1:30303".to_string(),
        }
    }
}

/// Consensus configuration.
#[derive(Debug, Clone)]
pub struct ConsensusConfig {
    pub engine_mode: EngineMode,
    /// Rounds not committed within this many seconds are abandoned.
    pub round_timeout_secs: u64,
    pub sweep_interval_ms: u64,
    pub max_txs_per_block: usize,
    /// Other committee members. The local node is always a member.
    pub committee: Vec<PeerId>,
    /// Leader of the first view.
    pub leader: Option<PeerId>,
}

impl Default for ConsensusConfig {
    fn default() -> Self {
        Self {
            engine_mode: EngineMode::Pbft,
            round_timeout_secs: 30,
            sweep_interval_ms: 1_000,
            max_txs_per_block: 100,
            committee: Vec::new(),
            leader: None,
        }
    }
}

/// Transaction pool configuration.
#[derive(Debug, Clone)]
pub struct TxPoolConfig {
    pub proposal_interval_ms: u64,
}

impl Default for TxPoolConfig {
    fn default() -> Self {
        Self {
            proposal_interval_ms: 2_000,
        }
    }
}

/// Storage configuration.
#[derive(Debug, Clone)]
pub struct StorageConfig {
    /// Data directory for the block store.
    pub data_dir: PathBuf,
    /// Delete `data_dir` on shutdown.
    pub ephemeral: bool,
}

impl Default for StorageConfig {
    fn default() -> Self {
        Self {
            data_dir: PathBuf::from("./db"),
            ephemeral: true,
        }
    }
}

impl StorageConfig {
    pub fn block_file(&self) -> PathBuf {
        self.data_dir.join("blocks.db")
    }
}

/// RPC gateway configuration.
#[derive(Debug, Clone)]
pub struct RpcConfig {
    pub call_timeout_ms: u64,
}

impl Default for RpcConfig {
    fn default() -> Self {
        Self {
            call_timeout_ms: 5_000,
        }
    }
}

impl RpcConfig {
    pub fn call_timeout(&self) -> Duration {
        Duration::from_millis(self.call_timeout_ms)
    }
}

/// Genesis block parameters.
#[derive(Debug, Clone)]
pub struct GenesisConfig {
    pub timestamp: u64,
    pub creator: PeerId,
}

impl Default for GenesisConfig {
    fn default() -> Self {
        Self {
            timestamp: 0,
            creator: PeerId::new("genesis"),
        }
    }
}

/// Logging configuration.
#[derive(Debug, Clone)]
pub struct LoggingConfig {
    /// `EnvFilter` directive, e.g. `info` or `qn_08_pbft=debug,info`.
    pub level: String,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: "info".to_string(),
        }
    }
}
