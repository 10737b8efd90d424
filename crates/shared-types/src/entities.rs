//! # Core Domain Entities
//!
//! Defines the chain entities shared by every subsystem of the node.
//!
//! ## Clusters
//!
//! - **Identity**: `PeerId`, `TxId`, `ViewId`
//! - **Chain**: `Block`, `BlockHeader`, `Transaction`
//! - **Networking**: `Peer`, `Leader`

use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};
use std::fmt;

/// A 32-byte SHA-256 hash.
pub type Hash = [u8; 32];

/// The all-zero hash used as the parent of the genesis block.
pub const ZERO_HASH: Hash = [0u8; 32];

/// Hex representation of a hash, used as the wire/event identifier of a block.
pub fn hash_hex(hash: &Hash) -> String {
    hex::encode(hash)
}

/// Short hash prefix for log lines.
pub fn short_hash(hash: &Hash) -> String {
    hex::encode(&hash[..4])
}

// =============================================================================
// CLUSTER A: IDENTITY
// =============================================================================

/// Identifier of a peer (also used for connection ids and leader ids).
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize, Default)]
pub struct PeerId(pub String);

impl PeerId {
    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// True when the identifier is empty (or whitespace only).
    pub fn is_empty(&self) -> bool {
        self.0.trim().is_empty()
    }
}

impl fmt::Display for PeerId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<&str> for PeerId {
    fn from(id: &str) -> Self {
        Self::new(id)
    }
}

/// Unique transaction identifier.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize, Default)]
pub struct TxId(pub String);

impl TxId {
    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    pub fn is_empty(&self) -> bool {
        self.0.trim().is_empty()
    }
}

impl fmt::Display for TxId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<&str> for TxId {
    fn from(id: &str) -> Self {
        Self::new(id)
    }
}

/// Leader epoch. Changes only on leader rotation.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize, Default,
)]
pub struct ViewId(pub u64);

impl ViewId {
    pub fn next(self) -> Self {
        Self(self.0 + 1)
    }
}

impl fmt::Display for ViewId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "v{}", self.0)
    }
}

// =============================================================================
// CLUSTER B: THE CHAIN
// =============================================================================

/// Lifecycle of a transaction inside the pool.
///
/// ```text
/// [Queued] ──propose──→ [Proposed] ──commit──→ [Committed]
///                           │
///                           └── round abandoned ──→ [Queued]
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
pub enum TxStatus {
    #[default]
    Queued,
    Proposed,
    Committed,
}

/// A client transaction.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Transaction {
    pub id: TxId,
    pub payload: Vec<u8>,
    pub status: TxStatus,
    /// Unix timestamp (milliseconds) when the transaction entered the node.
    pub timestamp: u64,
}

impl Transaction {
    pub fn new(id: impl Into<String>, payload: Vec<u8>, timestamp: u64) -> Self {
        Self {
            id: TxId::new(id),
            payload,
            status: TxStatus::Queued,
            timestamp,
        }
    }

    /// Digest of the transaction contents (status excluded).
    pub fn digest(&self) -> Hash {
        let mut hasher = Sha256::new();
        hasher.update(self.id.as_str().as_bytes());
        hasher.update(&self.payload);
        hasher.update(self.timestamp.to_le_bytes());
        hasher.finalize().into()
    }
}

/// The header of a block.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, Default)]
pub struct BlockHeader {
    /// Block height in the chain (genesis is 0).
    pub height: u64,
    /// Hash of the previous block.
    pub prev_hash: Hash,
    /// Unix timestamp (milliseconds) when the block was created.
    pub timestamp: u64,
    /// Peer that created the block.
    pub creator: PeerId,
    /// Root over the transaction digests.
    pub tx_root: Hash,
}

impl BlockHeader {
    /// SHA-256 over all header fields.
    pub fn hash(&self) -> Hash {
        let mut hasher = Sha256::new();
        hasher.update(self.height.to_le_bytes());
        hasher.update(self.prev_hash);
        hasher.update(self.timestamp.to_le_bytes());
        hasher.update(self.creator.as_str().as_bytes());
        hasher.update(self.tx_root);
        hasher.finalize().into()
    }
}

/// A candidate or committed chain element.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, Default)]
pub struct Block {
    pub header: BlockHeader,
    pub transactions: Vec<Transaction>,
}

impl Block {
    /// Build a block on top of `prev_hash`, computing the transaction root.
    pub fn new(
        height: u64,
        prev_hash: Hash,
        creator: PeerId,
        timestamp: u64,
        transactions: Vec<Transaction>,
    ) -> Self {
        let tx_root = compute_tx_root(&transactions);
        Self {
            header: BlockHeader {
                height,
                prev_hash,
                timestamp,
                creator,
                tx_root,
            },
            transactions,
        }
    }

    pub fn hash(&self) -> Hash {
        self.header.hash()
    }

    pub fn height(&self) -> u64 {
        self.header.height
    }

    pub fn is_genesis(&self) -> bool {
        self.header.height == 0 && self.header.prev_hash == ZERO_HASH
    }

    pub fn tx_ids(&self) -> Vec<TxId> {
        self.transactions.iter().map(|tx| tx.id.clone()).collect()
    }

    /// Checks the header's transaction root against the body.
    pub fn verify_tx_root(&self) -> bool {
        compute_tx_root(&self.transactions) == self.header.tx_root
    }
}

/// Sequential SHA-256 fold over the transaction digests.
pub fn compute_tx_root(transactions: &[Transaction]) -> Hash {
    let mut hasher = Sha256::new();
    for tx in transactions {
        hasher.update(tx.digest());
    }
    hasher.finalize().into()
}

// =============================================================================
// CLUSTER C: NETWORKING
// =============================================================================

/// A known peer of the network.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Peer {
    pub peer_id: PeerId,
    /// Network address (IP:Port).
    pub address: String,
}

impl Peer {
    pub fn new(peer_id: impl Into<String>, address: impl Into<String>) -> Self {
        Self {
            peer_id: PeerId::new(peer_id),
            address: address.into(),
        }
    }
}

/// The node currently responsible for proposing blocks, and the view it leads.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, Default)]
pub struct Leader {
    pub leader_id: PeerId,
    pub view_id: ViewId,
}

impl Leader {
    pub fn new(leader_id: impl Into<String>, view_id: ViewId) -> Self {
        Self {
            leader_id: PeerId::new(leader_id),
            view_id,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn tx(id: &str) -> Transaction {
        Transaction::new(id, id.as_bytes().to_vec(), 1_000)
    }

    #[test]
    fn test_block_hash_is_deterministic() {
        let a = Block::new(1, [7u8; 32], PeerId::from("n1"), 42, vec![tx("a")]);
        let b = Block::new(1, [7u8; 32], PeerId::from("n1"), 42, vec![tx("a")]);
        assert_eq!(a.hash(), b.hash());
    }

    #[test]
    fn test_block_hash_covers_transactions() {
        let a = Block::new(1, ZERO_HASH, PeerId::from("n1"), 42, vec![tx("a")]);
        let b = Block::new(1, ZERO_HASH, PeerId::from("n1"), 42, vec![tx("b")]);
        assert_ne!(a.hash(), b.hash());
    }

    #[test]
    fn test_tx_root_ignores_status() {
        let mut proposed = tx("a");
        proposed.status = TxStatus::Proposed;
        assert_eq!(compute_tx_root(&[tx("a")]), compute_tx_root(&[proposed]));
    }

    #[test]
    fn test_verify_tx_root_detects_tampering() {
        let mut block = Block::new(3, ZERO_HASH, PeerId::from("n1"), 1, vec![tx("a")]);
        assert!(block.verify_tx_root());
        block.transactions.push(tx("b"));
        assert!(!block.verify_tx_root());
    }

    #[test]
    fn test_genesis_detection() {
        let genesis = Block::new(0, ZERO_HASH, PeerId::default(), 0, vec![]);
        assert!(genesis.is_genesis());
        let next = Block::new(1, genesis.hash(), PeerId::default(), 0, vec![]);
        assert!(!next.is_genesis());
    }

    #[test]
    fn test_empty_ids() {
        assert!(PeerId::new("").is_empty());
        assert!(PeerId::new("  ").is_empty());
        assert!(!PeerId::new("p1").is_empty());
        assert!(TxId::new("").is_empty());
    }

    #[test]
    fn test_view_next() {
        assert_eq!(ViewId(4).next(), ViewId(5));
    }
}
