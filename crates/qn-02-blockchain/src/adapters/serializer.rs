use crate::domain::{BlockchainError, BlockchainResult};
use crate::ports::BlockSerializer;
use shared_types::Block;

/// Default block serializer using bincode.
#[derive(Default)]
pub struct BincodeBlockSerializer;

impl BlockSerializer for BincodeBlockSerializer {
    fn serialize(&self, block: &Block) -> BlockchainResult<Vec<u8>> {
        bincode::serialize(block).map_err(|e| BlockchainError::Serialization(e.to_string()))
    }

    fn deserialize(&self, data: &[u8]) -> BlockchainResult<Block> {
        bincode::deserialize(data).map_err(|e| BlockchainError::Serialization(e.to_string()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use shared_types::{PeerId, Transaction, ZERO_HASH};

    #[test]
    fn test_truncated_bytes_fail() {
        let serializer = BincodeBlockSerializer;
        let block = Block::new(
            0,
            ZERO_HASH,
            PeerId::from("n1"),
            7,
            vec![Transaction::new("t1", vec![1, 2], 3)],
        );
        let bytes = serializer.serialize(&block).unwrap();

        assert_eq!(serializer.deserialize(&bytes).unwrap(), block);
        assert!(matches!(
            serializer.deserialize(&bytes[..bytes.len() / 2]),
            Err(BlockchainError::Serialization(_))
        ));
    }
}
