//! Adapters for the blockchain subsystem.

pub mod connection_handler;
pub mod pool;
pub mod propose_handler;
pub mod repository;
pub mod serializer;
pub mod storage;

pub use connection_handler::ConnectionEventHandler;
pub use pool::InMemoryBlockPool;
pub use propose_handler::{BlockProposeCommandHandler, ProposeBlockResponse};
pub use repository::KvBlockRepository;
pub use serializer::BincodeBlockSerializer;
pub use storage::{FileBackedKVStore, InMemoryKVStore};
