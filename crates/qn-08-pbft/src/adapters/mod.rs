//! Adapters layer

pub mod broadcaster;
pub mod vote_repository;

pub use broadcaster::BusBroadcaster;
pub use vote_repository::InMemoryVoteRepository;
