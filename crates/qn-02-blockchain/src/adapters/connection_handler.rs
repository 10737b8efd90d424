use crate::domain::{BlockchainError, BlockchainResult};
use crate::service::BlockApi;
use shared_types::ConnectionSavedEvent;
use std::sync::Arc;
use tracing::info;

/// Reacts to newly recorded peer connections.
pub struct ConnectionEventHandler {
    api: Arc<BlockApi>,
}

impl ConnectionEventHandler {
    pub fn new(api: Arc<BlockApi>) -> Self {
        Self { api }
    }

    /// Returns the local chain height offered to the new peer.
    pub fn handle_connection_saved(
        &self,
        event: &ConnectionSavedEvent,
    ) -> BlockchainResult<Option<u64>> {
        if event.id.trim().is_empty() {
            return Err(BlockchainError::NoEventId);
        }

        let height = self.api.last_block()?.map(|b| b.height());
        info!(
            "[qn-02] Peer {} ({}) connected, local height {:?}",
            event.id, event.address, height
        );
        Ok(height)
    }
}
