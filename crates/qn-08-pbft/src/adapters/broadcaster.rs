//! Bus-backed broadcaster.
//!
//! Wraps each consensus message in a `DeliverCommand` addressed to every
//! other committee member and publishes it on `Command`/`message.deliver`.

use crate::domain::{Committee, ConsensusMessage};
use crate::ports::ConsensusBroadcaster;
use async_trait::async_trait;
use shared_bus::{exchanges, topics, BusPayload, MessagePublisher};
use shared_types::{protocols, DeliverCommand};
use std::sync::Arc;
use tracing::debug;

pub struct BusBroadcaster {
    publisher: Arc<dyn MessagePublisher>,
    committee: Arc<Committee>,
}

impl BusBroadcaster {
    pub fn new(publisher: Arc<dyn MessagePublisher>, committee: Arc<Committee>) -> Self {
        Self {
            publisher,
            committee,
        }
    }
}

#[async_trait]
impl ConsensusBroadcaster for BusBroadcaster {
    async fn broadcast(&self, message: ConsensusMessage) -> Result<(), String> {
        let recipients = self.committee.peers();
        if recipients.is_empty() {
            return Ok(());
        }

        let msg_type = message.msg_type();
        let command = DeliverCommand::json(recipients, protocols::CONSENSUS_MESSAGE, &message)
            .map_err(|e| e.to_string())?;

        debug!(
            "[qn-08] Broadcasting {} for round {} to {} peers",
            msg_type,
            message.consensus_id(),
            command.recipients.len()
        );

        self.publisher
            .publish(
                exchanges::COMMAND,
                topics::MESSAGE_DELIVER,
                BusPayload::Deliver(command),
            )
            .await
            .map_err(|e| e.to_string())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::{ConsensusId, MessageHeader, Vote};
    use shared_bus::testing::{FailingPublisher, RecordingPublisher};
    use shared_types::{Leader, PeerId, ReceivedMessage, ViewId, ZERO_HASH};

    fn committee() -> Arc<Committee> {
        Arc::new(Committee::new(
            PeerId::from("n1"),
            ["n2", "n3"].into_iter().map(PeerId::from),
            Leader::new("n1", ViewId(0)),
        ))
    }

    fn prepare() -> ConsensusMessage {
        ConsensusMessage::Prepare(Vote {
            header: MessageHeader {
                consensus_id: ConsensusId::from("c1"),
                view_id: ViewId(0),
                sequence_id: 0,
                sender_id: PeerId::from("n1"),
                timestamp: 0,
            },
            block_hash: ZERO_HASH,
        })
    }

    #[tokio::test]
    async fn test_broadcast_addresses_other_members() {
        let publisher = Arc::new(RecordingPublisher::new());
        let broadcaster = BusBroadcaster::new(publisher.clone(), committee());

        broadcaster.broadcast(prepare()).await.unwrap();

        let published = publisher.on_topic(topics::MESSAGE_DELIVER);
        assert_eq!(published.len(), 1);
        assert_eq!(published[0].exchange, exchanges::COMMAND);
        let BusPayload::Deliver(command) = &published[0].payload else {
            panic!("expected deliver command");
        };
        assert_eq!(command.protocol, protocols::CONSENSUS_MESSAGE);
        assert_eq!(command.recipients, vec![PeerId::from("n2"), PeerId::from("n3")]);

        let received = ReceivedMessage {
            sender: PeerId::from("n1"),
            protocol: command.protocol.clone(),
            body: command.body.clone(),
        };
        let decoded: ConsensusMessage = received.decode().unwrap();
        assert_eq!(decoded, prepare());
    }

    #[tokio::test]
    async fn test_broadcast_without_peers_publishes_nothing() {
        let publisher = Arc::new(RecordingPublisher::new());
        let solo = Arc::new(Committee::solo(PeerId::from("n1")));
        let broadcaster = BusBroadcaster::new(publisher.clone(), solo);

        broadcaster.broadcast(prepare()).await.unwrap();
        assert_eq!(publisher.count(), 0);
    }

    #[tokio::test]
    async fn test_transport_error_propagates() {
        let broadcaster = BusBroadcaster::new(Arc::new(FailingPublisher), committee());
        assert!(broadcaster.broadcast(prepare()).await.is_err());
    }
}
