use super::*;
use crate::adapters::{CommandService, InMemoryLeaderRepository, InMemoryPeerRepository};
use serde::Serialize;
use shared_bus::testing::RecordingPublisher;
use shared_types::{ConnectionSavedEvent, DeliverCommand, Leader, Peer, ViewId};

struct Node {
    deps: P2pDependencies,
    peers: Arc<InMemoryPeerRepository>,
    leaders: Arc<InMemoryLeaderRepository>,
    publisher: Arc<RecordingPublisher>,
}

fn node() -> Node {
    let peers = Arc::new(InMemoryPeerRepository::new());
    let leaders = Arc::new(InMemoryLeaderRepository::new());
    let publisher = Arc::new(RecordingPublisher::new());
    let deps = P2pDependencies {
        local_id: PeerId::from("n1"),
        gateway: Arc::new(CommandService::new(publisher.clone())),
        peers: peers.clone(),
        leaders: leaders.clone(),
        publisher: publisher.clone(),
    };
    Node {
        deps,
        peers,
        leaders,
        publisher,
    }
}

fn received<T: Serialize>(sender: &str, protocol: &str, body: &T) -> ReceivedMessage {
    ReceivedMessage {
        sender: PeerId::from(sender),
        protocol: protocol.to_string(),
        body: serde_json::to_vec(body).unwrap(),
    }
}

fn delivered(publisher: &RecordingPublisher) -> Vec<DeliverCommand> {
    publisher
        .on_topic(topics::MESSAGE_DELIVER)
        .into_iter()
        .filter_map(|e| match e.payload {
            BusPayload::Deliver(command) => Some(command),
            _ => None,
        })
        .collect()
}

// =============================================================================
// Leader info
// =============================================================================

#[tokio::test]
async fn test_leader_request_answered_with_known_leader() {
    let n = node();
    n.leaders.set_leader(Leader::new("n1", ViewId(2)));
    let handler = PeerCommandHandler::new(&n.deps);

    let outcome = handler
        .handle(&received(
            "n2",
            protocols::LEADER_INFO_REQUEST,
            &LeaderInfoRequestMessage::default(),
        ))
        .await
        .unwrap();

    assert_eq!(outcome, CommandOutcome::LeaderInfoSent);
    let commands = delivered(&n.publisher);
    assert_eq!(commands.len(), 1);
    assert_eq!(commands[0].recipients, vec![PeerId::from("n2")]);
    assert_eq!(commands[0].protocol, protocols::LEADER_INFO_DELIVER);
}

#[tokio::test]
async fn test_leader_request_without_leader_is_ignored() {
    let n = node();
    let handler = PeerCommandHandler::new(&n.deps);

    let outcome = handler
        .handle(&received(
            "n2",
            protocols::LEADER_INFO_REQUEST,
            &LeaderInfoRequestMessage::default(),
        ))
        .await
        .unwrap();

    assert_eq!(outcome, CommandOutcome::Ignored);
    assert_eq!(n.publisher.count(), 0);
}

#[tokio::test]
async fn test_delivered_leader_adopted_and_announced() {
    let n = node();
    let handler = PeerCommandHandler::new(&n.deps);
    let leader = Leader::new("n3", ViewId(4));

    let outcome = handler
        .handle(&received(
            "n3",
            protocols::LEADER_INFO_DELIVER,
            &LeaderInfoDeliverMessage {
                leader: leader.clone(),
            },
        ))
        .await
        .unwrap();

    assert_eq!(outcome, CommandOutcome::LeaderUpdated(leader.clone()));
    assert_eq!(n.leaders.get_leader(), Some(leader.clone()));

    let events = n.publisher.on_topic(topics::LEADER_CHANGED);
    assert_eq!(events.len(), 1);
    assert_eq!(events[0].exchange, exchanges::EVENT);
    assert_eq!(
        events[0].payload,
        BusPayload::LeaderChanged(LeaderChangedEvent::from(&leader))
    );
}

#[tokio::test]
async fn test_stale_or_repeated_leader_ignored() {
    let n = node();
    n.leaders.set_leader(Leader::new("n2", ViewId(5)));
    let handler = PeerCommandHandler::new(&n.deps);

    for leader in [Leader::new("n3", ViewId(4)), Leader::new("n2", ViewId(5))] {
        let outcome = handler
            .handle(&received(
                "n3",
                protocols::LEADER_INFO_DELIVER,
                &LeaderInfoDeliverMessage { leader },
            ))
            .await
            .unwrap();
        assert_eq!(outcome, CommandOutcome::Ignored);
    }
    assert_eq!(n.leaders.get_leader(), Some(Leader::new("n2", ViewId(5))));
    assert_eq!(n.publisher.count(), 0);
}

#[tokio::test]
async fn test_delivered_empty_leader_rejected() {
    let n = node();
    let handler = PeerCommandHandler::new(&n.deps);

    let result = handler
        .handle(&received(
            "n3",
            protocols::LEADER_INFO_DELIVER,
            &LeaderInfoDeliverMessage {
                leader: Leader::new("", ViewId(1)),
            },
        ))
        .await;
    assert_eq!(result, Err(P2pError::EmptyLeaderId));
    assert!(n.leaders.get_leader().is_none());
}

// =============================================================================
// Peer lists
// =============================================================================

#[tokio::test]
async fn test_peer_list_request_excludes_requester() {
    let n = node();
    n.peers.save(Peer::new("n2", "b"));
    n.peers.save(Peer::new("n3", "c"));
    let handler = PeerCommandHandler::new(&n.deps);

    let outcome = handler
        .handle(&received(
            "n2",
            protocols::PEER_LIST_REQUEST,
            &PeerListRequestMessage::default(),
        ))
        .await
        .unwrap();

    assert_eq!(outcome, CommandOutcome::PeerListSent(1));
    let commands = delivered(&n.publisher);
    let body: PeerListDeliverMessage = serde_json::from_slice(&commands[0].body).unwrap();
    assert_eq!(body.peers, vec![Peer::new("n3", "c")]);
}

#[tokio::test]
async fn test_peer_list_request_with_no_peers_is_ignored() {
    let n = node();
    let handler = PeerCommandHandler::new(&n.deps);

    let outcome = handler
        .handle(&received(
            "n2",
            protocols::PEER_LIST_REQUEST,
            &PeerListRequestMessage::default(),
        ))
        .await
        .unwrap();
    assert_eq!(outcome, CommandOutcome::Ignored);
    assert_eq!(n.publisher.count(), 0);
}

#[tokio::test]
async fn test_delivered_peers_stored_without_self() {
    let n = node();
    n.peers.save(Peer::new("n2", "b"));
    let handler = PeerCommandHandler::new(&n.deps);

    let outcome = handler
        .handle(&received(
            "n2",
            protocols::PEER_LIST_DELIVER,
            &PeerListDeliverMessage {
                peers: vec![
                    Peer::new("n1", "self"),
                    Peer::new("n2", "b"),
                    Peer::new("n4", "d"),
                    Peer::new("", "nobody"),
                ],
            },
        ))
        .await
        .unwrap();

    assert_eq!(outcome, CommandOutcome::PeersStored(1));
    assert_eq!(n.peers.len(), 2);
    assert!(n.peers.find_by_id(&PeerId::from("n1")).is_none());
}

// =============================================================================
// Malformed traffic
// =============================================================================

#[tokio::test]
async fn test_unknown_protocol_ignored() {
    let n = node();
    let handler = PeerCommandHandler::new(&n.deps);

    let outcome = handler
        .handle(&received("n2", "GossipProtocol", &()))
        .await
        .unwrap();
    assert_eq!(outcome, CommandOutcome::Ignored);
}

#[tokio::test]
async fn test_malformed_body_rejected() {
    let n = node();
    let handler = PeerCommandHandler::new(&n.deps);

    let message = ReceivedMessage {
        sender: PeerId::from("n2"),
        protocol: protocols::PEER_LIST_DELIVER.to_string(),
        body: b"not json".to_vec(),
    };
    assert!(matches!(
        handler.handle(&message).await,
        Err(P2pError::Decode { .. })
    ));
}

#[tokio::test]
async fn test_anonymous_sender_rejected() {
    let n = node();
    let handler = PeerCommandHandler::new(&n.deps);

    let result = handler
        .handle(&received(
            "",
            protocols::LEADER_INFO_REQUEST,
            &LeaderInfoRequestMessage::default(),
        ))
        .await;
    assert_eq!(result, Err(P2pError::EmptyPeerId));
}

// =============================================================================
// Local events
// =============================================================================

#[tokio::test]
async fn test_connection_saved_stores_peer_and_asks_for_leader() {
    let n = node();
    let events = P2pEventHandler::new(&n.deps);
    let event = ConnectionSavedEvent {
        id: "n2".to_string(),
        address: "10.0.0.2:7000".to_string(),
    };

    assert_eq!(events.handle_connection_saved(&event).await, Ok(true));
    assert_eq!(events.handle_connection_saved(&event).await, Ok(false));

    let commands = delivered(&n.publisher);
    assert_eq!(commands.len(), 2);
    assert!(commands
        .iter()
        .all(|c| c.protocol == protocols::LEADER_INFO_REQUEST));
}

#[tokio::test]
async fn test_connection_saved_with_known_leader_sends_nothing() {
    let n = node();
    n.leaders.set_leader(Leader::new("n1", ViewId(1)));
    let events = P2pEventHandler::new(&n.deps);

    events
        .handle_connection_saved(&ConnectionSavedEvent {
            id: "n2".to_string(),
            address: "b".to_string(),
        })
        .await
        .unwrap();
    assert_eq!(n.publisher.count(), 0);
    assert_eq!(n.peers.len(), 1);
}

#[tokio::test]
async fn test_local_events_require_ids() {
    let n = node();
    let events = P2pEventHandler::new(&n.deps);

    assert_eq!(
        events
            .handle_connection_saved(&ConnectionSavedEvent {
                id: String::new(),
                address: "b".to_string(),
            })
            .await,
        Err(P2pError::NoEventId)
    );
    assert_eq!(
        events.handle_leader_changed(&LeaderChangedEvent {
            id: " ".to_string(),
            view_id: ViewId(1),
        }),
        Err(P2pError::NoEventId)
    );

    events
        .handle_leader_changed(&LeaderChangedEvent {
            id: "n2".to_string(),
            view_id: ViewId(3),
        })
        .unwrap();
    assert_eq!(n.leaders.get_leader(), Some(Leader::new("n2", ViewId(3))));
}
