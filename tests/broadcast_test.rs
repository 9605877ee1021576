//! Tests for event delivery: fan-out, ordering, and player scoping.

use std::sync::Arc;

use tokio::sync::mpsc;

use matchroom::{
    ConnectionId, EngineConfig, GameEvent, LeavePolicy, MemoryStore, MovePayload, NimConfig,
    SessionEngine, SessionId, SessionStatus, Variant,
};

fn engine(pile: u32) -> SessionEngine {
    SessionEngine::new(
        EngineConfig::new(LeavePolicy::Detach, true, NimConfig::new(pile)),
        Arc::new(MemoryStore::new()),
    )
}

/// Registers a connection for `player` and returns its id plus the
/// receiving end of its event channel.
fn connect(
    engine: &SessionEngine,
    player: &str,
) -> (ConnectionId, mpsc::UnboundedReceiver<GameEvent>) {
    let (tx, rx) = mpsc::unbounded_channel();
    let connection_id = engine.broadcaster().register(player.to_string(), tx);
    (connection_id, rx)
}

fn drain(rx: &mut mpsc::UnboundedReceiver<GameEvent>) -> Vec<GameEvent> {
    let mut events = Vec::new();
    while let Ok(event) = rx.try_recv() {
        events.push(event);
    }
    events
}

async fn paired_session(engine: &SessionEngine, opener: &str, follower: &str) -> SessionId {
    let view = engine
        .join_or_create(Variant::Nim, opener.to_string())
        .await
        .expect("Join failed");
    engine
        .join(*view.session_id(), follower.to_string())
        .await
        .expect("Join failed");
    *view.session_id()
}

#[tokio::test]
async fn test_update_fans_out_to_every_subscriber() {
    let engine = engine(21);
    let (conn_a, mut rx_a) = connect(&engine, "alice");
    let (conn_b, mut rx_b) = connect(&engine, "bob");
    let session_id = paired_session(&engine, "alice", "bob").await;
    engine.broadcaster().subscribe(conn_a, session_id);
    engine.broadcaster().subscribe(conn_b, session_id);

    engine
        .submit_move(session_id, "alice".to_string(), MovePayload::nim(2))
        .await
        .expect("Move failed");

    for rx in [&mut rx_a, &mut rx_b] {
        let events = drain(rx);
        assert_eq!(events.len(), 1);
        match &events[0] {
            GameEvent::GameUpdate {
                session_id: event_session,
                snapshot,
            } => {
                assert_eq!(*event_session, session_id);
                assert_eq!(snapshot.moves().len(), 1);
            }
            other => panic!("Expected an update, got {other:?}"),
        }
    }
}

#[tokio::test]
async fn test_join_publishes_update_to_waiting_subscribers() {
    let engine = engine(21);
    let (conn_a, mut rx_a) = connect(&engine, "alice");

    let view = engine
        .join_or_create(Variant::Nim, "alice".to_string())
        .await
        .expect("Join failed");
    let session_id = *view.session_id();
    engine.broadcaster().subscribe(conn_a, session_id);

    engine
        .join(session_id, "bob".to_string())
        .await
        .expect("Join failed");

    let events = drain(&mut rx_a);
    assert_eq!(events.len(), 1);
    match &events[0] {
        GameEvent::GameUpdate { snapshot, .. } => {
            assert_eq!(*snapshot.status(), SessionStatus::InProgress);
        }
        other => panic!("Expected an update, got {other:?}"),
    }
}

#[tokio::test]
async fn test_snapshots_arrive_in_mutation_order() {
    let engine = engine(21);
    let (conn, mut rx) = connect(&engine, "watcher");
    let session_id = paired_session(&engine, "alice", "bob").await;
    engine.broadcaster().subscribe(conn, session_id);

    let script = [
        ("alice", 1),
        ("bob", 3),
        ("alice", 2),
        ("bob", 1),
        ("alice", 3),
    ];
    for (player, take) in script {
        engine
            .submit_move(session_id, player.to_string(), MovePayload::nim(take))
            .await
            .expect("Move failed");
    }

    let events = drain(&mut rx);
    assert_eq!(events.len(), script.len());
    for (index, event) in events.iter().enumerate() {
        match event {
            GameEvent::GameUpdate { snapshot, .. } => {
                assert_eq!(
                    snapshot.moves().len(),
                    index + 1,
                    "Snapshot {index} out of order"
                );
            }
            other => panic!("Expected an update, got {other:?}"),
        }
    }
}

#[tokio::test]
async fn test_rejection_reaches_only_the_offender() {
    let engine = engine(21);
    let (conn_a, mut rx_a) = connect(&engine, "alice");
    let (conn_b, mut rx_b) = connect(&engine, "bob");
    let session_id = paired_session(&engine, "alice", "bob").await;
    engine.broadcaster().subscribe(conn_a, session_id);
    engine.broadcaster().subscribe(conn_b, session_id);

    let result = engine
        .submit_move(session_id, "bob".to_string(), MovePayload::nim(1))
        .await;
    assert!(result.is_err());

    assert!(
        drain(&mut rx_a).is_empty(),
        "A rejection must stay scoped to the offender"
    );
    let events = drain(&mut rx_b);
    assert_eq!(events.len(), 1);
    match &events[0] {
        GameEvent::GameError {
            player_id, code, ..
        } => {
            assert_eq!(player_id, "bob");
            assert_eq!(code, "notYourTurn");
        }
        other => panic!("Expected an error event, got {other:?}"),
    }
}

#[tokio::test]
async fn test_unsubscribed_connection_hears_nothing() {
    let engine = engine(21);
    let (conn, mut rx) = connect(&engine, "alice");
    let session_id = paired_session(&engine, "alice", "bob").await;
    engine.broadcaster().subscribe(conn, session_id);

    engine
        .submit_move(session_id, "alice".to_string(), MovePayload::nim(1))
        .await
        .expect("Move failed");
    assert_eq!(drain(&mut rx).len(), 1);

    engine.broadcaster().unsubscribe(conn);
    engine
        .submit_move(session_id, "bob".to_string(), MovePayload::nim(1))
        .await
        .expect("Move failed");
    assert!(drain(&mut rx).is_empty());
}

#[tokio::test]
async fn test_terminal_update_carries_winners() {
    let engine = engine(2);
    let (conn, mut rx) = connect(&engine, "watcher");
    let session_id = paired_session(&engine, "alice", "bob").await;
    engine.broadcaster().subscribe(conn, session_id);

    engine
        .submit_move(session_id, "alice".to_string(), MovePayload::nim(2))
        .await
        .expect("Move failed");

    let events = drain(&mut rx);
    let last = events.last().expect("Expected a terminal update");
    match last {
        GameEvent::GameUpdate { snapshot, .. } => {
            assert_eq!(*snapshot.status(), SessionStatus::Over);
            assert_eq!(snapshot.winners(), &vec!["bob".to_string()]);
        }
        other => panic!("Expected an update, got {other:?}"),
    }
}

#[tokio::test]
async fn test_update_wire_shape() {
    let engine = engine(5);
    let (conn, mut rx) = connect(&engine, "alice");
    let session_id = paired_session(&engine, "alice", "bob").await;
    engine.broadcaster().subscribe(conn, session_id);

    engine
        .submit_move(session_id, "alice".to_string(), MovePayload::nim(3))
        .await
        .expect("Move failed");

    let events = drain(&mut rx);
    let value = serde_json::to_value(&events[0]).expect("Serialize failed");
    assert_eq!(value["event"], "gameUpdate");
    assert_eq!(value["sessionId"], session_id.to_string());
    assert_eq!(value["snapshot"]["status"], "IN_PROGRESS");
    assert_eq!(value["snapshot"]["state"]["variant"], "nim");
    assert_eq!(value["snapshot"]["state"]["remainingObjects"], 2);
    assert_eq!(value["snapshot"]["moves"][0]["payload"]["numObjects"], 3);
}

#[tokio::test]
async fn test_error_wire_shape() {
    let engine = engine(5);
    let (conn, mut rx) = connect(&engine, "bob");
    let session_id = paired_session(&engine, "alice", "bob").await;
    engine.broadcaster().subscribe(conn, session_id);

    let result = engine
        .submit_move(session_id, "bob".to_string(), MovePayload::nim(1))
        .await;
    assert!(result.is_err());

    let events = drain(&mut rx);
    let value = serde_json::to_value(&events[0]).expect("Serialize failed");
    assert_eq!(value["event"], "gameError");
    assert_eq!(value["playerId"], "bob");
    assert_eq!(value["code"], "notYourTurn");
    assert!(value["reason"].is_string());
}
