//! Tests for session persistence backends.

use std::sync::Arc;

use tempfile::TempDir;

use matchroom::{
    EngineConfig, GameRules, JsonFileStore, LeavePolicy, MemoryStore, MovePayload, NimConfig,
    NimRules, Session, SessionEngine, SessionId, SessionRecord, SessionStatus, SessionStore,
    Variant,
};

/// Creates a temporary directory and a JSON store rooted in it. The
/// directory handle must stay in scope to keep the files alive.
async fn setup_json_store() -> (TempDir, JsonFileStore) {
    let dir = TempDir::new().expect("Failed to create temp dir");
    let store = JsonFileStore::new(dir.path())
        .await
        .expect("Failed to open store");
    (dir, store)
}

/// A session part-way through a five-object game, optionally finished.
fn sample_record(finished: bool) -> SessionRecord {
    let rules = NimRules::new(5);
    let mut session = Session::new(
        Variant::Nim,
        rules.capacity(),
        rules.initial_state(),
        "alice".to_string(),
    );
    session.seat_player("bob".to_string());
    session.start();

    let payload = MovePayload::nim(3);
    let next = rules.apply_move(session.state(), &payload);
    session.record_move("alice".to_string(), payload, next);

    if finished {
        let payload = MovePayload::nim(2);
        let next = rules.apply_move(session.state(), &payload);
        session.record_move("bob".to_string(), payload, next);
        session.finish(vec!["alice".to_string()]);
    }
    SessionRecord::from_session(&session)
}

#[tokio::test]
async fn test_json_store_round_trips_a_record() {
    let (_dir, store) = setup_json_store().await;
    let record = sample_record(true);

    store.save(&record).await.expect("Save failed");
    let loaded = store
        .load(record.snapshot().session_id())
        .await
        .expect("Load failed")
        .expect("Record missing");
    assert_eq!(loaded, record);
}

#[tokio::test]
async fn test_json_store_missing_record_is_none() {
    let (_dir, store) = setup_json_store().await;
    let loaded = store
        .load(&SessionId::new_v4())
        .await
        .expect("Load failed");
    assert!(loaded.is_none());
}

#[tokio::test]
async fn test_json_store_overwrites_previous_document() {
    let (_dir, store) = setup_json_store().await;

    let rules = NimRules::new(5);
    let mut session = Session::new(
        Variant::Nim,
        rules.capacity(),
        rules.initial_state(),
        "alice".to_string(),
    );
    session.seat_player("bob".to_string());
    session.start();
    store
        .save(&SessionRecord::from_session(&session))
        .await
        .expect("First save failed");

    session.finish(vec!["bob".to_string()]);
    store
        .save(&SessionRecord::from_session(&session))
        .await
        .expect("Second save failed");

    let loaded = store
        .load(&session.id())
        .await
        .expect("Load failed")
        .expect("Record missing");
    assert_eq!(*loaded.snapshot().status(), SessionStatus::Over);
    assert_eq!(loaded.snapshot().winners(), &vec!["bob".to_string()]);
}

#[tokio::test]
async fn test_json_store_creates_nested_directories() {
    let dir = TempDir::new().expect("Failed to create temp dir");
    let nested = dir.path().join("var").join("sessions");
    let store = JsonFileStore::new(&nested)
        .await
        .expect("Failed to open nested store");

    let record = sample_record(false);
    store.save(&record).await.expect("Save failed");
    let expected = nested.join(format!("{}.json", record.snapshot().session_id()));
    assert!(expected.exists(), "Document file should exist on disk");
}

#[tokio::test]
async fn test_memory_store_round_trips_a_record() {
    let store = MemoryStore::new();
    assert!(store.is_empty());

    let record = sample_record(true);
    store.save(&record).await.expect("Save failed");
    assert_eq!(store.len(), 1);

    let loaded = store
        .load(record.snapshot().session_id())
        .await
        .expect("Load failed")
        .expect("Record missing");
    assert_eq!(loaded, record);
    assert_eq!(loaded.snapshot().winners(), &vec!["alice".to_string()]);
}

#[tokio::test]
async fn test_engine_persists_through_json_store() {
    let dir = TempDir::new().expect("Failed to create temp dir");
    let store = Arc::new(
        JsonFileStore::new(dir.path())
            .await
            .expect("Failed to open store"),
    );
    let engine = SessionEngine::new(
        EngineConfig::new(LeavePolicy::Detach, true, NimConfig::new(5)),
        store.clone(),
    );

    let view = engine
        .join_or_create(Variant::Nim, "alice".to_string())
        .await
        .expect("Join failed");
    let session_id = *view.session_id();
    engine
        .join(session_id, "bob".to_string())
        .await
        .expect("Join failed");
    engine
        .submit_move(session_id, "alice".to_string(), MovePayload::nim(3))
        .await
        .expect("Move failed");
    engine
        .submit_move(session_id, "bob".to_string(), MovePayload::nim(2))
        .await
        .expect("Move failed");

    let path = dir.path().join(format!("{session_id}.json"));
    assert!(path.exists(), "Terminal save should land on disk");

    let record = store
        .load(&session_id)
        .await
        .expect("Load failed")
        .expect("Record missing");
    assert_eq!(*record.snapshot().status(), SessionStatus::Over);
    assert_eq!(record.snapshot().winners(), &vec!["alice".to_string()]);
}
