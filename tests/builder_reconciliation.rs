//! Save reconciliation between the designer and a module store

mod common;

use common::{at, module, shared};
use serde_json::json;
use std::sync::Arc;
use std::time::Duration;
use survey_modules::api::{ApiError, MemoryStore};
use survey_modules::builder::{
    BuilderAdapter, BuilderEvent, BuilderExit, Designer, DocumentFile, SaveOutcome, SaveRequest, SaveStatus,
    SaveTrigger, SessionPhase, ShortcutCommand, StatusWindows,
};
use tokio::sync::mpsc;

const QUIET: Duration = Duration::from_secs(60);

#[tokio::test]
async fn test_repeated_autosaves_write_once() {
    let store = Arc::new(MemoryStore::new());
    let (designer, _requests) = Designer::spawn(json!({ "title": "Onboarding" }), QUIET);
    let (adapter, _events) = BuilderAdapter::new(Some(shared(&store)), designer, StatusWindows::default());

    for _ in 0..5 {
        adapter.save(SaveTrigger::Autosave).await.unwrap();
    }

    let stats = store.stats();
    assert_eq!(stats.creates, 1);
    assert_eq!(stats.writes(), 1);
    assert_eq!(adapter.status(), SaveStatus::Saved);
}

#[tokio::test]
async fn test_first_save_creates_then_updates() {
    let store = Arc::new(MemoryStore::new());
    let (designer, _requests) = Designer::spawn(json!({ "title": "Exit interview" }), QUIET);
    let (adapter, mut events) = BuilderAdapter::new(Some(shared(&store)), designer.clone(), StatusWindows::default());
    assert_eq!(adapter.phase(), SessionPhase::Unsaved);

    let (outcome, navigate_back) = adapter.save(SaveTrigger::Autosave).await.unwrap();
    let SaveOutcome::Persisted(created) = outcome else {
        panic!("expected the first save to create");
    };
    assert!(navigate_back.is_none());
    assert_eq!(adapter.phase(), SessionPhase::Persisted);
    let id = adapter.module_id().unwrap();

    designer.set_document(json!({ "title": "Exit interview", "pages": [] }));
    adapter.save(SaveTrigger::Autosave).await.unwrap();
    designer.set_document(json!({ "title": "Exit interview v2" }));
    adapter.save(SaveTrigger::Autosave).await.unwrap();

    let stats = store.stats();
    assert_eq!(stats.creates, 1);
    assert_eq!(stats.updates, 2);
    assert_eq!(adapter.module_id().as_deref(), Some(id.as_str()));
    assert_eq!(store.snapshot().len(), 1);
    assert_eq!(store.snapshot()[0].display_name(), "Exit interview v2");
    assert!(created.created_at.is_some());
    assert_eq!(store.snapshot()[0].created_at, created.created_at);

    assert!(matches!(events.recv().await, Some(BuilderEvent::Saved(_))));
}

#[tokio::test]
async fn test_edit_keeps_creation_time() {
    let existing = module("5", "Pulse", at(3));
    let store = Arc::new(MemoryStore::new().with_modules(vec![existing.clone()]));
    let (designer, _requests) = Designer::spawn(existing.survey_json.clone(), QUIET);
    let (adapter, _events) =
        BuilderAdapter::for_module(Some(shared(&store)), designer.clone(), &existing, false, StatusWindows::default());

    designer.set_document(json!({ "title": "Pulse", "pages": [{ "name": "p1" }] }));
    adapter.save(SaveTrigger::Autosave).await.unwrap();
    designer.set_document(json!({ "title": "Pulse", "pages": [] }));
    adapter.save(SaveTrigger::Autosave).await.unwrap();

    let record = store.snapshot().remove(0);
    assert_eq!(record.created_at, at(0));
    assert_eq!(store.stats().updates, 2);
}

#[tokio::test]
async fn test_update_of_deleted_module_adopts_new_id() {
    let existing = module("3", "Intake", at(1));
    let store = Arc::new(MemoryStore::new().with_modules(vec![existing.clone()]));
    let (designer, _requests) = Designer::spawn(existing.survey_json.clone(), QUIET);
    let (adapter, _events) =
        BuilderAdapter::for_module(Some(shared(&store)), designer.clone(), &existing, false, StatusWindows::default());

    // Removed elsewhere while the builder is open
    store.forget("3");
    designer.set_document(json!({ "title": "Intake", "pages": [{ "name": "p1" }] }));

    let (outcome, _) = adapter.save(SaveTrigger::Autosave).await.unwrap();
    let SaveOutcome::Persisted(saved) = outcome else {
        panic!("expected a persisted module");
    };
    let new_id = saved.id.unwrap();
    assert_ne!(new_id, "3");
    assert_eq!(adapter.module_id(), Some(new_id.clone()));
    assert!(store.contains(&new_id));

    let stats = store.stats();
    assert_eq!(stats.updates, 1);
    assert_eq!(stats.creates, 1);
}

#[tokio::test]
async fn test_empty_document_never_reaches_store() {
    let store = Arc::new(MemoryStore::new());
    let (designer, _requests) = Designer::spawn(json!({}), QUIET);
    let (adapter, _events) = BuilderAdapter::new(Some(shared(&store)), designer, StatusWindows::default());

    let err = adapter.save(SaveTrigger::Manual).await.unwrap_err();
    assert!(matches!(err, ApiError::EmptyDocument));
    assert_eq!(store.stats(), Default::default());
    assert!(matches!(adapter.status(), SaveStatus::Failed(_)));
}

#[tokio::test]
async fn test_overlapping_triggers_share_one_write() {
    let store = Arc::new(MemoryStore::new().with_latency(Duration::from_millis(50)));
    let (designer, _requests) = Designer::spawn(json!({ "title": "Pulse" }), QUIET);
    let (adapter, _events) = BuilderAdapter::new(Some(shared(&store)), designer, StatusWindows::default());

    let (first, first_receipt) = SaveRequest::new(1, SaveTrigger::Autosave);
    let (second, second_receipt) = SaveRequest::new(2, SaveTrigger::Manual);
    let (first_result, second_result) = tokio::join!(adapter.handle(first), adapter.handle(second));

    assert_eq!(first_receipt.outcome().await, Ok(()));
    assert_eq!(second_receipt.outcome().await, Ok(()));

    // The manual gesture rode along with the save already underway
    assert!(first_result.is_some());
    assert!(second_result.is_none());

    let stats = store.stats();
    assert_eq!(stats.creates, 1);
    assert_eq!(stats.max_in_flight, 1);
}

#[tokio::test]
async fn test_missing_backend_is_reported() {
    let (designer, _requests) = Designer::spawn(json!({ "title": "Offline" }), QUIET);
    let (adapter, mut events) = BuilderAdapter::new(None, designer.clone(), StatusWindows::default());

    let (request, receipt) = SaveRequest::new(1, SaveTrigger::Manual);
    assert!(adapter.handle(request).await.is_none());
    assert!(receipt.outcome().await.is_err());
    assert!(matches!(events.recv().await, Some(BuilderEvent::SaveFailed(_))));

    // The guard was released, so the next attempt fails the same way
    let err = adapter.save(SaveTrigger::Manual).await.unwrap_err();
    assert!(matches!(err, ApiError::NoBackendConfigured));
    assert_eq!(adapter.phase(), SessionPhase::Unsaved);
}

#[tokio::test]
async fn test_view_mode_is_read_only() {
    let existing = module("8", "Archive", at(2));
    let store = Arc::new(MemoryStore::new().with_modules(vec![existing.clone()]));
    let (designer, _requests) = Designer::spawn(existing.survey_json.clone(), QUIET);
    let (adapter, _events) =
        BuilderAdapter::for_module(Some(shared(&store)), designer, &existing, true, StatusWindows::default());

    assert!(adapter.mode().is_read_only());
    let err = adapter.save(SaveTrigger::Manual).await.unwrap_err();
    assert!(matches!(err, ApiError::ReadOnly));
    assert_eq!(store.stats().writes(), 0);
}

#[tokio::test]
async fn test_saves_after_teardown_are_refused() {
    let store = Arc::new(MemoryStore::new());
    let (designer, _requests) = Designer::spawn(json!({ "title": "Late" }), QUIET);
    let (adapter, mut events) = BuilderAdapter::new(Some(shared(&store)), designer, StatusWindows::default());

    adapter.teardown();
    adapter.teardown();
    assert!(adapter.is_closed());

    let (request, receipt) = SaveRequest::new(1, SaveTrigger::Manual);
    adapter.handle(request).await;
    assert!(receipt.outcome().await.is_err());
    assert!(events.try_recv().is_err());
    assert_eq!(store.stats().writes(), 0);
}

#[tokio::test]
async fn test_run_exits_after_manual_save() {
    let store = Arc::new(MemoryStore::new());
    let (designer, requests) = Designer::spawn(json!({ "title": "Draft" }), Duration::from_millis(20));
    let (adapter, _events) = BuilderAdapter::new(Some(shared(&store)), designer.clone(), StatusWindows::default());
    let (shortcuts_tx, shortcuts_rx) = mpsc::unbounded_channel();

    let drive = async {
        designer.set_document(json!({ "title": "Draft", "pages": [] }));
        tokio::time::sleep(Duration::from_millis(150)).await;
        assert_eq!(store.stats().creates, 1);
        shortcuts_tx.send(ShortcutCommand::Save).unwrap();
    };
    let (exit, ()) = tokio::join!(adapter.run(requests, shortcuts_rx), drive);

    let BuilderExit::Saved(saved) = exit else {
        panic!("expected the manual save to end the builder");
    };
    assert_eq!(saved.display_name(), "Draft");

    let stats = store.stats();
    assert_eq!(stats.creates, 1);
    assert_eq!(stats.updates, 1);
    assert!(adapter.is_closed());
}

#[tokio::test]
async fn test_run_quit_cancels() {
    let store = Arc::new(MemoryStore::new());
    let (designer, requests) = Designer::spawn(json!({ "title": "Draft" }), QUIET);
    let (adapter, _events) = BuilderAdapter::new(Some(shared(&store)), designer, StatusWindows::default());
    let (shortcuts_tx, shortcuts_rx) = mpsc::unbounded_channel();

    shortcuts_tx.send(ShortcutCommand::Quit).unwrap();
    assert_eq!(adapter.run(requests, shortcuts_rx).await, BuilderExit::Cancelled);
    assert!(adapter.is_closed());
    assert_eq!(store.stats().writes(), 0);
}

#[tokio::test]
async fn test_manual_save_persists_latest_file_contents() {
    let path = std::env::temp_dir().join(format!("survey-builder-{}.json", uuid::Uuid::new_v4()));
    std::fs::write(&path, r#"{ "title": "Before" }"#).unwrap();

    let store = Arc::new(MemoryStore::new());
    let (designer, requests) = Designer::spawn(json!({ "title": "Before" }), QUIET);
    let (adapter, _events) = BuilderAdapter::new(Some(shared(&store)), designer.clone(), StatusWindows::default());
    let (keys_tx, keys_rx) = mpsc::unbounded_channel();
    let (shortcuts_tx, shortcuts_rx) = mpsc::unbounded_channel();

    // Polling alone would not see the edit before the save
    let relay = tokio::spawn(DocumentFile::new(&path).drive(designer, keys_rx, shortcuts_tx, QUIET, |_| {}));

    std::fs::write(&path, r#"{ "title": "After", "pages": [] }"#).unwrap();
    keys_tx.send(ShortcutCommand::Save).unwrap();

    let exit = adapter.run(requests, shortcuts_rx).await;
    relay.abort();
    let _ = std::fs::remove_file(&path);

    let BuilderExit::Saved(saved) = exit else {
        panic!("expected the manual save to end the builder");
    };
    assert_eq!(saved.survey_json, json!({ "title": "After", "pages": [] }));
    assert_eq!(store.snapshot()[0].display_name(), "After");
    assert_eq!(store.stats().writes(), 1);
}
