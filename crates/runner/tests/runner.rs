use std::sync::Arc;
use std::time::Duration;

use tokio::time::timeout;
use ws_domain::config::EventDiceConfig;
use ws_domain::entities::{ProviderKind, TimelineStepUnit};
use ws_domain::event::Event;
use ws_eventbus::EventBus;
use ws_memory::NullMemory;
use ws_runner::RunnerHandle;
use ws_store::Store;

async fn test_store() -> Store {
    let dir = tempfile::tempdir().expect("tempdir");
    let path = dir.path().join("worldline.db");
    std::mem::forget(dir);
    let url = format!("sqlite://{}", path.display());
    Store::connect(&url, "test-app-secret-key").await.expect("connect")
}

async fn next_message_created(sub: &ws_eventbus::Subscription) -> ws_domain::entities::TimelineMessage {
    loop {
        match timeout(Duration::from_secs(5), sub.recv()).await {
            Ok(Some(Event::MessageCreated { message, .. })) => return message,
            Ok(Some(_)) => continue,
            Ok(None) => panic!("event bus closed before a message_created arrived"),
            Err(_) => panic!("timed out waiting for message_created"),
        }
    }
}

#[tokio::test]
async fn start_produces_sequential_reports_then_stop() {
    let store = test_store().await;
    let session = store
        .create_session("W", "a rural valley", "Year 1", 0, "en", "0001-01-01T00:00:00Z", 1, TimelineStepUnit::Month)
        .await
        .unwrap();
    store
        .upsert_provider_config(&session.id, ProviderKind::Mock, "http://mock.invalid", None, Some("fixture-v1"))
        .await
        .unwrap();

    let bus = EventBus::new();
    let sub = bus.subscribe(&session.id);
    let handle = RunnerHandle::spawn(
        session.id.clone(),
        store.clone(),
        bus.clone(),
        Arc::new(NullMemory),
        EventDiceConfig::default(),
    );

    handle.start().await.unwrap();

    let m1 = next_message_created(&sub).await;
    let m2 = next_message_created(&sub).await;
    assert_eq!(m1.seq, 1);
    assert_eq!(m2.seq, 2);
    assert_eq!(m1.model_provider.as_deref(), Some("mock"));

    handle.stop().await.unwrap();

    let window = store.recent_window(&session.active_branch_id).await.unwrap();
    assert!(window.len() >= 2);
}

#[tokio::test]
async fn pause_stops_new_reports_from_appearing() {
    let store = test_store().await;
    let session = store
        .create_session("W", "a rural valley", "Year 1", 0, "en", "0001-01-01T00:00:00Z", 1, TimelineStepUnit::Month)
        .await
        .unwrap();
    store
        .upsert_provider_config(&session.id, ProviderKind::Mock, "http://mock.invalid", None, Some("fixture-v1"))
        .await
        .unwrap();

    let bus = EventBus::new();
    let sub = bus.subscribe(&session.id);
    let handle = RunnerHandle::spawn(
        session.id.clone(),
        store.clone(),
        bus.clone(),
        Arc::new(NullMemory),
        EventDiceConfig::default(),
    );

    handle.start().await.unwrap();
    let _ = next_message_created(&sub).await;
    handle.pause().await.unwrap();

    // Drain whatever is already queued, then make sure the branch settles.
    let before = store.recent_window(&session.active_branch_id).await.unwrap().len();
    tokio::time::sleep(Duration::from_millis(200)).await;
    let after = store.recent_window(&session.active_branch_id).await.unwrap().len();
    assert_eq!(before, after, "no new reports should append once paused");

    handle.stop().await.unwrap();
}

#[tokio::test]
async fn missing_provider_config_enters_error_backoff() {
    let store = test_store().await;
    let session = store
        .create_session("W", "a rural valley", "Year 1", 0, "en", "0001-01-01T00:00:00Z", 1, TimelineStepUnit::Month)
        .await
        .unwrap();
    // No provider config upserted.

    let bus = EventBus::new();
    let sub = bus.subscribe(&session.id);
    let handle = RunnerHandle::spawn(
        session.id.clone(),
        store.clone(),
        bus.clone(),
        Arc::new(NullMemory),
        EventDiceConfig::default(),
    );

    handle.start().await.unwrap();

    let event = timeout(Duration::from_secs(5), sub.recv()).await.unwrap().unwrap();
    match event {
        Event::SessionState { running: true } => {
            let next = timeout(Duration::from_secs(5), sub.recv()).await.unwrap().unwrap();
            assert!(matches!(next, Event::Error { .. }));
        }
        Event::Error { .. } => {}
        other => panic!("unexpected event: {other:?}"),
    }

    handle.stop().await.unwrap();
}
