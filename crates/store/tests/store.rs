use ws_domain::entities::{MessageRole, ProviderKind, TimelineStepUnit};
use ws_store::Store;

async fn test_store() -> Store {
    let dir = tempfile::tempdir().expect("tempdir");
    let path = dir.path().join("worldline.db");
    // Leak the tempdir so the file survives for the lifetime of the test process.
    std::mem::forget(dir);
    let url = format!("sqlite://{}", path.display());
    Store::connect(&url, "test-app-secret-key")
        .await
        .expect("connect")
}

#[tokio::test]
async fn create_session_has_one_main_branch() {
    let store = test_store().await;
    let session = store
        .create_session(
            "My World",
            "a quiet agrarian kingdom",
            "Year 1, Spring",
            5,
            "en",
            "0001-03-01T00:00:00Z",
            1,
            TimelineStepUnit::Month,
        )
        .await
        .unwrap();

    let branches = store.list_branches(&session.id).await.unwrap();
    assert_eq!(branches.len(), 1);
    assert_eq!(branches[0].id, session.active_branch_id);
    assert_eq!(branches[0].name, "main");
    assert!(!branches[0].is_archived);
}

#[tokio::test]
async fn append_message_assigns_dense_increasing_seq() {
    let store = test_store().await;
    let session = store
        .create_session("W", "preset", "tick", 5, "en", "0001-01-01T00:00:00Z", 1, TimelineStepUnit::Month)
        .await
        .unwrap();
    let branch_id = session.active_branch_id.clone();

    let m1 = store
        .append_message(&session.id, &branch_id, MessageRole::SystemReport, "first", None, None, None, None, None, None)
        .await
        .unwrap();
    let m2 = store
        .append_message(&session.id, &branch_id, MessageRole::SystemReport, "second", None, None, None, None, None, None)
        .await
        .unwrap();

    assert_eq!(m1.seq, 1);
    assert_eq!(m2.seq, 2);

    let window = store.recent_window(&branch_id).await.unwrap();
    assert_eq!(window.len(), 2);
    assert_eq!(window[0].seq, 1);
    assert_eq!(window[1].seq, 2);
}

#[tokio::test]
async fn delete_last_message_removes_highest_seq_only() {
    let store = test_store().await;
    let session = store
        .create_session("W", "preset", "tick", 5, "en", "0001-01-01T00:00:00Z", 1, TimelineStepUnit::Month)
        .await
        .unwrap();
    let branch_id = session.active_branch_id.clone();

    store
        .append_message(&session.id, &branch_id, MessageRole::SystemReport, "first", None, None, None, None, None, None)
        .await
        .unwrap();
    store
        .append_message(&session.id, &branch_id, MessageRole::SystemReport, "second", None, None, None, None, None, None)
        .await
        .unwrap();

    let deleted = store.delete_last_message(&branch_id).await.unwrap();
    assert_eq!(deleted.content, "second");

    let window = store.recent_window(&branch_id).await.unwrap();
    assert_eq!(window.len(), 1);
    assert_eq!(window[0].content, "first");
}

#[tokio::test]
async fn fork_branch_copies_messages_up_to_cut_seq() {
    let store = test_store().await;
    let session = store
        .create_session("W", "preset", "tick", 5, "en", "0001-01-01T00:00:00Z", 1, TimelineStepUnit::Month)
        .await
        .unwrap();
    let main_id = session.active_branch_id.clone();

    let m1 = store
        .append_message(&session.id, &main_id, MessageRole::SystemReport, "r1", None, None, None, None, None, None)
        .await
        .unwrap();
    store
        .append_message(&session.id, &main_id, MessageRole::SystemReport, "r2", None, None, None, None, None, None)
        .await
        .unwrap();
    store
        .append_message(&session.id, &main_id, MessageRole::SystemReport, "r3", None, None, None, None, None, None)
        .await
        .unwrap();

    let forked = store
        .fork_branch(&main_id, Some(m1.seq), Some(&m1.id))
        .await
        .unwrap();

    assert_eq!(forked.name, "branch-1");
    assert_eq!(forked.parent_branch_id.as_deref(), Some(main_id.as_str()));

    let forked_window = store.recent_window(&forked.id).await.unwrap();
    assert_eq!(forked_window.len(), 1);
    assert_eq!(forked_window[0].content, "r1");

    let main_window = store.recent_window(&main_id).await.unwrap();
    assert_eq!(main_window.len(), 3);
}

#[tokio::test]
async fn consume_pending_interventions_is_atomic_and_ordered() {
    let store = test_store().await;
    let session = store
        .create_session("W", "preset", "tick", 5, "en", "0001-01-01T00:00:00Z", 1, TimelineStepUnit::Month)
        .await
        .unwrap();
    let branch_id = session.active_branch_id.clone();

    store.enqueue_intervention(&session.id, &branch_id, "first").await.unwrap();
    store.enqueue_intervention(&session.id, &branch_id, "second").await.unwrap();

    let consumed = store.consume_pending_interventions(&branch_id).await.unwrap();
    assert_eq!(consumed.len(), 2);
    assert_eq!(consumed[0].content, "first");
    assert_eq!(consumed[1].content, "second");

    let second_pass = store.consume_pending_interventions(&branch_id).await.unwrap();
    assert!(second_pass.is_empty());
}

#[tokio::test]
async fn provider_config_round_trips_through_encryption() {
    let store = test_store().await;
    let session = store
        .create_session("W", "preset", "tick", 5, "en", "0001-01-01T00:00:00Z", 1, TimelineStepUnit::Month)
        .await
        .unwrap();

    let view = store
        .upsert_provider_config(
            &session.id,
            ProviderKind::Openai,
            "https://api.openai.com",
            Some("sk-super-secret"),
            Some("gpt-4o-mini"),
        )
        .await
        .unwrap();
    assert!(view.has_api_key);
    assert_eq!(view.provider, ProviderKind::Openai);

    let cfg = store.get_provider_config(&session.id).await.unwrap().unwrap();
    assert_ne!(cfg.api_key_encrypted, b"sk-super-secret");
    let plain = store.decrypt_api_key(&cfg).await.unwrap();
    assert_eq!(plain, "sk-super-secret");
}

#[tokio::test]
async fn edit_message_does_not_change_seq() {
    let store = test_store().await;
    let session = store
        .create_session("W", "preset", "tick", 5, "en", "0001-01-01T00:00:00Z", 1, TimelineStepUnit::Month)
        .await
        .unwrap();
    let branch_id = session.active_branch_id.clone();
    let m1 = store
        .append_message(&session.id, &branch_id, MessageRole::SystemReport, "before", None, None, None, None, None, None)
        .await
        .unwrap();

    let edited = store.edit_message(&m1.id, Some("after"), None).await.unwrap();
    assert_eq!(edited.seq, m1.seq);
    assert_eq!(edited.content, "after");
    assert!(edited.is_user_edited);
}

#[tokio::test]
async fn edit_message_can_patch_report_snapshot_independently_of_content() {
    let store = test_store().await;
    let session = store
        .create_session("W", "preset", "tick", 5, "en", "0001-01-01T00:00:00Z", 1, TimelineStepUnit::Month)
        .await
        .unwrap();
    let branch_id = session.active_branch_id.clone();
    let m1 = store
        .append_message(&session.id, &branch_id, MessageRole::SystemReport, "before", None, None, None, None, None, None)
        .await
        .unwrap();

    let snapshot = serde_json::json!({ "events": ["a"] });
    let edited = store.edit_message(&m1.id, None, Some(&snapshot)).await.unwrap();
    assert_eq!(edited.content, "before");
    assert_eq!(edited.report_snapshot, Some(snapshot));
    assert!(edited.is_user_edited);
}
