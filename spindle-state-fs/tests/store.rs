use layer0::test_utils::{EchoDialog, RecordingBotToUser, register_samples};
use layer0::{ConversationId, DialogRegistry, Message, Scope, StateError, StateStore};
use serde_json::json;
use spindle_fiber::{DEFAULT_FIBER_KEY, Fiber, FiberStore, PollContext, StateFiberStore};
use spindle_state_fs::FsStore;
use std::sync::Arc;
use tokio_util::sync::CancellationToken;

fn conversation(id: &str) -> Scope {
    Scope::Conversation(ConversationId::new(id))
}

// ━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━
// Basic CRUD
// ━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━

#[tokio::test]
async fn write_then_read() {
    let dir = tempfile::tempdir().unwrap();
    let store = FsStore::new(dir.path());
    let scope = conversation("c1");

    store.write(&scope, DEFAULT_FIBER_KEY, json!({"frames": []})).await.unwrap();

    assert_eq!(
        store.read(&scope, DEFAULT_FIBER_KEY).await.unwrap(),
        Some(json!({"frames": []}))
    );
    assert!(dir
        .path()
        .join("conversations/c1/dialog.fiber.json")
        .is_file());
}

#[tokio::test]
async fn read_missing_returns_none() {
    let dir = tempfile::tempdir().unwrap();
    let store = FsStore::new(dir.path());
    assert_eq!(store.read(&conversation("c1"), "missing").await.unwrap(), None);
}

#[tokio::test]
async fn overwrite_replaces_value_and_leaves_no_temp_files() {
    let dir = tempfile::tempdir().unwrap();
    let store = FsStore::new(dir.path());
    let scope = conversation("c1");

    store.write(&scope, "key", json!(1)).await.unwrap();
    store.write(&scope, "key", json!(2)).await.unwrap();

    assert_eq!(store.read(&scope, "key").await.unwrap(), Some(json!(2)));
    let names: Vec<String> = std::fs::read_dir(dir.path().join("conversations/c1"))
        .unwrap()
        .map(|e| e.unwrap().file_name().into_string().unwrap())
        .collect();
    assert_eq!(names, vec!["key.json"]);
}

#[tokio::test]
async fn delete_removes_key() {
    let dir = tempfile::tempdir().unwrap();
    let store = FsStore::new(dir.path());
    let scope = conversation("c1");

    store.write(&scope, "key", json!("val")).await.unwrap();
    store.delete(&scope, "key").await.unwrap();

    assert_eq!(store.read(&scope, "key").await.unwrap(), None);
}

#[tokio::test]
async fn delete_missing_is_noop() {
    let dir = tempfile::tempdir().unwrap();
    let store = FsStore::new(dir.path());
    store.delete(&conversation("c1"), "nope").await.unwrap();
}

#[tokio::test]
async fn empty_key_is_rejected() {
    let dir = tempfile::tempdir().unwrap();
    let store = FsStore::new(dir.path());
    assert!(matches!(
        store.write(&Scope::Global, "", json!(1)).await,
        Err(StateError::WriteFailed(_))
    ));
}

#[tokio::test]
async fn corrupt_file_is_a_serialization_error() {
    let dir = tempfile::tempdir().unwrap();
    let store = FsStore::new(dir.path());
    std::fs::create_dir_all(dir.path().join("global")).unwrap();
    std::fs::write(dir.path().join("global/key.json"), b"{not json").unwrap();

    assert!(matches!(
        store.read(&Scope::Global, "key").await,
        Err(StateError::Serialization(_))
    ));
}

// ━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━
// Listing and isolation
// ━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━

#[tokio::test]
async fn list_by_prefix_skips_temp_files() {
    let dir = tempfile::tempdir().unwrap();
    let store = FsStore::new(dir.path());
    let scope = Scope::Global;

    store.write(&scope, "user:name", json!("Alice")).await.unwrap();
    store.write(&scope, "user:age", json!(30)).await.unwrap();
    store.write(&scope, "system:version", json!("1.0")).await.unwrap();
    std::fs::write(dir.path().join("global/.user%3Aname.json.1-0.tmp"), b"{").unwrap();

    assert_eq!(
        store.list(&scope, "user:").await.unwrap(),
        vec!["user:age", "user:name"]
    );
    assert_eq!(store.list(&scope, "").await.unwrap().len(), 3);
}

#[tokio::test]
async fn list_unknown_scope_is_empty() {
    let dir = tempfile::tempdir().unwrap();
    let store = FsStore::new(dir.path());
    assert!(store.list(&conversation("c1"), "").await.unwrap().is_empty());
}

#[tokio::test]
async fn scopes_are_isolated() {
    let dir = tempfile::tempdir().unwrap();
    let store = FsStore::new(dir.path());
    let c1 = conversation("c1");
    let custom = Scope::Custom("c1".into());

    store.write(&c1, "key", json!("conversation")).await.unwrap();
    store.write(&custom, "key", json!("custom")).await.unwrap();

    assert_eq!(store.read(&c1, "key").await.unwrap(), Some(json!("conversation")));
    assert_eq!(store.read(&custom, "key").await.unwrap(), Some(json!("custom")));
}

#[tokio::test]
async fn hostile_conversation_ids_stay_inside_root() {
    let dir = tempfile::tempdir().unwrap();
    let root = dir.path().join("state");
    let store = FsStore::new(&root);
    let scope = conversation("../../escape");

    store.write(&scope, "../key", json!(1)).await.unwrap();

    assert_eq!(store.read(&scope, "../key").await.unwrap(), Some(json!(1)));
    assert_eq!(std::fs::read_dir(dir.path()).unwrap().count(), 1);
    assert_eq!(store.list(&scope, "").await.unwrap(), vec!["../key"]);
}

// ━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━
// Persistence
// ━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━

#[tokio::test]
async fn data_persists_across_store_instances() {
    let dir = tempfile::tempdir().unwrap();
    let scope = conversation("c1");

    FsStore::new(dir.path())
        .write(&scope, "key", json!({"nested": [1, 2, 3]}))
        .await
        .unwrap();

    let reopened = FsStore::new(dir.path());
    assert_eq!(
        reopened.read(&scope, "key").await.unwrap(),
        Some(json!({"nested": [1, 2, 3]}))
    );
}

#[tokio::test]
async fn fiber_resumes_after_reopening_the_store() {
    let dir = tempfile::tempdir().unwrap();
    let mut registry = DialogRegistry::new();
    register_samples(&mut registry);
    let bot = RecordingBotToUser::new();
    let token = CancellationToken::new();

    {
        let state: Arc<dyn StateStore> = Arc::new(FsStore::new(dir.path()));
        let mut store = StateFiberStore::new(state, conversation("c1"));
        let mut fiber = Fiber::new();
        fiber.call(Box::new(EchoDialog::default()), None);
        fiber.poll(&PollContext::new(&registry, &bot, &token)).await.unwrap();
        fiber.post(Message::new("a").into()).unwrap();
        fiber.poll(&PollContext::new(&registry, &bot, &token)).await.unwrap();
        store.save(&fiber).unwrap();
        store.flush().await.unwrap();
    }

    let state: Arc<dyn StateStore> = Arc::new(FsStore::new(dir.path()));
    let mut store = StateFiberStore::new(state, conversation("c1"));
    let mut fiber = store.try_load(&registry).await.unwrap().unwrap();
    fiber.post(Message::new("b").into()).unwrap();
    fiber.poll(&PollContext::new(&registry, &bot, &token)).await.unwrap();

    assert_eq!(bot.texts(), vec!["1: a", "2: b"]);

    store.reset();
    store.flush().await.unwrap();
    assert!(store.try_load(&registry).await.unwrap().is_none());
}
