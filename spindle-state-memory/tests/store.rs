use layer0::test_utils::{EchoDialog, RecordingBotToUser, register_samples};
use layer0::{ConversationId, DialogRegistry, Message, Scope, StateStore};
use serde_json::json;
use spindle_fiber::{DEFAULT_FIBER_KEY, Fiber, FiberStore, PollContext, StateFiberStore};
use spindle_state_memory::MemoryStore;
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
    let store = MemoryStore::new();
    let scope = conversation("c1");

    store.write(&scope, "key1", json!("hello")).await.unwrap();

    assert_eq!(store.read(&scope, "key1").await.unwrap(), Some(json!("hello")));
}

#[tokio::test]
async fn read_missing_returns_none() {
    let store = MemoryStore::new();
    assert_eq!(store.read(&conversation("c1"), "missing").await.unwrap(), None);
}

#[tokio::test]
async fn overwrite_replaces_value() {
    let store = MemoryStore::new();
    let scope = conversation("c1");

    store.write(&scope, "key1", json!(1)).await.unwrap();
    store.write(&scope, "key1", json!(2)).await.unwrap();

    assert_eq!(store.read(&scope, "key1").await.unwrap(), Some(json!(2)));
    assert_eq!(store.len().await, 1);
}

#[tokio::test]
async fn delete_removes_key_and_empty_scope() {
    let store = MemoryStore::new();
    let scope = conversation("c1");

    store.write(&scope, "key1", json!("val")).await.unwrap();
    store.delete(&scope, "key1").await.unwrap();

    assert_eq!(store.read(&scope, "key1").await.unwrap(), None);
    assert!(store.is_empty().await);
    assert!(store.scopes().await.is_empty());
}

#[tokio::test]
async fn delete_missing_is_noop() {
    let store = MemoryStore::new();
    store.delete(&conversation("c1"), "nope").await.unwrap();
    store.delete(&Scope::Global, "nope").await.unwrap();
}

// ━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━
// Listing
// ━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━

#[tokio::test]
async fn list_by_prefix_is_sorted() {
    let store = MemoryStore::new();
    let scope = Scope::Global;

    store.write(&scope, "user:name", json!("Alice")).await.unwrap();
    store.write(&scope, "user:age", json!(30)).await.unwrap();
    store.write(&scope, "system:version", json!("1.0")).await.unwrap();
    store.write(&scope, "users", json!([])).await.unwrap();

    assert_eq!(
        store.list(&scope, "user:").await.unwrap(),
        vec!["user:age", "user:name"]
    );
    assert_eq!(store.list(&scope, "").await.unwrap().len(), 4);
}

#[tokio::test]
async fn list_unknown_scope_is_empty() {
    let store = MemoryStore::new();
    assert!(store.list(&conversation("c9"), "").await.unwrap().is_empty());
}

// ━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━
// Scope isolation
// ━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━

#[tokio::test]
async fn conversations_are_isolated() {
    let store = MemoryStore::new();
    let c1 = conversation("c1");
    let c2 = conversation("c2");

    store.write(&c1, DEFAULT_FIBER_KEY, json!("one")).await.unwrap();
    store.write(&c2, DEFAULT_FIBER_KEY, json!("two")).await.unwrap();
    store.delete(&c1, DEFAULT_FIBER_KEY).await.unwrap();

    assert_eq!(store.read(&c1, DEFAULT_FIBER_KEY).await.unwrap(), None);
    assert_eq!(
        store.read(&c2, DEFAULT_FIBER_KEY).await.unwrap(),
        Some(json!("two"))
    );
}

#[tokio::test]
async fn clear_scope_drops_only_that_scope() {
    let store = MemoryStore::new();
    let c1 = conversation("c1");

    store.write(&c1, "a", json!(1)).await.unwrap();
    store.write(&c1, "b", json!(2)).await.unwrap();
    store.write(&Scope::Global, "a", json!(3)).await.unwrap();

    assert_eq!(store.clear_scope(&c1).await, 2);
    assert_eq!(store.clear_scope(&c1).await, 0);
    assert_eq!(store.scopes().await, vec![Scope::Global]);
}

// ━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━
// As the fiber's backing store
// ━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━

#[tokio::test]
async fn backs_a_fiber_store() {
    let state: Arc<dyn StateStore> = Arc::new(MemoryStore::new());
    let mut registry = DialogRegistry::new();
    register_samples(&mut registry);
    let bot = RecordingBotToUser::new();
    let token = CancellationToken::new();

    let mut store = StateFiberStore::new(state.clone(), conversation("c1"));
    let mut fiber = Fiber::new();
    fiber.call(Box::new(EchoDialog::default()), None);
    fiber.poll(&PollContext::new(&registry, &bot, &token)).await.unwrap();
    store.save(&fiber).unwrap();
    store.flush().await.unwrap();

    let mut store = StateFiberStore::new(state, conversation("c1"));
    let mut fiber = store.try_load(&registry).await.unwrap().unwrap();
    fiber.post(Message::new("hi").into()).unwrap();
    fiber.poll(&PollContext::new(&registry, &bot, &token)).await.unwrap();

    assert_eq!(bot.texts(), vec!["1: hi"]);
}

#[tokio::test]
async fn concurrent_writes_to_different_conversations() {
    let store = Arc::new(MemoryStore::new());

    let mut handles = Vec::new();
    for i in 0..10 {
        let store = store.clone();
        handles.push(tokio::spawn(async move {
            store
                .write(&conversation(&format!("c{i}")), DEFAULT_FIBER_KEY, json!(i))
                .await
                .unwrap();
        }));
    }
    for handle in handles {
        handle.await.unwrap();
    }

    assert_eq!(store.len().await, 10);
    assert_eq!(store.scopes().await.len(), 10);
}
