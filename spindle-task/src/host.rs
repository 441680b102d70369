//! Conversations: the inbound boundary, one serialized stream per key.

use crate::config::{EngineConfig, TaskConfig};
use crate::event_loop::ScoringEventLoop;
use crate::reactive::{ReactiveDialogTask, RootFactory};
use crate::task::DialogTask;
use layer0::{
    Activity, ActivityScorable, BotToUser, ConversationId, Dialog, DialogError, DialogRegistry,
    DialogStack, Scope, StateStore,
};
use spindle_fiber::StateFiberStore;
use spindle_scorables::DialogRouter;
use std::collections::HashMap;
use std::sync::Arc;
use tokio::sync::Mutex;
use tokio_util::sync::CancellationToken;

/// Builds the outbound sink for a conversation.
pub type BotFactory = Arc<dyn Fn(&ConversationId) -> Arc<dyn BotToUser> + Send + Sync>;

/// Hosts every conversation over one shared state store.
///
/// Each `post` builds a fresh task stack for its conversation, processes
/// the activity until the stack suspends, and drops the stack again; all
/// state lives in the store between activities. Posts to the same
/// conversation are serialized; different conversations run
/// concurrently. A conversation's lock is dropped once nothing holds or
/// waits on it.
pub struct Conversations {
    state: Arc<dyn StateStore>,
    registry: Arc<DialogRegistry>,
    router: DialogRouter,
    make_root: RootFactory,
    make_bot: BotFactory,
    config: TaskConfig,
    locks: Mutex<HashMap<ConversationId, Arc<Mutex<()>>>>,
}

impl Conversations {
    /// A host whose conversations start `make_root` and reply through
    /// `make_bot`.
    pub fn new(
        state: Arc<dyn StateStore>,
        registry: Arc<DialogRegistry>,
        make_root: impl Fn() -> Result<Box<dyn Dialog>, DialogError> + Send + Sync + 'static,
        make_bot: impl Fn(&ConversationId) -> Arc<dyn BotToUser> + Send + Sync + 'static,
    ) -> Self {
        Self {
            state,
            registry,
            router: DialogRouter::default(),
            make_root: Arc::new(make_root),
            make_bot: Arc::new(make_bot),
            config: TaskConfig::default(),
            locks: Mutex::new(HashMap::new()),
        }
    }

    /// Apply engine settings.
    pub fn with_config(mut self, config: EngineConfig) -> Self {
        self.config = config.task;
        self.router.set_config(config.router);
        self
    }

    /// Add a process-wide scorable.
    pub fn with_global(mut self, scorable: Arc<ActivityScorable>) -> Self {
        self.router.add_global(scorable);
        self
    }

    async fn lock(&self, conversation: &ConversationId) -> Arc<Mutex<()>> {
        let mut locks = self.locks.lock().await;
        locks.entry(conversation.clone()).or_default().clone()
    }

    async fn unlock(&self, conversation: &ConversationId, lock: Arc<Mutex<()>>) {
        let mut locks = self.locks.lock().await;
        drop(lock);
        // Only the map's own reference left: no holder, no waiter.
        if locks
            .get(conversation)
            .is_some_and(|lock| Arc::strong_count(lock) == 1)
        {
            locks.remove(conversation);
        }
    }

    /// Number of conversations with a post or reset in flight.
    pub async fn active(&self) -> usize {
        self.locks.lock().await.len()
    }

    fn stack(&self, conversation: &ConversationId) -> ReactiveDialogTask<StateFiberStore> {
        let store = StateFiberStore::new(
            self.state.clone(),
            Scope::Conversation(conversation.clone()),
        )
        .with_key(self.config.state_key.clone());
        let task = DialogTask::new(store, self.registry.clone(), (self.make_bot)(conversation))
            .with_config(self.config.clone());
        ReactiveDialogTask::with_factory(task, self.make_root.clone())
    }

    /// Process one inbound activity to suspension.
    pub async fn post(
        &self,
        conversation: &ConversationId,
        activity: Activity,
        token: &CancellationToken,
    ) -> Result<(), DialogError> {
        let lock = self.lock(conversation).await;
        let result = {
            let _guard = lock.lock().await;
            tracing::debug!(conversation = %conversation, "spindle.host.post");
            let mut event_loop = ScoringEventLoop::new(self.stack(conversation), &self.router);
            event_loop.post(activity, token).await
        };
        self.unlock(conversation, lock).await;
        result
    }

    /// Wipe one conversation's stack.
    pub async fn reset(&self, conversation: &ConversationId) -> Result<(), DialogError> {
        let lock = self.lock(conversation).await;
        let result = {
            let _guard = lock.lock().await;
            self.stack(conversation).reset().await
        };
        self.unlock(conversation, lock).await;
        result
    }
}
