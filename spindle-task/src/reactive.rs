//! ReactiveDialogTask: seeds a looping root whenever the stack is empty.

use crate::queue::Pulled;
use crate::task::{DialogTask, QueuedStack};
use async_trait::async_trait;
use layer0::{
    Activity, BotToUser, Dialog, DialogError, DialogRegistry, DialogStack, FrameInfo, Item, Resume,
};
use spindle_fiber::FiberStore;
use std::sync::Arc;
use tokio_util::sync::CancellationToken;

/// Builds a conversation's root dialog.
pub type RootFactory = Arc<dyn Fn() -> Result<Box<dyn Dialog>, DialogError> + Send + Sync>;

/// A [`DialogTask`] that starts a root dialog on demand.
///
/// Before every poll, an empty stack gets a fresh root from the factory,
/// wrapped in a loop so the root restarts each time it completes. Any
/// fault resets the stack.
pub struct ReactiveDialogTask<S> {
    task: DialogTask<S>,
    make_root: RootFactory,
}

impl<S: FiberStore> ReactiveDialogTask<S> {
    /// Wrap `task`, seeding roots from `make_root`.
    pub fn new(
        task: DialogTask<S>,
        make_root: impl Fn() -> Result<Box<dyn Dialog>, DialogError> + Send + Sync + 'static,
    ) -> Self {
        Self::with_factory(task, Arc::new(make_root))
    }

    /// Wrap `task` with a shared factory.
    pub fn with_factory(task: DialogTask<S>, make_root: RootFactory) -> Self {
        Self { task, make_root }
    }

    /// The wrapped task.
    pub fn task(&self) -> &DialogTask<S> {
        &self.task
    }

    async fn seed_and_poll(&mut self, token: &CancellationToken) -> Result<(), DialogError> {
        if self.task.frames().await?.is_empty() {
            let root = (self.make_root)()?;
            tracing::info!(root = root.kind(), "spindle.task.seed_root");
            let looped = spindle_chain::looping(root.as_ref())?;
            self.task.call(Box::new(looped), None).await?;
        }
        self.task.poll(token).await
    }
}

#[async_trait]
impl<S: FiberStore> DialogStack for ReactiveDialogTask<S> {
    async fn frames(&mut self) -> Result<Vec<FrameInfo>, DialogError> {
        self.task.frames().await
    }

    async fn call(
        &mut self,
        dialog: Box<dyn Dialog>,
        resume: Option<Resume>,
    ) -> Result<(), DialogError> {
        self.task.call(dialog, resume).await
    }

    async fn forward(
        &mut self,
        dialog: Box<dyn Dialog>,
        resume: Option<Resume>,
        item: Item,
        token: &CancellationToken,
    ) -> Result<(), DialogError> {
        self.task.forward(dialog, resume, item, token).await
    }

    async fn poll(&mut self, token: &CancellationToken) -> Result<(), DialogError> {
        let result = self.seed_and_poll(token).await;
        if result.is_err() {
            if let Err(e) = self.task.reset().await {
                tracing::warn!(error = %e, "spindle.task.reset_failed");
            }
        }
        result
    }

    async fn reset(&mut self) -> Result<(), DialogError> {
        self.task.reset().await
    }

    fn registry(&self) -> &DialogRegistry {
        self.task.registry()
    }

    fn bot(&self) -> &dyn BotToUser {
        self.task.bot()
    }
}

#[async_trait]
impl<S: FiberStore> QueuedStack for ReactiveDialogTask<S> {
    fn enqueue(&mut self, activity: Activity) {
        self.task.enqueue(activity);
    }

    async fn pull(&mut self) -> Result<Option<Pulled<Activity>>, DialogError> {
        self.task.pull().await
    }

    async fn deliver(&mut self, item: Item) -> Result<(), DialogError> {
        self.task.deliver(item).await
    }
}
