//! DialogTask: one conversation's fiber, its store, and its queue.

use crate::config::TaskConfig;
use crate::queue::{EventQueue, OnPull, Pulled};
use async_trait::async_trait;
use layer0::{
    Activity, BotToUser, Dialog, DialogError, DialogRegistry, DialogStack, FrameInfo, Item, Need,
    Resume,
};
use spindle_fiber::{Fiber, FiberStore, PollContext, PostedEvent};
use std::sync::Arc;
use tokio_util::sync::CancellationToken;

/// A dialog stack fed through an event queue.
///
/// This is what [`crate::ScoringEventLoop`] drives: activities go in with
/// `enqueue`, come out with `pull`, and unrouted ones are delivered into
/// the stack's current wait with `deliver`.
#[async_trait]
pub trait QueuedStack: DialogStack {
    /// Append an inbound activity.
    fn enqueue(&mut self, activity: Activity);

    /// Take the oldest queued activity, firing its pulled callback.
    async fn pull(&mut self) -> Result<Option<Pulled<Activity>>, DialogError>;

    /// Deliver `item` into the top frame's wait.
    async fn deliver(&mut self, item: Item) -> Result<(), DialogError>;
}

/// Runs one conversation's fiber against its durable store.
///
/// The fiber is loaded lazily on first use. Every successful poll is
/// saved and flushed. Any fault wipes both the in-memory stack and the
/// durable slot before it is returned, so a broken conversation starts
/// over on its next activity.
pub struct DialogTask<S> {
    store: S,
    fiber: Option<Fiber>,
    queue: EventQueue<Activity, Fiber>,
    registry: Arc<DialogRegistry>,
    bot: Arc<dyn BotToUser>,
    config: TaskConfig,
}

impl<S: FiberStore> DialogTask<S> {
    /// A task over `store`.
    pub fn new(store: S, registry: Arc<DialogRegistry>, bot: Arc<dyn BotToUser>) -> Self {
        Self {
            store,
            fiber: None,
            queue: EventQueue::new(),
            registry,
            bot,
            config: TaskConfig::default(),
        }
    }

    /// Override the settings.
    pub fn with_config(mut self, config: TaskConfig) -> Self {
        self.config = config;
        self
    }

    /// The store.
    pub fn store(&self) -> &S {
        &self.store
    }

    /// The fiber, if it has been loaded.
    pub fn fiber(&self) -> Option<&Fiber> {
        self.fiber.as_ref()
    }

    /// Activities waiting in the queue.
    pub fn queued(&self) -> usize {
        self.queue.len()
    }

    async fn load(&mut self) -> Result<(), DialogError> {
        if self.fiber.is_none() {
            let loaded = self.store.try_load(&self.registry).await?;
            self.fiber = Some(loaded.unwrap_or_default());
        }
        Ok(())
    }

    /// Wipe everything after a fault and hand the fault back.
    async fn fault(&mut self, error: DialogError) -> DialogError {
        tracing::info!(error = %error, "spindle.task.fault");
        self.store.reset();
        if let Err(e) = self.store.flush().await {
            tracing::warn!(error = %e, "spindle.task.wipe_failed");
        }
        self.fiber.get_or_insert_with(Fiber::new).reset();
        error
    }

    async fn run(&mut self, token: &CancellationToken) -> Result<(), DialogError> {
        self.load().await?;
        let Self {
            store,
            fiber,
            queue,
            registry,
            bot,
            config,
        } = self;
        let fiber = fiber.get_or_insert_with(Fiber::new);

        let cx = PollContext::new(&**registry, &**bot, token).with_max_steps(config.max_steps);
        let need = fiber.poll(&cx).await?;

        for posted in fiber.take_posted() {
            queue.push_with(Activity::Event(posted.event.clone()), satisfy_on_pull(posted));
        }

        store.save(fiber)?;
        store.flush().await?;

        if need != Need::Wait {
            return Err(DialogError::NoResumeHandler {
                dialog: String::new(),
            });
        }
        Ok(())
    }

    async fn push(
        &mut self,
        dialog: Box<dyn Dialog>,
        resume: Option<Resume>,
    ) -> Result<(), DialogError> {
        self.load().await?;
        self.fiber.get_or_insert_with(Fiber::new).call(dialog, resume);
        Ok(())
    }

    async fn post_item(&mut self, item: Item) -> Result<(), DialogError> {
        self.load().await?;
        self.fiber.get_or_insert_with(Fiber::new).post(item)
    }
}

fn satisfy_on_pull(posted: PostedEvent) -> OnPull<Fiber> {
    let PostedEvent {
        frame,
        serial,
        event,
    } = posted;
    Box::new(move |fiber: &mut Fiber| fiber.satisfy(frame, serial, event.into()))
}

#[async_trait]
impl<S: FiberStore> DialogStack for DialogTask<S> {
    async fn frames(&mut self) -> Result<Vec<FrameInfo>, DialogError> {
        match self.load().await {
            Ok(()) => Ok(self.fiber.as_ref().map(Fiber::frame_infos).unwrap_or_default()),
            Err(e) => Err(self.fault(e).await),
        }
    }

    async fn call(
        &mut self,
        dialog: Box<dyn Dialog>,
        resume: Option<Resume>,
    ) -> Result<(), DialogError> {
        match self.push(dialog, resume).await {
            Ok(()) => Ok(()),
            Err(e) => Err(self.fault(e).await),
        }
    }

    async fn forward(
        &mut self,
        dialog: Box<dyn Dialog>,
        resume: Option<Resume>,
        item: Item,
        token: &CancellationToken,
    ) -> Result<(), DialogError> {
        tracing::debug!(dialog = dialog.kind(), item = %item.kind(), "spindle.task.forward");
        self.call(dialog, resume).await?;
        self.poll(token).await?;
        self.deliver(item).await?;
        self.poll(token).await
    }

    async fn poll(&mut self, token: &CancellationToken) -> Result<(), DialogError> {
        match self.run(token).await {
            Ok(()) => Ok(()),
            Err(e) => Err(self.fault(e).await),
        }
    }

    async fn reset(&mut self) -> Result<(), DialogError> {
        tracing::info!("spindle.task.reset");
        self.store.reset();
        self.fiber.get_or_insert_with(Fiber::new).reset();
        self.store.flush().await
    }

    fn registry(&self) -> &DialogRegistry {
        &self.registry
    }

    fn bot(&self) -> &dyn BotToUser {
        self.bot.as_ref()
    }
}

#[async_trait]
impl<S: FiberStore> QueuedStack for DialogTask<S> {
    fn enqueue(&mut self, activity: Activity) {
        self.queue.push(activity);
    }

    async fn pull(&mut self) -> Result<Option<Pulled<Activity>>, DialogError> {
        if let Err(e) = self.load().await {
            return Err(self.fault(e).await);
        }
        let fiber = self.fiber.get_or_insert_with(Fiber::new);
        Ok(self.queue.pull(fiber))
    }

    async fn deliver(&mut self, item: Item) -> Result<(), DialogError> {
        match self.post_item(item).await {
            Ok(()) => Ok(()),
            Err(e) => Err(self.fault(e).await),
        }
    }
}
