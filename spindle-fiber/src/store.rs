//! Durable storage for one conversation's fiber.

use crate::fiber::Fiber;
use crate::frame::FiberSnapshot;
use async_trait::async_trait;
use layer0::{DialogError, DialogRegistry, Scope, StateStore};
use std::sync::Arc;

/// Key the fiber is stored under unless configured otherwise.
pub const DEFAULT_FIBER_KEY: &str = "dialog.fiber";

/// One durable slot holding exactly one serialized fiber.
///
/// `save` and `reset` only stage; nothing is durable until `flush`.
/// The last staged operation wins.
#[async_trait]
pub trait FiberStore: Send + Sync {
    /// Load and restore the persisted fiber, if there is one.
    async fn try_load(&mut self, registry: &DialogRegistry) -> Result<Option<Fiber>, DialogError>;

    /// Stage a snapshot of `fiber`.
    fn save(&mut self, fiber: &Fiber) -> Result<(), DialogError>;

    /// Stage a wipe of the slot.
    fn reset(&mut self);

    /// Commit whatever is staged.
    async fn flush(&mut self) -> Result<(), DialogError>;
}

#[derive(Debug, Default)]
enum Staged {
    #[default]
    Clean,
    Snapshot(serde_json::Value),
    Wipe,
}

/// A [`FiberStore`] over any [`StateStore`], one key per scope.
pub struct StateFiberStore {
    state: Arc<dyn StateStore>,
    scope: Scope,
    key: String,
    staged: Staged,
}

impl StateFiberStore {
    /// Store the fiber of `scope` under [`DEFAULT_FIBER_KEY`].
    pub fn new(state: Arc<dyn StateStore>, scope: Scope) -> Self {
        Self {
            state,
            scope,
            key: DEFAULT_FIBER_KEY.to_owned(),
            staged: Staged::Clean,
        }
    }

    /// Use a different key.
    pub fn with_key(mut self, key: impl Into<String>) -> Self {
        self.key = key.into();
        self
    }

    /// The scope this store writes to.
    pub fn scope(&self) -> &Scope {
        &self.scope
    }
}

#[async_trait]
impl FiberStore for StateFiberStore {
    async fn try_load(&mut self, registry: &DialogRegistry) -> Result<Option<Fiber>, DialogError> {
        let Some(value) = self.state.read(&self.scope, &self.key).await? else {
            return Ok(None);
        };
        let snapshot: FiberSnapshot = serde_json::from_value(value)?;
        let fiber = Fiber::restore(snapshot, registry)?;
        tracing::debug!(key = %self.key, frames = fiber.len(), "spindle.store.load");
        Ok(Some(fiber))
    }

    fn save(&mut self, fiber: &Fiber) -> Result<(), DialogError> {
        let snapshot = fiber.snapshot()?;
        self.staged = Staged::Snapshot(serde_json::to_value(snapshot)?);
        Ok(())
    }

    fn reset(&mut self) {
        self.staged = Staged::Wipe;
    }

    async fn flush(&mut self) -> Result<(), DialogError> {
        match std::mem::take(&mut self.staged) {
            Staged::Clean => {}
            Staged::Snapshot(value) => {
                self.state.write(&self.scope, &self.key, value).await?;
                tracing::debug!(key = %self.key, "spindle.store.flush");
            }
            Staged::Wipe => {
                self.state.delete(&self.scope, &self.key).await?;
                tracing::info!(key = %self.key, "spindle.store.wipe");
            }
        }
        Ok(())
    }
}
