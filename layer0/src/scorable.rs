//! The Scorable interface: out-of-band matchers that may intercept an
//! item before it reaches the dialog stack.

use crate::{activity::Activity, error::ScorableError, stack::DialogStack};
use async_trait::async_trait;
use std::any::Any;
use tokio_util::sync::CancellationToken;

/// Opaque per-invocation state, produced by [`Scorable::prepare`] and
/// handed back to every later lifecycle call for the same item.
pub type ScorableState = Option<Box<dyn Any + Send + Sync>>;

/// A typed matcher over items of type `I` producing scores of type `S`.
///
/// Lifecycle per item: `prepare`, then `has_score`/`score`, then `post`
/// only if this scorable won, then `done` unconditionally.
#[async_trait]
pub trait Scorable<I, S>: Send + Sync
where
    I: Send + Sync,
    S: Send,
{
    /// Inspect the item and compute state for the rest of the lifecycle.
    async fn prepare(
        &self,
        item: &I,
        token: &CancellationToken,
    ) -> Result<ScorableState, ScorableError>;

    /// The score for this item, or `None` if the scorable does not match.
    fn score(&self, item: &I, state: &ScorableState) -> Option<S>;

    /// Whether [`Scorable::score`] yields a score.
    fn has_score(&self, item: &I, state: &ScorableState) -> bool {
        self.score(item, state).is_some()
    }

    /// Act on the item. Called only for the winning scorable.
    async fn post(
        &self,
        item: &I,
        state: &ScorableState,
        stack: &mut dyn DialogStack,
        token: &CancellationToken,
    ) -> Result<(), ScorableError>;

    /// Release the state. Called for every prepared scorable.
    async fn done(&self, item: &I, state: ScorableState) -> Result<(), ScorableError> {
        let _ = (item, state);
        Ok(())
    }
}

/// The scorable shape the router works with: activities scored in `[0, 1]`.
pub type ActivityScorable = dyn Scorable<Activity, f64>;

/// Downcast helper for implementations reading back their own state.
pub fn state_ref<T: 'static>(state: &ScorableState) -> Option<&T> {
    state.as_ref().and_then(|s| s.downcast_ref::<T>())
}
