//! ScoringEventLoop: the router gets first look at every activity.

use crate::task::QueuedStack;
use layer0::{Activity, DialogError, Need};
use spindle_scorables::DialogRouter;
use tokio_util::sync::CancellationToken;

/// Drains a stack's queue, offering each activity to the router before
/// the stack's waiting dialog sees it.
///
/// Per pulled activity: poll (completing any wait its pulled callback
/// satisfied), route, deliver it to the stack if no scorable took it and
/// no callback claimed it, poll again.
///
/// A scorable that fails partway through `post` may already have changed
/// the stack. Before delivering, the loop polls once more if the top frame
/// is no longer waiting, so the item lands on a stack that can take it.
pub struct ScoringEventLoop<'r, T> {
    inner: T,
    router: &'r DialogRouter,
}

impl<'r, T: QueuedStack> ScoringEventLoop<'r, T> {
    /// Drive `inner` through `router`.
    pub fn new(inner: T, router: &'r DialogRouter) -> Self {
        Self { inner, router }
    }

    /// The driven stack.
    pub fn inner(&self) -> &T {
        &self.inner
    }

    /// The driven stack, mutably.
    pub fn inner_mut(&mut self) -> &mut T {
        &mut self.inner
    }

    /// Give back the driven stack.
    pub fn into_inner(self) -> T {
        self.inner
    }

    /// Queue `activity` and process everything queued.
    pub async fn post(
        &mut self,
        activity: Activity,
        token: &CancellationToken,
    ) -> Result<(), DialogError> {
        self.inner.enqueue(activity);
        self.poll(token).await
    }

    /// Process everything queued.
    pub async fn poll(&mut self, token: &CancellationToken) -> Result<(), DialogError> {
        self.inner.poll(token).await?;
        while let Some(pulled) = self.inner.pull().await? {
            self.inner.poll(token).await?;
            let routed = self.router.route(&pulled.item, &mut self.inner, token).await?;
            tracing::debug!(routed, claimed = pulled.claimed, "spindle.loop.activity");
            if !routed && !pulled.claimed {
                if !self.waiting().await? {
                    self.inner.poll(token).await?;
                }
                self.inner.deliver(pulled.item.into()).await?;
            }
            self.inner.poll(token).await?;
        }
        Ok(())
    }

    async fn waiting(&mut self) -> Result<bool, DialogError> {
        let frames = self.inner.frames().await?;
        Ok(frames.first().is_some_and(|top| top.need == Need::Wait))
    }
}
