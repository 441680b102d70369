//! Driving a single scorable through its lifecycle.

use layer0::{DialogStack, Scorable};
use tokio_util::sync::CancellationToken;

/// Offer `item` to `scorable`: prepare, check for a score, post if there
/// is one, and always release the state.
///
/// Returns whether the scorable took the item. Failures in any phase are
/// logged and count as "not taken"; they never reach the caller.
pub async fn try_post<I, S, T>(
    scorable: &T,
    item: &I,
    stack: &mut dyn DialogStack,
    token: &CancellationToken,
) -> bool
where
    I: Send + Sync,
    S: Send,
    T: Scorable<I, S> + ?Sized,
{
    let state = match scorable.prepare(item, token).await {
        Ok(state) => state,
        Err(e) => {
            tracing::warn!(error = %e, "spindle.scorable.prepare_failed");
            return false;
        }
    };

    let mut posted = false;
    if scorable.has_score(item, &state) {
        match scorable.post(item, &state, stack, token).await {
            Ok(()) => posted = true,
            Err(e) => tracing::warn!(error = %e, "spindle.scorable.post_failed"),
        }
    }

    if let Err(e) = scorable.done(item, state).await {
        tracing::warn!(error = %e, "spindle.scorable.done_failed");
    }
    posted
}
