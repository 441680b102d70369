//! FoldScorable: many candidates, one winner.

use async_trait::async_trait;
use layer0::{DialogError, DialogStack, Scorable, ScorableError, ScorableState, state_ref};
use std::any::Any;
use std::cmp::Ordering;
use std::sync::Arc;
use tokio_util::sync::CancellationToken;

/// Orders two scores.
pub type Comparator<S> = Arc<dyn Fn(&S, &S) -> Ordering + Send + Sync>;

/// A scorable made of candidates. Its score is the best candidate score
/// under the comparator; posting posts the winner.
///
/// Every candidate is prepared and released. Candidates whose `prepare`
/// fails are logged and sit out. A candidate is eligible only if its
/// score is at least the minimum. Among equal scores the candidate
/// declared first wins. If `prepare` is cancelled partway, the
/// candidates already prepared are released before the error returns.
pub struct FoldScorable<I, S> {
    candidates: Vec<Arc<dyn Scorable<I, S>>>,
    compare: Comparator<S>,
    minimum: Option<S>,
}

struct FoldState {
    /// `None` where the candidate's prepare failed.
    states: Vec<Option<ScorableState>>,
    winner: Option<usize>,
}

impl<I, S> FoldScorable<I, S>
where
    I: Send + Sync + 'static,
    S: Send + Sync + 'static,
{
    /// Fold `candidates` under `compare`, with no minimum.
    pub fn new(
        candidates: Vec<Arc<dyn Scorable<I, S>>>,
        compare: impl Fn(&S, &S) -> Ordering + Send + Sync + 'static,
    ) -> Self {
        Self {
            candidates,
            compare: Arc::new(compare),
            minimum: None,
        }
    }

    /// Only scores at or above `minimum` are eligible.
    pub fn with_minimum(mut self, minimum: S) -> Self {
        self.minimum = Some(minimum);
        self
    }

    /// Number of candidates.
    pub fn len(&self) -> usize {
        self.candidates.len()
    }

    /// Whether there are no candidates.
    pub fn is_empty(&self) -> bool {
        self.candidates.is_empty()
    }

    async fn release(&self, item: &I, states: Vec<Option<ScorableState>>) {
        for (candidate, inner) in self.candidates.iter().zip(states) {
            let Some(inner) = inner else { continue };
            if let Err(e) = candidate.done(item, inner).await {
                tracing::warn!(error = %e, "spindle.fold.done_failed");
            }
        }
    }

    fn select(&self, item: &I, states: &[Option<ScorableState>]) -> Option<usize> {
        let mut best: Option<(usize, S)> = None;
        for (index, (candidate, state)) in self.candidates.iter().zip(states).enumerate() {
            let Some(state) = state else { continue };
            let Some(score) = candidate.score(item, state) else {
                continue;
            };
            if let Some(minimum) = &self.minimum {
                if (self.compare)(&score, minimum) == Ordering::Less {
                    continue;
                }
            }
            let better = match &best {
                Some((_, current)) => (self.compare)(&score, current) == Ordering::Greater,
                None => true,
            };
            if better {
                best = Some((index, score));
            }
        }
        best.map(|(index, _)| index)
    }
}

impl<I> FoldScorable<I, f64>
where
    I: Send + Sync + 'static,
{
    /// Fold `f64` scores in numeric order. NaN sorts below every number,
    /// so a NaN score never clears the minimum.
    pub fn by_score(candidates: Vec<Arc<dyn Scorable<I, f64>>>, minimum: f64) -> Self {
        Self::new(candidates, nan_lowest).with_minimum(minimum)
    }
}

fn nan_lowest(a: &f64, b: &f64) -> Ordering {
    match (a.is_nan(), b.is_nan()) {
        (true, true) => Ordering::Equal,
        (true, false) => Ordering::Less,
        (false, true) => Ordering::Greater,
        (false, false) => a.partial_cmp(b).unwrap_or(Ordering::Equal),
    }
}

#[async_trait]
impl<I, S> Scorable<I, S> for FoldScorable<I, S>
where
    I: Send + Sync + 'static,
    S: Send + Sync + 'static,
{
    async fn prepare(
        &self,
        item: &I,
        token: &CancellationToken,
    ) -> Result<ScorableState, ScorableError> {
        let mut states = Vec::with_capacity(self.candidates.len());
        for candidate in &self.candidates {
            if token.is_cancelled() {
                self.release(item, states).await;
                return Err(DialogError::Canceled.into());
            }
            match candidate.prepare(item, token).await {
                Ok(state) => states.push(Some(state)),
                Err(e) => {
                    tracing::warn!(error = %e, "spindle.fold.prepare_failed");
                    states.push(None);
                }
            }
        }
        let winner = self.select(item, &states);
        let fold: Box<dyn Any + Send + Sync> = Box::new(FoldState { states, winner });
        Ok(Some(fold))
    }

    fn score(&self, item: &I, state: &ScorableState) -> Option<S> {
        let fold = state_ref::<FoldState>(state)?;
        let index = fold.winner?;
        let inner = fold.states.get(index)?.as_ref()?;
        self.candidates[index].score(item, inner)
    }

    fn has_score(&self, _item: &I, state: &ScorableState) -> bool {
        state_ref::<FoldState>(state).is_some_and(|fold| fold.winner.is_some())
    }

    async fn post(
        &self,
        item: &I,
        state: &ScorableState,
        stack: &mut dyn DialogStack,
        token: &CancellationToken,
    ) -> Result<(), ScorableError> {
        let Some(fold) = state_ref::<FoldState>(state) else {
            return Ok(());
        };
        let Some(index) = fold.winner else {
            return Ok(());
        };
        let Some(Some(inner)) = fold.states.get(index) else {
            return Ok(());
        };
        self.candidates[index].post(item, inner, stack, token).await
    }

    async fn done(&self, item: &I, state: ScorableState) -> Result<(), ScorableError> {
        let Some(fold) = state.and_then(|s| s.downcast::<FoldState>().ok()) else {
            return Ok(());
        };
        self.release(item, fold.states).await;
        Ok(())
    }
}
