//! CommandScorable: regex commands over message text.

use crate::{action::Action, regex_cache::RegexCache};
use async_trait::async_trait;
use layer0::{Activity, DialogStack, Scorable, ScorableError, ScorableState, state_ref};
use std::any::Any;
use std::sync::Arc;
use tokio_util::sync::CancellationToken;

/// Matches message text against a pattern and, when it wins, runs its
/// actions in order.
///
/// The score is the fraction of the text the first match covers, so an
/// exact `^cancel$` scores 1.0 and a word inside a sentence scores less.
/// Events and empty messages never match.
pub struct CommandScorable {
    pattern: String,
    cache: Arc<RegexCache>,
    actions: Vec<Action>,
}

struct CommandMatch {
    score: f64,
}

impl CommandScorable {
    /// A command over `pattern` with its own cache. Fails if the pattern
    /// does not compile.
    pub fn new(pattern: impl Into<String>) -> Result<Self, ScorableError> {
        Self::with_cache(pattern, Arc::new(RegexCache::new()))
    }

    /// A command over `pattern` compiled through a shared cache.
    pub fn with_cache(
        pattern: impl Into<String>,
        cache: Arc<RegexCache>,
    ) -> Result<Self, ScorableError> {
        let pattern = pattern.into();
        cache
            .get_or_compile(&pattern)
            .map_err(|e| ScorableError::Failed(format!("bad pattern {pattern:?}: {e}")))?;
        Ok(Self {
            pattern,
            cache,
            actions: Vec::new(),
        })
    }

    /// Append an action.
    pub fn then(mut self, action: Action) -> Self {
        self.actions.push(action);
        self
    }

    /// The pattern source.
    pub fn pattern(&self) -> &str {
        &self.pattern
    }

    /// The actions, in run order.
    pub fn actions(&self) -> &[Action] {
        &self.actions
    }
}

#[async_trait]
impl Scorable<Activity, f64> for CommandScorable {
    async fn prepare(
        &self,
        item: &Activity,
        _token: &CancellationToken,
    ) -> Result<ScorableState, ScorableError> {
        let Activity::Message(message) = item else {
            return Ok(None);
        };
        if message.text.is_empty() {
            return Ok(None);
        }
        let regex = self
            .cache
            .get_or_compile(&self.pattern)
            .map_err(|e| ScorableError::Failed(e.to_string()))?;
        let Some(found) = regex.find(&message.text) else {
            return Ok(None);
        };
        let score = found.as_str().len() as f64 / message.text.len() as f64;
        let state: Box<dyn Any + Send + Sync> = Box::new(CommandMatch { score });
        Ok(Some(state))
    }

    fn score(&self, _item: &Activity, state: &ScorableState) -> Option<f64> {
        state_ref::<CommandMatch>(state).map(|m| m.score)
    }

    async fn post(
        &self,
        item: &Activity,
        _state: &ScorableState,
        stack: &mut dyn DialogStack,
        token: &CancellationToken,
    ) -> Result<(), ScorableError> {
        tracing::debug!(
            pattern = %self.pattern,
            actions = self.actions.len(),
            "spindle.command.post"
        );
        for action in &self.actions {
            action.run(item, stack, token).await?;
        }
        Ok(())
    }
}
