//! EventScorable: named events.

use crate::action::Action;
use async_trait::async_trait;
use layer0::{Activity, DialogStack, Scorable, ScorableError, ScorableState};
use tokio_util::sync::CancellationToken;

/// Matches events by exact name with score 1.0 and runs its actions.
pub struct EventScorable {
    name: String,
    actions: Vec<Action>,
}

impl EventScorable {
    /// Match events named `name`.
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            actions: Vec::new(),
        }
    }

    /// Append an action.
    pub fn then(mut self, action: Action) -> Self {
        self.actions.push(action);
        self
    }
}

#[async_trait]
impl Scorable<Activity, f64> for EventScorable {
    async fn prepare(
        &self,
        _item: &Activity,
        _token: &CancellationToken,
    ) -> Result<ScorableState, ScorableError> {
        Ok(None)
    }

    fn score(&self, item: &Activity, _state: &ScorableState) -> Option<f64> {
        match item {
            Activity::Event(event) if event.name == self.name => Some(1.0),
            _ => None,
        }
    }

    async fn post(
        &self,
        item: &Activity,
        _state: &ScorableState,
        stack: &mut dyn DialogStack,
        token: &CancellationToken,
    ) -> Result<(), ScorableError> {
        for action in &self.actions {
            action.run(item, stack, token).await?;
        }
        Ok(())
    }
}
