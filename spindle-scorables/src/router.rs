//! DialogRouter: per-activity candidate assembly and dispatch.

use crate::{fold::FoldScorable, lifecycle::try_post};
use layer0::{Activity, ActivityScorable, DialogError, DialogStack};
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use tokio_util::sync::CancellationToken;

/// Router settings.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct RouterConfig {
    /// Scores below this never win.
    pub minimum_score: f64,
}

impl Default for RouterConfig {
    fn default() -> Self {
        Self { minimum_score: 0.1 }
    }
}

/// Routes activities to scorables before the stack sees them.
///
/// Candidates are rebuilt on every activity: first the scorables each
/// active frame offers through its capabilities, top of stack first,
/// then the fixed globals. The current dialog thus gets first right of
/// refusal on ties.
pub struct DialogRouter {
    globals: Vec<Arc<ActivityScorable>>,
    config: RouterConfig,
}

impl DialogRouter {
    /// A router with no globals.
    pub fn new(config: RouterConfig) -> Self {
        Self {
            globals: Vec::new(),
            config,
        }
    }

    /// Add a process-wide scorable, consulted after frame scorables.
    pub fn with_global(mut self, scorable: Arc<ActivityScorable>) -> Self {
        self.globals.push(scorable);
        self
    }

    /// Add a process-wide scorable in place.
    pub fn add_global(&mut self, scorable: Arc<ActivityScorable>) {
        self.globals.push(scorable);
    }

    /// Replace the settings, keeping the globals.
    pub fn set_config(&mut self, config: RouterConfig) {
        self.config = config;
    }

    /// The settings.
    pub fn config(&self) -> &RouterConfig {
        &self.config
    }

    /// Assemble the candidates for the stack as it is now.
    pub async fn candidates(
        &self,
        stack: &mut dyn DialogStack,
    ) -> Result<Vec<Arc<ActivityScorable>>, DialogError> {
        let frames = stack.frames().await?;
        let mut candidates = Vec::new();
        for frame in &frames {
            for name in &frame.capabilities.scorables {
                match stack.registry().scorable(name) {
                    Some(scorable) => candidates.push(scorable),
                    None => tracing::warn!(
                        scorable = %name,
                        dialog = %frame.dialog,
                        "spindle.router.unknown_scorable"
                    ),
                }
            }
        }
        candidates.extend(self.globals.iter().cloned());
        Ok(candidates)
    }

    /// Offer `activity` to the candidates. Returns whether one took it.
    pub async fn route(
        &self,
        activity: &Activity,
        stack: &mut dyn DialogStack,
        token: &CancellationToken,
    ) -> Result<bool, DialogError> {
        let candidates = self.candidates(stack).await?;
        if candidates.is_empty() {
            return Ok(false);
        }
        let count = candidates.len();
        let fold = FoldScorable::by_score(candidates, self.config.minimum_score);
        let routed = try_post(&fold, activity, stack, token).await;
        tracing::debug!(candidates = count, routed, "spindle.router.route");
        Ok(routed)
    }
}

impl Default for DialogRouter {
    fn default() -> Self {
        Self::new(RouterConfig::default())
    }
}
