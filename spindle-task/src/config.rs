//! Engine configuration.

use serde::{Deserialize, Serialize};
use spindle_fiber::{DEFAULT_FIBER_KEY, DEFAULT_MAX_STEPS};
use spindle_scorables::RouterConfig;

/// Settings for one dialog task.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct TaskConfig {
    /// Steps one poll may run before failing.
    pub max_steps: usize,
    /// Key the fiber is stored under within the conversation scope.
    pub state_key: String,
}

impl Default for TaskConfig {
    fn default() -> Self {
        Self {
            max_steps: DEFAULT_MAX_STEPS,
            state_key: DEFAULT_FIBER_KEY.to_owned(),
        }
    }
}

/// Settings for the whole engine.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct EngineConfig {
    /// Per-task settings.
    pub task: TaskConfig,
    /// Router settings.
    pub router: RouterConfig,
}
