//! Sample dialogs for exercising the stack end to end.

use crate::activity::{Item, WaitKind};
use crate::dialog::{Dialog, DialogContext};
use crate::error::DialogError;
use crate::registry::DialogRegistry;
use async_trait::async_trait;
use serde::{Deserialize, Serialize};

/// Echoes every message back with a running count. Completes with the
/// count when it receives `"done"`.
#[derive(Debug, Default, Clone, Serialize, Deserialize)]
pub struct EchoDialog {
    /// Messages echoed so far.
    pub count: u32,
}

impl EchoDialog {
    /// Registry kind.
    pub const KIND: &'static str = "echo";
}

#[async_trait]
impl Dialog for EchoDialog {
    fn kind(&self) -> &str {
        Self::KIND
    }

    async fn start(&mut self, ctx: &mut DialogContext<'_>) -> Result<(), DialogError> {
        ctx.wait(WaitKind::Message, "message");
        Ok(())
    }

    async fn resume(
        &mut self,
        ctx: &mut DialogContext<'_>,
        stage: &str,
        result: Result<Item, DialogError>,
    ) -> Result<(), DialogError> {
        match (stage, result?) {
            ("message", Item::Message(m)) if m.text == "done" => {
                ctx.done(serde_json::json!(self.count));
            }
            ("message", Item::Message(m)) => {
                self.count += 1;
                ctx.post_to_user(format!("{}: {}", self.count, m.text)).await?;
                ctx.wait(WaitKind::Message, "message");
            }
            (stage, _) => {
                return Err(DialogError::UnknownStage {
                    dialog: Self::KIND.into(),
                    stage: stage.into(),
                });
            }
        }
        Ok(())
    }
}

/// Sends a prompt, waits for one message, and completes with its text.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AskDialog {
    /// The prompt sent on start.
    pub prompt: String,
}

impl AskDialog {
    /// Registry kind.
    pub const KIND: &'static str = "ask";

    /// Create an ask dialog.
    pub fn new(prompt: impl Into<String>) -> Self {
        Self {
            prompt: prompt.into(),
        }
    }
}

#[async_trait]
impl Dialog for AskDialog {
    fn kind(&self) -> &str {
        Self::KIND
    }

    async fn start(&mut self, ctx: &mut DialogContext<'_>) -> Result<(), DialogError> {
        ctx.post_to_user(self.prompt.as_str()).await?;
        ctx.wait(WaitKind::Message, "answer");
        Ok(())
    }

    async fn resume(
        &mut self,
        ctx: &mut DialogContext<'_>,
        _stage: &str,
        result: Result<Item, DialogError>,
    ) -> Result<(), DialogError> {
        let answer = result?.to_text();
        ctx.done(serde_json::Value::String(answer));
        Ok(())
    }
}

/// Register every sample dialog under its kind.
pub fn register_samples(registry: &mut DialogRegistry) {
    registry.register::<EchoDialog>(EchoDialog::KIND);
    registry.register::<AskDialog>(AskDialog::KIND);
}
