//! What a matched scorable does to the stack.

use layer0::{Activity, DialogError, DialogSnapshot, DialogStack, Message, WaitKind};
use serde::{Deserialize, Serialize};
use spindle_chain::Chain;
use tokio_util::sync::CancellationToken;

/// One stack action, run in order when a command or event scorable wins.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "action", rename_all = "snake_case")]
pub enum Action {
    /// Drop every frame and wipe the persisted stack.
    Reset,
    /// Send a fixed reply.
    Reply {
        /// Reply text.
        text: String,
    },
    /// Interrupt whatever the stack waits on with `dialog`, forwarding the
    /// activity into it. Afterwards the interrupted wait receives the next
    /// item of the kind it was waiting for.
    Interrupt {
        /// Dialog to run.
        dialog: DialogSnapshot,
    },
    /// Push `dialog` above the current top and run it. Its result goes
    /// wherever the current top was waiting.
    Call {
        /// Dialog to run.
        dialog: DialogSnapshot,
    },
}

impl Action {
    /// Reply with `text`.
    pub fn reply(text: impl Into<String>) -> Self {
        Action::Reply { text: text.into() }
    }

    /// Perform the action for `activity`.
    pub async fn run(
        &self,
        activity: &Activity,
        stack: &mut dyn DialogStack,
        token: &CancellationToken,
    ) -> Result<(), DialogError> {
        match self {
            Action::Reset => stack.reset().await,
            Action::Reply { text } => stack.bot().post(Message::new(text.as_str())).await,
            Action::Interrupt { dialog } => {
                let frames = stack.frames().await?;
                let kind = frames.first().map_or(WaitKind::Any, |top| top.wait);
                let voided = Chain::Void {
                    antecedent: dialog.clone(),
                    kind,
                };
                tracing::debug!(dialog = %dialog.kind, wait = %kind, "spindle.action.interrupt");
                stack
                    .forward(Box::new(voided), None, activity.clone().into(), token)
                    .await
            }
            Action::Call { dialog } => {
                let dialog = stack.registry().restore(dialog)?;
                stack.call(dialog, None).await?;
                stack.poll(token).await
            }
        }
    }
}
