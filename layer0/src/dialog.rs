//! The Dialog protocol: resumable units of conversational logic.
//!
//! A dialog is a serializable state machine. The engine runs one step of
//! it at a time: [`Dialog::start`] when it is first called, then
//! [`Dialog::resume`] with the stage it asked to be resumed at and the
//! item (or fault) that satisfied its wait. During a step the dialog
//! records exactly one stack command on the [`DialogContext`]:
//! wait, call, done, fail, or post. Everything a dialog needs after the
//! step must live in its own fields, because between steps it may be
//! serialized, persisted, and rebuilt in another process.

use crate::{
    activity::{Event, Item, Message, WaitKind},
    bot::BotToUser,
    error::DialogError,
    registry::DialogRegistry,
};
use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use std::fmt;
use tokio_util::sync::CancellationToken;

/// Where a suspended frame continues.
///
/// Continuations are data, not closures: a stage label the owning
/// dialog's [`Dialog::resume`] dispatches on. This is what lets a whole
/// stack of pending continuations round-trip through JSON.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Resume {
    /// Run [`Dialog::start`].
    Start,
    /// Run [`Dialog::resume`] with this stage label.
    Stage(String),
}

impl Resume {
    /// Create a stage continuation.
    pub fn stage(name: impl Into<String>) -> Self {
        Resume::Stage(name.into())
    }

    /// The stage label, if this is not the start continuation.
    pub fn as_stage(&self) -> Option<&str> {
        match self {
            Resume::Start => None,
            Resume::Stage(s) => Some(s),
        }
    }
}

impl From<&str> for Resume {
    fn from(s: &str) -> Self {
        Resume::Stage(s.to_owned())
    }
}

impl From<String> for Resume {
    fn from(s: String) -> Self {
        Resume::Stage(s)
    }
}

impl fmt::Display for Resume {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Resume::Start => f.write_str("<start>"),
            Resume::Stage(s) => f.write_str(s),
        }
    }
}

/// Serializes a dialog's fields for persistence.
///
/// Blanket-implemented for every `Serialize` type, so any serde dialog
/// satisfies it. A dialog that cannot be serialized cannot implement
/// [`Dialog`] at all.
pub trait DialogState {
    /// The dialog's fields as JSON.
    fn state(&self) -> Result<serde_json::Value, serde_json::Error>;
}

impl<T: Serialize> DialogState for T {
    fn state(&self) -> Result<serde_json::Value, serde_json::Error> {
        serde_json::to_value(self)
    }
}

/// What a dialog can do beyond receiving items through its waits.
///
/// Declared up front instead of discovered by probing: the router asks
/// every active frame for its capabilities before each routing decision.
#[non_exhaustive]
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Capabilities {
    /// Names of registered scorables to offer every inbound activity to
    /// while this dialog is on the stack.
    #[serde(default)]
    pub scorables: Vec<String>,
}

impl Capabilities {
    /// No capabilities.
    pub fn none() -> Self {
        Self::default()
    }

    /// Add a named scorable.
    pub fn with_scorable(mut self, name: impl Into<String>) -> Self {
        self.scorables.push(name.into());
        self
    }
}

/// Protocol: Dialog
///
/// One frame's worth of conversational logic. Implementations are
/// registered by [`Dialog::kind`] in a [`DialogRegistry`] so persisted
/// stacks can be rebuilt.
#[async_trait]
pub trait Dialog: DialogState + fmt::Debug + Send + Sync {
    /// The registry key this dialog is restored under.
    fn kind(&self) -> &str;

    /// First step, run when the frame is pushed.
    async fn start(&mut self, ctx: &mut DialogContext<'_>) -> Result<(), DialogError>;

    /// Continue at `stage` with the item or fault that satisfied the wait.
    ///
    /// Returning `Err` fails this frame: it is popped and the error is
    /// delivered to the caller's resume.
    async fn resume(
        &mut self,
        ctx: &mut DialogContext<'_>,
        stage: &str,
        result: Result<Item, DialogError>,
    ) -> Result<(), DialogError> {
        let _ = (ctx, result);
        Err(DialogError::UnknownStage {
            dialog: self.kind().to_owned(),
            stage: stage.to_owned(),
        })
    }

    /// What this dialog offers the router while it is on the stack.
    fn capabilities(&self) -> Capabilities {
        Capabilities::none()
    }
}

/// A dialog frozen as data: its registry kind plus its serialized fields.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DialogSnapshot {
    /// Registry kind.
    pub kind: String,
    /// Serialized fields.
    pub state: serde_json::Value,
}

impl DialogSnapshot {
    /// Capture a live dialog.
    pub fn of(dialog: &dyn Dialog) -> Result<Self, DialogError> {
        Ok(Self {
            kind: dialog.kind().to_owned(),
            state: dialog.state()?,
        })
    }
}

/// A stack command recorded by one dialog step.
#[derive(Debug)]
pub enum Command {
    /// Push a child frame. With `resume`, the caller waits for the
    /// child's result at that stage. Without, the caller's last wait is
    /// re-armed so the child's result satisfies it.
    Call {
        /// The child dialog.
        dialog: Box<dyn Dialog>,
        /// Where the caller continues with the child's result.
        resume: Option<Resume>,
    },
    /// Suspend until an item of `kind` arrives.
    Wait {
        /// Accepted item kind.
        kind: WaitKind,
        /// Where to continue.
        resume: Resume,
    },
    /// Pop this frame and deliver a value to the caller.
    Done(Item),
    /// Pop this frame and deliver a fault to the caller.
    Fail(DialogError),
    /// Queue an event and wait for it to come back through the router.
    Post {
        /// The event to queue.
        event: Event,
        /// Where to continue when the event is consumed.
        resume: Resume,
    },
}

impl Command {
    /// Short name for logs.
    pub fn name(&self) -> &'static str {
        match self {
            Command::Call { .. } => "call",
            Command::Wait { .. } => "wait",
            Command::Done(_) => "done",
            Command::Fail(_) => "fail",
            Command::Post { .. } => "post",
        }
    }
}

/// Everything a dialog step can reach: the registry, the outbound sink,
/// the cancellation token, and the command it records for the stack.
pub struct DialogContext<'a> {
    registry: &'a DialogRegistry,
    bot: &'a dyn BotToUser,
    token: &'a CancellationToken,
    commands: Vec<Command>,
}

impl<'a> DialogContext<'a> {
    /// Create a context for one step.
    pub fn new(
        registry: &'a DialogRegistry,
        bot: &'a dyn BotToUser,
        token: &'a CancellationToken,
    ) -> Self {
        Self {
            registry,
            bot,
            token,
            commands: Vec::new(),
        }
    }

    /// Call a child and continue at `stage` with its result.
    pub fn call(&mut self, dialog: Box<dyn Dialog>, stage: impl Into<Resume>) {
        self.commands.push(Command::Call {
            dialog,
            resume: Some(stage.into()),
        });
    }

    /// Call a child whose result satisfies this dialog's previous wait.
    pub fn call_through(&mut self, dialog: Box<dyn Dialog>) {
        self.commands.push(Command::Call {
            dialog,
            resume: None,
        });
    }

    /// Wait for the next item of `kind`.
    pub fn wait(&mut self, kind: WaitKind, stage: impl Into<Resume>) {
        self.commands.push(Command::Wait {
            kind,
            resume: stage.into(),
        });
    }

    /// Complete with a value.
    pub fn done(&mut self, item: impl Into<Item>) {
        self.commands.push(Command::Done(item.into()));
    }

    /// Complete with a fault.
    pub fn fail(&mut self, error: DialogError) {
        self.commands.push(Command::Fail(error));
    }

    /// Queue `event` for the router and continue at `stage` once it has
    /// been consumed.
    pub fn post_event(&mut self, event: Event, stage: impl Into<Resume>) {
        self.commands.push(Command::Post {
            event,
            resume: stage.into(),
        });
    }

    /// Send a message to the user. Side effect only; not a stack command.
    pub async fn post_to_user(&self, message: impl Into<Message>) -> Result<(), DialogError> {
        self.bot.post(message.into()).await
    }

    /// The registry, for restoring dialogs and resolving named functions.
    pub fn registry(&self) -> &'a DialogRegistry {
        self.registry
    }

    /// The cancellation token of the current poll.
    pub fn token(&self) -> &'a CancellationToken {
        self.token
    }

    /// The commands recorded so far.
    pub fn commands(&self) -> &[Command] {
        &self.commands
    }

    /// Consume the context, yielding the recorded commands.
    pub fn into_commands(self) -> Vec<Command> {
        self.commands
    }
}
