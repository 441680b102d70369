//! The stack seen from outside: frame states and the operations
//! scorables may perform on a conversation's dialog stack.

use crate::{
    activity::{Item, WaitKind},
    bot::BotToUser,
    dialog::{Capabilities, Dialog, Resume},
    error::DialogError,
    id::FrameId,
    registry::DialogRegistry,
};
use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use std::fmt;
use tokio_util::sync::CancellationToken;

/// What a frame's wait needs next.
///
/// ```text
///   None ──wait──▶ Wait ──item──▶ Poll ──step──▶ Call ──▶ Done
///                   ▲                                      │
///                   └──────────── next command ────────────┘
/// ```
///
/// Between polls the top frame must be in `Wait`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Need {
    /// Nothing armed.
    None,
    /// Armed, waiting for an item.
    Wait,
    /// Satisfied, ready to run.
    Poll,
    /// Running.
    Call,
    /// Ran, consumed.
    Done,
}

impl fmt::Display for Need {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Need::None => "none",
            Need::Wait => "wait",
            Need::Poll => "poll",
            Need::Call => "call",
            Need::Done => "done",
        };
        f.write_str(name)
    }
}

/// A read-only view of one frame.
#[non_exhaustive]
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FrameInfo {
    /// Frame id.
    pub id: FrameId,
    /// Kind of the dialog that owns the frame.
    pub dialog: String,
    /// State of the frame's wait.
    pub need: Need,
    /// Kind of item the wait accepts.
    pub wait: WaitKind,
    /// Where the frame continues.
    pub resume: Option<Resume>,
    /// What the owning dialog offers the router.
    pub capabilities: Capabilities,
}

impl FrameInfo {
    /// Create a frame view.
    pub fn new(id: FrameId, dialog: impl Into<String>, need: Need, wait: WaitKind) -> Self {
        Self {
            id,
            dialog: dialog.into(),
            need,
            wait,
            resume: None,
            capabilities: Capabilities::none(),
        }
    }

    /// Attach the continuation.
    pub fn with_resume(mut self, resume: Option<Resume>) -> Self {
        self.resume = resume;
        self
    }

    /// Attach the owning dialog's capabilities.
    pub fn with_capabilities(mut self, capabilities: Capabilities) -> Self {
        self.capabilities = capabilities;
        self
    }
}

/// Operations on a conversation's dialog stack, as offered to scorables.
///
/// Implemented by the dialog task. Every mutating call persists its
/// outcome the same way an inbound item would.
#[async_trait]
pub trait DialogStack: Send {
    /// Active frames, top of stack first.
    async fn frames(&mut self) -> Result<Vec<FrameInfo>, DialogError>;

    /// Push `dialog` without running it.
    async fn call(
        &mut self,
        dialog: Box<dyn Dialog>,
        resume: Option<Resume>,
    ) -> Result<(), DialogError>;

    /// Call `dialog`, run it, deliver `item` into whatever it waits on,
    /// and run again.
    async fn forward(
        &mut self,
        dialog: Box<dyn Dialog>,
        resume: Option<Resume>,
        item: Item,
        token: &CancellationToken,
    ) -> Result<(), DialogError>;

    /// Run ready frames until the stack suspends.
    async fn poll(&mut self, token: &CancellationToken) -> Result<(), DialogError>;

    /// Drop every frame and wipe the persisted stack.
    async fn reset(&mut self) -> Result<(), DialogError>;

    /// The registry this stack restores dialogs from.
    fn registry(&self) -> &DialogRegistry;

    /// The outbound sink of this conversation.
    fn bot(&self) -> &dyn BotToUser;
}
