//! ScriptedStack: a DialogStack that records operations instead of
//! running dialogs.

use crate::activity::Item;
use crate::bot::BotToUser;
use crate::dialog::{Dialog, Resume};
use crate::error::DialogError;
use crate::registry::DialogRegistry;
use crate::stack::{DialogStack, FrameInfo};
use crate::test_utils::RecordingBotToUser;
use async_trait::async_trait;
use tokio_util::sync::CancellationToken;

/// One recorded stack operation.
#[derive(Debug, Clone, PartialEq)]
pub enum StackOp {
    /// A dialog of this kind was called.
    Call(String),
    /// A dialog of this kind was called and `item` forwarded into it.
    Forward(String, Item),
    /// The stack was polled.
    Poll,
    /// The stack was reset.
    Reset,
}

/// A [`DialogStack`] with fixed frames that records what scorables do to it.
#[derive(Default)]
pub struct ScriptedStack {
    frames: Vec<FrameInfo>,
    registry: DialogRegistry,
    bot: RecordingBotToUser,
    ops: Vec<StackOp>,
}

impl ScriptedStack {
    /// An empty stack over an empty registry.
    pub fn new() -> Self {
        Self::default()
    }

    /// Use this registry.
    pub fn with_registry(mut self, registry: DialogRegistry) -> Self {
        self.registry = registry;
        self
    }

    /// Report these frames, top first.
    pub fn with_frames(mut self, frames: Vec<FrameInfo>) -> Self {
        self.frames = frames;
        self
    }

    /// Operations recorded so far.
    pub fn ops(&self) -> &[StackOp] {
        &self.ops
    }

    /// The outbound recorder.
    pub fn recorder(&self) -> &RecordingBotToUser {
        &self.bot
    }
}

#[async_trait]
impl DialogStack for ScriptedStack {
    async fn frames(&mut self) -> Result<Vec<FrameInfo>, DialogError> {
        Ok(self.frames.clone())
    }

    async fn call(
        &mut self,
        dialog: Box<dyn Dialog>,
        _resume: Option<Resume>,
    ) -> Result<(), DialogError> {
        self.ops.push(StackOp::Call(dialog.kind().to_owned()));
        Ok(())
    }

    async fn forward(
        &mut self,
        dialog: Box<dyn Dialog>,
        _resume: Option<Resume>,
        item: Item,
        _token: &CancellationToken,
    ) -> Result<(), DialogError> {
        self.ops.push(StackOp::Forward(dialog.kind().to_owned(), item));
        Ok(())
    }

    async fn poll(&mut self, _token: &CancellationToken) -> Result<(), DialogError> {
        self.ops.push(StackOp::Poll);
        Ok(())
    }

    async fn reset(&mut self) -> Result<(), DialogError> {
        self.frames.clear();
        self.ops.push(StackOp::Reset);
        Ok(())
    }

    fn registry(&self) -> &DialogRegistry {
        &self.registry
    }

    fn bot(&self) -> &dyn BotToUser {
        &self.bot
    }
}
