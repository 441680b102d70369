//! Frames and the persistent form of a fiber.

use crate::wait::{Mark, Wait, WaitSnapshot};
use layer0::{Dialog, DialogError, DialogRegistry, DialogSnapshot, FrameId, FrameInfo};
use serde::{Deserialize, Serialize};

/// Version tag written into every [`FiberSnapshot`].
pub const SNAPSHOT_VERSION: u32 = 1;

/// One activation on the stack: a dialog, its pending wait, and the mark
/// of the last wait it armed for itself.
#[derive(Debug)]
pub struct Frame {
    pub(crate) id: FrameId,
    pub(crate) dialog: Box<dyn Dialog>,
    pub(crate) wait: Wait,
    pub(crate) mark: Option<Mark>,
}

impl Frame {
    pub(crate) fn new(id: FrameId, dialog: Box<dyn Dialog>, wait: Wait) -> Self {
        Self {
            id,
            dialog,
            wait,
            mark: None,
        }
    }

    /// Frame id.
    pub fn id(&self) -> FrameId {
        self.id
    }

    /// The owning dialog.
    pub fn dialog(&self) -> &dyn Dialog {
        self.dialog.as_ref()
    }

    /// The pending wait.
    pub fn wait(&self) -> &Wait {
        &self.wait
    }

    /// The last wait this frame armed for itself.
    pub fn mark(&self) -> Option<&Mark> {
        self.mark.as_ref()
    }

    /// Read-only view for routing and inspection.
    pub fn info(&self) -> FrameInfo {
        FrameInfo::new(
            self.id,
            self.dialog.kind(),
            self.wait.need(),
            self.wait.kind(),
        )
        .with_resume(self.wait.resume().cloned())
        .with_capabilities(self.dialog.capabilities())
    }

    /// Capture the frame.
    pub fn snapshot(&self) -> Result<FrameSnapshot, DialogError> {
        Ok(FrameSnapshot {
            id: self.id,
            dialog: DialogSnapshot::of(self.dialog.as_ref())?,
            wait: self.wait.snapshot(),
            mark: self.mark.clone(),
        })
    }

    /// Rebuild a frame, restoring its dialog through the registry.
    pub fn restore(
        snapshot: FrameSnapshot,
        registry: &DialogRegistry,
    ) -> Result<Self, DialogError> {
        Ok(Self {
            id: snapshot.id,
            dialog: registry.restore(&snapshot.dialog)?,
            wait: Wait::restore(snapshot.wait),
            mark: snapshot.mark,
        })
    }
}

/// Persistent form of a [`Frame`].
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FrameSnapshot {
    /// Frame id.
    pub id: FrameId,
    /// The owning dialog.
    pub dialog: DialogSnapshot,
    /// The pending wait.
    pub wait: WaitSnapshot,
    /// The frame's mark.
    #[serde(default)]
    pub mark: Option<Mark>,
}

/// Persistent form of a whole fiber. Frames are stored bottom first.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FiberSnapshot {
    /// Format version.
    pub version: u32,
    /// Next id to allocate for frames and wait serials.
    pub next_id: u64,
    /// Frames, bottom of stack first.
    pub frames: Vec<FrameSnapshot>,
}
