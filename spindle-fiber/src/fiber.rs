//! The fiber: a stack of frames and the loop that runs them.

use crate::frame::{FiberSnapshot, Frame, SNAPSHOT_VERSION};
use crate::wait::{Mark, Wait};
use layer0::{
    BotToUser, Command, Dialog, DialogContext, DialogError, DialogRegistry, Event, FrameId,
    FrameInfo, Item, Need, Resume, WaitKind,
};
use tokio_util::sync::CancellationToken;

/// Default bound on steps run by one poll.
pub const DEFAULT_MAX_STEPS: usize = 1024;

/// What a poll needs from its surroundings.
pub struct PollContext<'a> {
    /// Restores dialogs and resolves named functions.
    pub registry: &'a DialogRegistry,
    /// Outbound sink handed to every step.
    pub bot: &'a dyn BotToUser,
    /// Checked before every step and handed to every step.
    pub token: &'a CancellationToken,
    /// Steps allowed in one poll before it fails with
    /// [`DialogError::StepLimit`].
    pub max_steps: usize,
}

impl<'a> PollContext<'a> {
    /// Create a context with the default step bound.
    pub fn new(
        registry: &'a DialogRegistry,
        bot: &'a dyn BotToUser,
        token: &'a CancellationToken,
    ) -> Self {
        Self {
            registry,
            bot,
            token,
            max_steps: DEFAULT_MAX_STEPS,
        }
    }

    /// Override the step bound.
    pub fn with_max_steps(mut self, max_steps: usize) -> Self {
        self.max_steps = max_steps;
        self
    }
}

/// An event a step posted, waiting to be queued by the task.
///
/// When the queue hands the event out, the task satisfies the wait
/// identified by `frame` and `serial` with it.
#[derive(Debug, Clone, PartialEq)]
pub struct PostedEvent {
    /// The frame that posted.
    pub frame: FrameId,
    /// Serial of the wait the event satisfies.
    pub serial: u64,
    /// The event.
    pub event: Event,
}

/// A stack of frames, most recent on top.
///
/// Single-threaded and cooperative: every operation takes `&mut self`
/// and a poll runs one step at a time.
#[derive(Debug, Default)]
pub struct Fiber {
    frames: Vec<Frame>,
    next_id: u64,
    posted: Vec<PostedEvent>,
}

impl Fiber {
    /// An empty fiber.
    pub fn new() -> Self {
        Self::default()
    }

    fn allocate(&mut self) -> u64 {
        let id = self.next_id;
        self.next_id += 1;
        id
    }

    fn top_mut(&mut self) -> Result<&mut Frame, DialogError> {
        self.frames.last_mut().ok_or(DialogError::InvalidNeed {
            expected: Need::Wait,
            actual: Need::None,
        })
    }

    fn top_kind(&self) -> String {
        self.frames
            .last()
            .map(|f| f.dialog.kind().to_owned())
            .unwrap_or_default()
    }

    /// Frames, bottom of stack first.
    pub fn frames(&self) -> &[Frame] {
        &self.frames
    }

    /// Views of every frame, top of stack first.
    pub fn frame_infos(&self) -> Vec<FrameInfo> {
        self.frames.iter().rev().map(Frame::info).collect()
    }

    /// Number of frames.
    pub fn len(&self) -> usize {
        self.frames.len()
    }

    /// Whether the stack is empty.
    pub fn is_empty(&self) -> bool {
        self.frames.is_empty()
    }

    /// State of the top frame's wait, or [`Need::None`] when empty.
    pub fn need(&self) -> Need {
        self.frames
            .last()
            .map(|f| f.wait.need())
            .unwrap_or(Need::None)
    }

    /// Push a frame that starts `dialog`.
    ///
    /// With `resume`, the current top waits for the child's result at
    /// that stage. Without, the current top's wait is left as it is.
    pub fn call(&mut self, dialog: Box<dyn Dialog>, resume: Option<Resume>) {
        if let Some(resume) = resume {
            let serial = self.allocate();
            if let Some(top) = self.frames.last_mut() {
                top.wait = Wait::armed(WaitKind::Any, resume, serial);
            }
        }
        let id = FrameId(self.allocate());
        let serial = self.allocate();
        tracing::debug!(
            frame = %id,
            dialog = dialog.kind(),
            depth = self.frames.len() + 1,
            "spindle.fiber.call"
        );
        self.frames.push(Frame::new(id, dialog, Wait::start(serial)));
    }

    /// Arm the top frame's wait and record it as the frame's mark.
    pub fn wait(&mut self, kind: WaitKind, resume: Resume) -> Result<(), DialogError> {
        let serial = self.allocate();
        let top = self.top_mut()?;
        if top.wait.need() == Need::Poll {
            return Err(DialogError::InvalidNeed {
                expected: Need::Wait,
                actual: Need::Poll,
            });
        }
        top.wait = Wait::armed(kind, resume.clone(), serial);
        top.mark = Some(Mark {
            kind,
            resume,
            serial,
        });
        Ok(())
    }

    /// Re-arm the top frame from its mark, if it has one.
    fn rearm(&mut self) {
        if let Some(top) = self.frames.last_mut() {
            if let Some(mark) = &top.mark {
                top.wait = Wait::from_mark(mark);
            }
        }
    }

    /// Pop the top frame and deliver `item` to the frame below.
    ///
    /// Completing the last frame leaves the stack empty.
    pub fn done(&mut self, item: Item) -> Result<(), DialogError> {
        let frame = self.frames.pop().ok_or(DialogError::InvalidNeed {
            expected: Need::Call,
            actual: Need::None,
        })?;
        tracing::debug!(frame = %frame.id, dialog = frame.dialog.kind(), "spindle.fiber.done");
        match self.frames.last_mut() {
            None => Ok(()),
            Some(parent) if parent.wait.need() == Need::Wait => parent.wait.post(item),
            Some(parent) => Err(DialogError::NoResumeHandler {
                dialog: parent.dialog.kind().to_owned(),
            }),
        }
    }

    /// Pop the top frame and deliver `error` to the frame below.
    ///
    /// If nothing below is waiting, the error is returned and escapes
    /// the poll.
    pub fn fail(&mut self, error: DialogError) -> Result<(), DialogError> {
        let Some(frame) = self.frames.pop() else {
            return Err(error);
        };
        tracing::debug!(
            frame = %frame.id,
            dialog = frame.dialog.kind(),
            error = %error,
            "spindle.fiber.fail"
        );
        match self.frames.last_mut() {
            Some(parent) if parent.wait.need() == Need::Wait => parent.wait.fail(error),
            _ => Err(error),
        }
    }

    /// Deliver an inbound item into the top frame's wait.
    pub fn post(&mut self, item: Item) -> Result<(), DialogError> {
        self.top_mut()?.wait.post(item)
    }

    /// Deliver `item` into a specific saved wait.
    ///
    /// Only succeeds if that frame is on top and still waiting with the
    /// same serial; otherwise the stack has moved on and the item is
    /// dropped. Returns whether it was delivered.
    pub fn satisfy(&mut self, frame: FrameId, serial: u64, item: Item) -> bool {
        match self.frames.last_mut() {
            Some(top)
                if top.id == frame
                    && top.wait.need() == Need::Wait
                    && top.wait.serial() == serial =>
            {
                top.wait.post(item).is_ok()
            }
            _ => {
                tracing::debug!(frame = %frame, serial, "spindle.fiber.satisfy.stale");
                false
            }
        }
    }

    /// Drop every frame.
    pub fn reset(&mut self) {
        self.frames.clear();
        self.posted.clear();
    }

    /// Take the events posted since the last call.
    pub fn take_posted(&mut self) -> Vec<PostedEvent> {
        std::mem::take(&mut self.posted)
    }

    /// Run ready frames until the stack suspends.
    ///
    /// Returns [`Need::Wait`] when the top frame is waiting and
    /// [`Need::None`] when the stack emptied. A step that recorded no
    /// command yields [`DialogError::NoResumeHandler`]; a fault no frame
    /// was waiting to receive escapes as `Err`.
    pub async fn poll(&mut self, cx: &PollContext<'_>) -> Result<Need, DialogError> {
        let mut steps = 0usize;
        loop {
            let Some(frame) = self.frames.last_mut() else {
                return Ok(Need::None);
            };
            match frame.wait.need() {
                Need::Poll => {}
                Need::Wait => return Ok(Need::Wait),
                _ => {
                    return Err(DialogError::NoResumeHandler {
                        dialog: frame.dialog.kind().to_owned(),
                    });
                }
            }
            if cx.token.is_cancelled() {
                return Err(DialogError::Canceled);
            }
            steps += 1;
            if steps > cx.max_steps {
                return Err(DialogError::StepLimit(cx.max_steps));
            }

            let (resume, outcome) = frame.wait.begin()?;
            tracing::debug!(
                frame = %frame.id,
                dialog = frame.dialog.kind(),
                stage = %resume,
                "spindle.fiber.step"
            );
            let mut ctx = DialogContext::new(cx.registry, cx.bot, cx.token);
            let result = match &resume {
                Resume::Start => frame.dialog.start(&mut ctx).await,
                Resume::Stage(stage) => frame.dialog.resume(&mut ctx, stage, outcome).await,
            };
            frame.wait.finish();

            match result {
                Ok(()) => self.apply(ctx.into_commands())?,
                Err(error) => self.fail(error)?,
            }
        }
    }

    /// Apply the command a step recorded.
    fn apply(&mut self, mut commands: Vec<Command>) -> Result<(), DialogError> {
        if commands.len() > 1 {
            return Err(DialogError::MultipleResumeHandlers {
                dialog: self.top_kind(),
                count: commands.len(),
            });
        }
        let Some(command) = commands.pop() else {
            return Ok(());
        };
        match command {
            Command::Wait { kind, resume } => self.wait(kind, resume),
            Command::Post { event, resume } => {
                self.wait(WaitKind::Event, resume)?;
                let top = self.top_mut()?;
                let posted = PostedEvent {
                    frame: top.id,
                    serial: top.wait.serial(),
                    event,
                };
                self.posted.push(posted);
                Ok(())
            }
            Command::Call { dialog, resume } => {
                if resume.is_none() {
                    self.rearm();
                }
                self.call(dialog, resume);
                Ok(())
            }
            Command::Done(item) => self.done(item),
            Command::Fail(error) => self.fail(error),
        }
    }

    /// Capture the whole stack.
    pub fn snapshot(&self) -> Result<FiberSnapshot, DialogError> {
        Ok(FiberSnapshot {
            version: SNAPSHOT_VERSION,
            next_id: self.next_id,
            frames: self
                .frames
                .iter()
                .map(Frame::snapshot)
                .collect::<Result<_, _>>()?,
        })
    }

    /// Rebuild a stack, restoring every dialog through the registry.
    pub fn restore(
        snapshot: FiberSnapshot,
        registry: &DialogRegistry,
    ) -> Result<Self, DialogError> {
        if snapshot.version != SNAPSHOT_VERSION {
            return Err(DialogError::Serialization(format!(
                "unsupported fiber snapshot version {}",
                snapshot.version
            )));
        }
        let frames = snapshot
            .frames
            .into_iter()
            .map(|f| Frame::restore(f, registry))
            .collect::<Result<_, _>>()?;
        Ok(Self {
            frames,
            next_id: snapshot.next_id,
            posted: Vec::new(),
        })
    }
}
