//! Waits: the pending continuation of one frame.

use layer0::{DialogError, Item, Need, Resume, WaitKind};
use serde::{Deserialize, Serialize};

/// The last wait a frame armed for itself.
///
/// Replayed when the frame calls a child without naming a resume, so the
/// child's result satisfies what the frame was already waiting for.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Mark {
    /// Accepted item kind.
    pub kind: WaitKind,
    /// Where the frame continues.
    pub resume: Resume,
    /// Serial of the wait this mark was taken from.
    pub serial: u64,
}

/// A frame's pending continuation: what it accepts, where it resumes,
/// and, once satisfied, the outcome it resumes with.
#[derive(Debug)]
pub struct Wait {
    need: Need,
    kind: WaitKind,
    resume: Option<Resume>,
    serial: u64,
    outcome: Option<Result<Item, DialogError>>,
}

impl Wait {
    /// Nothing armed.
    pub fn none() -> Self {
        Self {
            need: Need::None,
            kind: WaitKind::Any,
            resume: None,
            serial: 0,
            outcome: None,
        }
    }

    /// Ready to run the dialog's start.
    pub fn start(serial: u64) -> Self {
        Self {
            need: Need::Poll,
            kind: WaitKind::Start,
            resume: Some(Resume::Start),
            serial,
            outcome: Some(Ok(Item::Start)),
        }
    }

    /// Armed for items of `kind`, continuing at `resume`.
    pub fn armed(kind: WaitKind, resume: Resume, serial: u64) -> Self {
        Self {
            need: Need::Wait,
            kind,
            resume: Some(resume),
            serial,
            outcome: None,
        }
    }

    /// Re-arm from a mark.
    pub fn from_mark(mark: &Mark) -> Self {
        Self::armed(mark.kind, mark.resume.clone(), mark.serial)
    }

    /// Current state.
    pub fn need(&self) -> Need {
        self.need
    }

    /// Accepted item kind.
    pub fn kind(&self) -> WaitKind {
        self.kind
    }

    /// Where the frame continues.
    pub fn resume(&self) -> Option<&Resume> {
        self.resume.as_ref()
    }

    /// Serial distinguishing this arming from earlier ones on the same frame.
    pub fn serial(&self) -> u64 {
        self.serial
    }

    /// The mark for this wait, if it is armed.
    pub fn mark(&self) -> Option<Mark> {
        match (&self.need, &self.resume) {
            (Need::Wait, Some(resume)) => Some(Mark {
                kind: self.kind,
                resume: resume.clone(),
                serial: self.serial,
            }),
            _ => None,
        }
    }

    fn expect(&self, need: Need) -> Result<(), DialogError> {
        if self.need == need {
            Ok(())
        } else {
            Err(DialogError::InvalidNeed {
                expected: need,
                actual: self.need,
            })
        }
    }

    /// Deliver an item. A kind mismatch is delivered as an
    /// [`DialogError::InvalidType`] fault instead of the item.
    pub fn post(&mut self, item: Item) -> Result<(), DialogError> {
        self.expect(Need::Wait)?;
        let outcome = if self.kind.accepts(&item) {
            Ok(item)
        } else {
            Err(DialogError::InvalidType {
                expected: self.kind,
                actual: item.kind(),
            })
        };
        self.outcome = Some(outcome);
        self.need = Need::Poll;
        Ok(())
    }

    /// Deliver a fault.
    pub fn fail(&mut self, error: DialogError) -> Result<(), DialogError> {
        self.expect(Need::Wait)?;
        self.outcome = Some(Err(error));
        self.need = Need::Poll;
        Ok(())
    }

    /// Take the continuation and outcome to run the step.
    pub(crate) fn begin(&mut self) -> Result<(Resume, Result<Item, DialogError>), DialogError> {
        self.expect(Need::Poll)?;
        self.need = Need::Call;
        let resume = self.resume.clone().unwrap_or(Resume::Start);
        let outcome = match (self.outcome.take(), &resume) {
            (Some(outcome), _) => outcome,
            (None, Resume::Start) => Ok(Item::Start),
            (None, Resume::Stage(stage)) => Err(DialogError::Serialization(format!(
                "outcome for stage {stage:?} was not persisted"
            ))),
        };
        Ok((resume, outcome))
    }

    /// Mark the step as having run.
    pub(crate) fn finish(&mut self) {
        self.need = Need::Done;
    }

    /// Capture the persistent part of the wait. A pending outcome is not
    /// captured; stacks are saved only while every frame is waiting.
    pub fn snapshot(&self) -> WaitSnapshot {
        WaitSnapshot {
            need: self.need,
            kind: self.kind,
            resume: self.resume.clone(),
            serial: self.serial,
        }
    }

    /// Rebuild a wait from its snapshot.
    pub fn restore(snapshot: WaitSnapshot) -> Self {
        Self {
            need: snapshot.need,
            kind: snapshot.kind,
            resume: snapshot.resume,
            serial: snapshot.serial,
            outcome: None,
        }
    }
}

impl Default for Wait {
    fn default() -> Self {
        Self::none()
    }
}

/// Persistent form of a [`Wait`].
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct WaitSnapshot {
    /// State.
    pub need: Need,
    /// Accepted item kind.
    pub kind: WaitKind,
    /// Where the frame continues.
    #[serde(default)]
    pub resume: Option<Resume>,
    /// Arming serial.
    pub serial: u64,
}
