//! Error types for each protocol.

use crate::{activity::WaitKind, stack::Need};
use thiserror::Error;

/// Dialog execution errors.
///
/// These travel two ways. Delivered into a resume, they are ordinary
/// faults a parent can inspect and recover from. Escaping a poll, they
/// abort the cycle and wipe the conversation's stack.
#[non_exhaustive]
#[derive(Debug, Error)]
pub enum DialogError {
    /// A poll ended with no wait armed on top of the stack, so the next
    /// inbound item would have nowhere to go.
    #[error("no resume handler: {dialog} finished a step without waiting, calling, or completing")]
    NoResumeHandler {
        /// Kind of the dialog on top of the stack (empty if the stack is empty).
        dialog: String,
    },

    /// A single step issued more than one stack command.
    #[error("multiple resume handlers: {dialog} issued {count} stack commands in one step")]
    MultipleResumeHandlers {
        /// Kind of the offending dialog.
        dialog: String,
        /// How many commands it issued.
        count: usize,
    },

    /// A stack operation was attempted in the wrong frame state.
    #[error("invalid need: expected {expected}, found {actual}")]
    InvalidNeed {
        /// The state the operation requires.
        expected: Need,
        /// The state the frame was in.
        actual: Need,
    },

    /// An item of the wrong kind was delivered into a wait.
    #[error("invalid type: wait expects {expected}, got {actual}")]
    InvalidType {
        /// What the wait accepts.
        expected: WaitKind,
        /// What was delivered.
        actual: WaitKind,
    },

    /// A dialog was resumed at a stage it does not define.
    #[error("unknown stage {stage:?} for dialog {dialog}")]
    UnknownStage {
        /// Dialog kind.
        dialog: String,
        /// The unknown stage label.
        stage: String,
    },

    /// No dialog is registered under this kind.
    #[error("unknown dialog kind: {0}")]
    UnknownDialog(String),

    /// No selector, predicate, or recovery is registered under this name.
    #[error("unknown function: {0}")]
    UnknownFunction(String),

    /// A fault raised by dialog code.
    #[error("{0}")]
    Application(String),

    /// A filter rejected its antecedent's value.
    #[error("where clause rejected the value")]
    WhereCanceled,

    /// The cancellation token fired.
    #[error("canceled")]
    Canceled,

    /// One poll ran more steps than allowed.
    #[error("step limit of {0} exceeded in one poll")]
    StepLimit(usize),

    /// Dialog state could not be serialized or restored.
    #[error("serialization error: {0}")]
    Serialization(String),

    /// The durable store failed.
    #[error("state error: {0}")]
    State(#[from] StateError),

    /// Catch-all.
    #[error("{0}")]
    Other(#[from] Box<dyn std::error::Error + Send + Sync>),
}

impl DialogError {
    /// Shorthand for [`DialogError::Application`].
    pub fn application(message: impl Into<String>) -> Self {
        DialogError::Application(message.into())
    }

    /// Whether this error reports a broken stack protocol rather than a
    /// fault raised by dialog code. Protocol violations are never
    /// delivered into resumes.
    pub fn is_protocol_violation(&self) -> bool {
        matches!(
            self,
            DialogError::NoResumeHandler { .. }
                | DialogError::MultipleResumeHandlers { .. }
                | DialogError::InvalidNeed { .. }
        )
    }
}

impl From<serde_json::Error> for DialogError {
    fn from(e: serde_json::Error) -> Self {
        DialogError::Serialization(e.to_string())
    }
}

/// State errors.
#[non_exhaustive]
#[derive(Debug, Error)]
pub enum StateError {
    /// Key not found in the given scope.
    #[error("not found: {scope}/{key}")]
    NotFound {
        /// The scope that was searched.
        scope: String,
        /// The key that was not found.
        key: String,
    },

    /// A write operation failed.
    #[error("write failed: {0}")]
    WriteFailed(String),

    /// Serialization or deserialization error.
    #[error("serialization error: {0}")]
    Serialization(String),

    /// Catch-all.
    #[error("{0}")]
    Other(#[from] Box<dyn std::error::Error + Send + Sync>),
}

/// Scorable errors. These are logged by the router and treated as
/// "no match"; they never reach the dialog stack.
#[non_exhaustive]
#[derive(Debug, Error)]
pub enum ScorableError {
    /// The scorable failed.
    #[error("scorable failed: {0}")]
    Failed(String),

    /// A stack operation performed by the scorable failed.
    #[error("dialog error: {0}")]
    Dialog(#[from] DialogError),

    /// Catch-all.
    #[error("{0}")]
    Other(#[from] Box<dyn std::error::Error + Send + Sync>),
}
