//! In-memory implementations and sample dialogs for testing.
//!
//! Available behind the `test-utils` feature flag. These are minimal
//! implementations that prove the trait APIs are usable.

mod dialogs;
mod recording_bot;
mod scripted_stack;

pub use dialogs::{AskDialog, EchoDialog, register_samples};
pub use recording_bot::RecordingBotToUser;
pub use scripted_stack::{ScriptedStack, StackOp};
