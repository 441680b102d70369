//! # layer0: Protocol traits for resumable dialog engines
//!
//! This crate defines the protocol boundaries of a stack-based dialog
//! engine: conversational logic written as sequential steps that suspend
//! at every "wait for the next input" point, persist their entire pending
//! state, and resume on the next inbound event.
//!
//! ## The Protocols
//!
//! | Protocol | Trait | What it does |
//! |----------|-------|-------------|
//! | ① Dialog | [`Dialog`] | One resumable unit of conversational logic |
//! | ② Stack | [`DialogStack`] | Operations on a conversation's frames |
//! | ③ State | [`StateStore`] | Where suspended stacks persist between events |
//! | ④ Outbound | [`BotToUser`] | Messages from dialogs to the user |
//!
//! ## The Interfaces
//!
//! | Interface | Types | What it does |
//! |-----------|-------|-------------|
//! | ⑤ Scorables | [`Scorable`], [`ScorableState`] | Intercept items before the stack sees them |
//! | ⑥ Registry | [`DialogRegistry`] | Names for everything a persisted stack refers to |
//!
//! ## Design Principle
//!
//! Continuations are data. A suspended frame is a dialog's serialized
//! fields plus a [`Resume`] stage label, and every function a combinator
//! needs is referenced by a registry name. That is what lets a stack of
//! arbitrarily nested pending continuations survive a process restart.
//!
//! ## Dependency Notes
//!
//! Dialog state and item payloads use `serde_json::Value`. JSON is the
//! persistence format of every store, and a concrete value type keeps
//! the traits object safe.

#![deny(missing_docs)]

pub mod activity;
pub mod bot;
pub mod dialog;
pub mod error;
pub mod id;
pub mod registry;
pub mod scorable;
pub mod stack;
pub mod state;

#[cfg(feature = "test-utils")]
pub mod test_utils;

// Re-exports for convenience
pub use activity::{Activity, Event, Item, Message, WaitKind};
pub use bot::{BotToUser, NullBotToUser};
pub use dialog::{
    Capabilities, Command, Dialog, DialogContext, DialogSnapshot, DialogState, Resume,
};
pub use error::{DialogError, ScorableError, StateError};
pub use id::{ConversationId, FrameId, UserId};
pub use registry::{DialogRegistry, Predicate, Recovery, Selector};
pub use scorable::{ActivityScorable, Scorable, ScorableState, state_ref};
pub use stack::{DialogStack, FrameInfo, Need};
pub use state::{Scope, StateStore};
