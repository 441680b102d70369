#![deny(missing_docs)]
//! # spindle-task: running conversations
//!
//! Wires the fiber, its store, the scorable router, and the inbound
//! queue into something that processes activities:
//!
//! ```text
//! Conversations::post(id, activity)
//!   └─ ScoringEventLoop        route first, deliver if unrouted
//!        └─ ReactiveDialogTask seed a looping root on empty stacks
//!             └─ DialogTask    load, poll, save, flush; wipe on fault
//!                  └─ Fiber + StateFiberStore
//! ```
//!
//! [`DialogTask`] is also the [`layer0::DialogStack`] scorables act on.

pub mod config;
pub mod event_loop;
pub mod host;
pub mod queue;
pub mod reactive;
pub mod task;

pub use config::{EngineConfig, TaskConfig};
pub use event_loop::ScoringEventLoop;
pub use host::{BotFactory, Conversations};
pub use queue::{EventQueue, OnPull, Pulled};
pub use reactive::{ReactiveDialogTask, RootFactory};
pub use task::{DialogTask, QueuedStack};

use layer0::DialogRegistry;

/// A registry with the chain combinators registered.
pub fn default_registry() -> DialogRegistry {
    let mut registry = DialogRegistry::new();
    spindle_chain::register(&mut registry);
    registry
}
