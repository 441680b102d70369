//! # spindle-fiber: the continuation stack
//!
//! A [`Fiber`] is the complete, serializable state of one conversation's
//! dialog thread: a stack of [`Frame`]s, each holding a dialog and the
//! [`Wait`] it is suspended on. [`Fiber::poll`] runs ready frames one
//! step at a time until the top frame waits for input, the stack
//! empties, or a fault escapes.
//!
//! The stack discipline:
//!
//! - `call` only pushes above the top
//! - `done` and `fail` only pop the top
//! - between polls the top frame is waiting
//!
//! [`FiberStore`] persists a fiber between inbound events.
//! [`StateFiberStore`] implements it over any [`layer0::StateStore`].

#![deny(missing_docs)]

pub mod fiber;
pub mod frame;
pub mod store;
pub mod wait;

pub use fiber::{DEFAULT_MAX_STEPS, Fiber, PollContext, PostedEvent};
pub use frame::{FiberSnapshot, Frame, FrameSnapshot, SNAPSHOT_VERSION};
pub use store::{DEFAULT_FIBER_KEY, FiberStore, StateFiberStore};
pub use wait::{Mark, Wait, WaitSnapshot};
