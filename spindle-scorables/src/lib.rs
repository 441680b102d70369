#![deny(missing_docs)]
//! Scorable composition and routing for spindle.
//!
//! Before an inbound activity reaches the dialog stack it is offered to
//! the [`DialogRouter`]. The router gathers candidates from the active
//! frames (top of stack first) and from its fixed global set, folds them
//! into one [`FoldScorable`], and lets the winner act on the stack. An
//! activity nobody scores passes through untouched.
//!
//! | Type | Role |
//! |------|------|
//! | [`try_post`] | Run one scorable's lifecycle against one item |
//! | [`FoldScorable`] | Pick the best of many candidates |
//! | [`DialogRouter`] | Rebuild candidates per activity and route |
//! | [`CommandScorable`] | Regex over message text |
//! | [`EventScorable`] | Event name match |
//! | [`RegexCache`] | Component-owned compiled pattern cache |

pub mod action;
pub mod command;
pub mod event;
pub mod fold;
pub mod lifecycle;
pub mod regex_cache;
pub mod router;

pub use action::Action;
pub use command::CommandScorable;
pub use event::EventScorable;
pub use fold::{Comparator, FoldScorable};
pub use lifecycle::try_post;
pub use regex_cache::RegexCache;
pub use router::{DialogRouter, RouterConfig};
