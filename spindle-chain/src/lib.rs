//! # spindle-chain: dialog combinators
//!
//! Small dialogs that compose other dialogs: map, filter, loop, catch,
//! post to the user, wait for input, and so on. Every combinator is a
//! variant of the serializable [`Chain`] enum and is built only from the
//! stack primitives (call, wait, done, fail, post), which makes the set
//! double as a conformance harness for the engine.
//!
//! Register the chain kind before restoring stacks that contain chains:
//!
//! ```ignore
//! let mut registry = DialogRegistry::new();
//! spindle_chain::register(&mut registry);
//! ```

#![deny(missing_docs)]

pub mod builder;
pub mod chain;

pub use builder::{
    ChainExt, catch, default_if_exception, filter, flatten, looping, post_event, post_to_user,
    ret, select, switch, void, wait_to_bot, with_scorable,
};
pub use chain::{ANTECEDENT, Chain, INNER, ITEM, SwitchCase};

use layer0::DialogRegistry;

/// Register [`Chain`] under [`Chain::KIND`].
pub fn register(registry: &mut DialogRegistry) {
    registry.register::<Chain>(Chain::KIND);
}
