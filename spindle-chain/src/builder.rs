//! Constructors for [`Chain`] combinators.
//!
//! Free functions take any `&dyn Dialog` as the antecedent; [`ChainExt`]
//! offers the same as methods on concrete dialogs. Capturing an
//! antecedent serializes it, so every constructor is fallible.

use crate::chain::{Chain, SwitchCase};
use layer0::{Dialog, DialogError, DialogSnapshot, Event, Item, WaitKind};

/// Complete immediately with `value`.
pub fn ret(value: impl Into<Item>) -> Chain {
    Chain::Return {
        value: value.into(),
    }
}

/// Map `antecedent`'s result with a registered selector.
pub fn select(antecedent: &dyn Dialog, selector: &str) -> Result<Chain, DialogError> {
    Ok(Chain::Select {
        antecedent: DialogSnapshot::of(antecedent)?,
        selector: selector.to_owned(),
    })
}

/// Keep `antecedent`'s result only if a registered predicate holds.
pub fn filter(antecedent: &dyn Dialog, predicate: &str) -> Result<Chain, DialogError> {
    Ok(Chain::Where {
        antecedent: DialogSnapshot::of(antecedent)?,
        predicate: predicate.to_owned(),
    })
}

/// Repeat `antecedent` forever.
pub fn looping(antecedent: &dyn Dialog) -> Result<Chain, DialogError> {
    Ok(Chain::Loop {
        antecedent: DialogSnapshot::of(antecedent)?,
    })
}

/// Run `antecedent` for its effects, then wait for an item of `kind`.
pub fn void(antecedent: &dyn Dialog, kind: WaitKind) -> Result<Chain, DialogError> {
    Ok(Chain::Void {
        antecedent: DialogSnapshot::of(antecedent)?,
        kind,
    })
}

/// Recover `antecedent`'s faults with a registered recovery.
pub fn catch(antecedent: &dyn Dialog, recovery: &str) -> Result<Chain, DialogError> {
    Ok(Chain::Catch {
        antecedent: DialogSnapshot::of(antecedent)?,
        recovery: recovery.to_owned(),
    })
}

/// Replace `antecedent`'s faults with null.
pub fn default_if_exception(antecedent: &dyn Dialog) -> Result<Chain, DialogError> {
    Ok(Chain::DefaultIfException {
        antecedent: DialogSnapshot::of(antecedent)?,
    })
}

/// Send `antecedent`'s result to the user.
pub fn post_to_user(antecedent: &dyn Dialog) -> Result<Chain, DialogError> {
    Ok(Chain::PostToUser {
        antecedent: DialogSnapshot::of(antecedent)?,
    })
}

/// Wait for one item of `kind`.
pub fn wait_to_bot(kind: WaitKind) -> Chain {
    Chain::WaitToBot { kind }
}

/// Post `event` and complete with it once it has been consumed.
pub fn post_event(event: Event) -> Chain {
    Chain::PostEvent { event }
}

/// Map `antecedent`'s result with the first matching case.
pub fn switch(antecedent: &dyn Dialog, cases: Vec<SwitchCase>) -> Result<Chain, DialogError> {
    Ok(Chain::Switch {
        antecedent: DialogSnapshot::of(antecedent)?,
        cases,
    })
}

/// Call the dialog `antecedent` completes with.
pub fn flatten(antecedent: &dyn Dialog) -> Result<Chain, DialogError> {
    Ok(Chain::Flatten {
        antecedent: DialogSnapshot::of(antecedent)?,
    })
}

/// Offer a registered scorable while `antecedent` runs.
pub fn with_scorable(antecedent: &dyn Dialog, scorable: &str) -> Result<Chain, DialogError> {
    Ok(Chain::WithScorable {
        antecedent: DialogSnapshot::of(antecedent)?,
        scorable: scorable.to_owned(),
    })
}

/// The constructors as methods, for fluent chains:
///
/// ```ignore
/// let root = ret(json!(21)).select("double")?.post_to_user()?.looping()?;
/// ```
pub trait ChainExt: Dialog + Sized {
    /// See [`select`].
    fn select(&self, selector: &str) -> Result<Chain, DialogError> {
        select(self, selector)
    }

    /// See [`filter`].
    fn filter(&self, predicate: &str) -> Result<Chain, DialogError> {
        filter(self, predicate)
    }

    /// See [`looping`].
    fn looping(&self) -> Result<Chain, DialogError> {
        looping(self)
    }

    /// See [`void`].
    fn void(&self, kind: WaitKind) -> Result<Chain, DialogError> {
        void(self, kind)
    }

    /// See [`catch`].
    fn catch(&self, recovery: &str) -> Result<Chain, DialogError> {
        catch(self, recovery)
    }

    /// See [`default_if_exception`].
    fn default_if_exception(&self) -> Result<Chain, DialogError> {
        default_if_exception(self)
    }

    /// See [`post_to_user`].
    fn post_to_user(&self) -> Result<Chain, DialogError> {
        post_to_user(self)
    }

    /// See [`switch`].
    fn switch(&self, cases: Vec<SwitchCase>) -> Result<Chain, DialogError> {
        switch(self, cases)
    }

    /// See [`flatten`].
    fn flatten(&self) -> Result<Chain, DialogError> {
        flatten(self)
    }

    /// See [`with_scorable`].
    fn with_scorable(&self, scorable: &str) -> Result<Chain, DialogError> {
        with_scorable(self, scorable)
    }
}

impl<D: Dialog> ChainExt for D {}
