//! DialogRegistry: name tables for everything a persisted stack refers to.
//!
//! Persisted stacks hold names, never code. A dialog is stored as its
//! kind plus its fields, and combinators refer to selectors, predicates,
//! recoveries, and scorables by name. The registry is built once at
//! startup and resolves those names when a stack is restored or a step
//! runs.

use crate::{
    activity::Item,
    dialog::{Dialog, DialogSnapshot},
    error::DialogError,
    scorable::ActivityScorable,
};
use serde::de::DeserializeOwned;
use std::collections::HashMap;
use std::fmt;
use std::sync::Arc;

type DialogFactory =
    Box<dyn Fn(serde_json::Value) -> Result<Box<dyn Dialog>, serde_json::Error> + Send + Sync>;

/// Maps an item to another item.
pub type Selector = Arc<dyn Fn(Item) -> Result<Item, DialogError> + Send + Sync>;

/// Tests an item.
pub type Predicate = Arc<dyn Fn(&Item) -> bool + Send + Sync>;

/// Turns a fault into a replacement value, or declines with `None`.
pub type Recovery = Arc<dyn Fn(&DialogError) -> Option<Item> + Send + Sync>;

/// Name tables for dialog kinds, functions, and scorables.
#[derive(Default)]
pub struct DialogRegistry {
    dialogs: HashMap<String, DialogFactory>,
    selectors: HashMap<String, Selector>,
    predicates: HashMap<String, Predicate>,
    recoveries: HashMap<String, Recovery>,
    scorables: HashMap<String, Arc<ActivityScorable>>,
}

impl DialogRegistry {
    /// Create an empty registry.
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a dialog type under `kind`. `kind` must match what the
    /// type returns from [`Dialog::kind`]. Re-registering replaces.
    pub fn register<D>(&mut self, kind: impl Into<String>)
    where
        D: Dialog + DeserializeOwned + 'static,
    {
        self.dialogs.insert(
            kind.into(),
            Box::new(
                |state: serde_json::Value| -> Result<Box<dyn Dialog>, serde_json::Error> {
                    let dialog: D = serde_json::from_value(state)?;
                    Ok(Box::new(dialog))
                },
            ),
        );
    }

    /// Register a named selector.
    pub fn register_selector<F>(&mut self, name: impl Into<String>, f: F)
    where
        F: Fn(Item) -> Result<Item, DialogError> + Send + Sync + 'static,
    {
        self.selectors.insert(name.into(), Arc::new(f));
    }

    /// Register a named predicate.
    pub fn register_predicate<F>(&mut self, name: impl Into<String>, f: F)
    where
        F: Fn(&Item) -> bool + Send + Sync + 'static,
    {
        self.predicates.insert(name.into(), Arc::new(f));
    }

    /// Register a named recovery.
    pub fn register_recovery<F>(&mut self, name: impl Into<String>, f: F)
    where
        F: Fn(&DialogError) -> Option<Item> + Send + Sync + 'static,
    {
        self.recoveries.insert(name.into(), Arc::new(f));
    }

    /// Register a named scorable, offered by dialogs through their
    /// capabilities.
    pub fn register_scorable(&mut self, name: impl Into<String>, scorable: Arc<ActivityScorable>) {
        self.scorables.insert(name.into(), scorable);
    }

    /// Whether a dialog kind is registered.
    pub fn contains(&self, kind: &str) -> bool {
        self.dialogs.contains_key(kind)
    }

    /// Rebuild a dialog from its snapshot.
    pub fn restore(&self, snapshot: &DialogSnapshot) -> Result<Box<dyn Dialog>, DialogError> {
        let factory = self
            .dialogs
            .get(&snapshot.kind)
            .ok_or_else(|| DialogError::UnknownDialog(snapshot.kind.clone()))?;
        Ok(factory(snapshot.state.clone())?)
    }

    /// Look up a selector.
    pub fn selector(&self, name: &str) -> Result<Selector, DialogError> {
        self.selectors
            .get(name)
            .cloned()
            .ok_or_else(|| DialogError::UnknownFunction(name.to_owned()))
    }

    /// Look up a predicate.
    pub fn predicate(&self, name: &str) -> Result<Predicate, DialogError> {
        self.predicates
            .get(name)
            .cloned()
            .ok_or_else(|| DialogError::UnknownFunction(name.to_owned()))
    }

    /// Look up a recovery.
    pub fn recovery(&self, name: &str) -> Result<Recovery, DialogError> {
        self.recoveries
            .get(name)
            .cloned()
            .ok_or_else(|| DialogError::UnknownFunction(name.to_owned()))
    }

    /// Look up a scorable. Unknown names yield `None`; the router skips them.
    pub fn scorable(&self, name: &str) -> Option<Arc<ActivityScorable>> {
        self.scorables.get(name).cloned()
    }
}

impl fmt::Debug for DialogRegistry {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let mut dialogs: Vec<_> = self.dialogs.keys().collect();
        dialogs.sort();
        let mut scorables: Vec<_> = self.scorables.keys().collect();
        scorables.sort();
        f.debug_struct("DialogRegistry")
            .field("dialogs", &dialogs)
            .field("selectors", &self.selectors.len())
            .field("predicates", &self.predicates.len())
            .field("recoveries", &self.recoveries.len())
            .field("scorables", &scorables)
            .finish()
    }
}
