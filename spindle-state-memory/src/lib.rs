#![deny(missing_docs)]
//! In-memory implementation of layer0's StateStore trait.
//!
//! Values live in one ordered map per [`Scope`], so listing a prefix is a
//! range scan and comes back sorted. Nothing survives the process; use
//! `spindle-state-fs` when conversations must outlive a restart.

use async_trait::async_trait;
use layer0::{Scope, StateError, StateStore};
use std::collections::{BTreeMap, HashMap};
use tokio::sync::RwLock;

type Bucket = BTreeMap<String, serde_json::Value>;

/// In-memory state store.
///
/// Each write replaces the whole value under its key in one step, which
/// is all the fiber store needs for per-conversation atomicity.
#[derive(Debug, Default)]
pub struct MemoryStore {
    scopes: RwLock<HashMap<Scope, Bucket>>,
}

impl MemoryStore {
    /// Create an empty store.
    pub fn new() -> Self {
        Self::default()
    }

    /// Total number of keys across every scope.
    pub async fn len(&self) -> usize {
        self.scopes.read().await.values().map(BTreeMap::len).sum()
    }

    /// Whether no scope holds any key.
    pub async fn is_empty(&self) -> bool {
        self.len().await == 0
    }

    /// Scopes that currently hold at least one key.
    pub async fn scopes(&self) -> Vec<Scope> {
        self.scopes.read().await.keys().cloned().collect()
    }

    /// Drop every key in `scope`. Returns how many were removed.
    pub async fn clear_scope(&self, scope: &Scope) -> usize {
        let removed = self
            .scopes
            .write()
            .await
            .remove(scope)
            .map(|bucket| bucket.len())
            .unwrap_or(0);
        tracing::debug!(?scope, removed, "spindle.state.memory.clear_scope");
        removed
    }
}

#[async_trait]
impl StateStore for MemoryStore {
    async fn read(
        &self,
        scope: &Scope,
        key: &str,
    ) -> Result<Option<serde_json::Value>, StateError> {
        let scopes = self.scopes.read().await;
        Ok(scopes.get(scope).and_then(|bucket| bucket.get(key)).cloned())
    }

    async fn write(
        &self,
        scope: &Scope,
        key: &str,
        value: serde_json::Value,
    ) -> Result<(), StateError> {
        let mut scopes = self.scopes.write().await;
        scopes
            .entry(scope.clone())
            .or_default()
            .insert(key.to_owned(), value);
        Ok(())
    }

    async fn delete(&self, scope: &Scope, key: &str) -> Result<(), StateError> {
        let mut scopes = self.scopes.write().await;
        if let Some(bucket) = scopes.get_mut(scope) {
            bucket.remove(key);
            if bucket.is_empty() {
                scopes.remove(scope);
            }
        }
        Ok(())
    }

    async fn list(&self, scope: &Scope, prefix: &str) -> Result<Vec<String>, StateError> {
        let scopes = self.scopes.read().await;
        let Some(bucket) = scopes.get(scope) else {
            return Ok(Vec::new());
        };
        Ok(bucket
            .range(prefix.to_owned()..)
            .take_while(|(key, _)| key.starts_with(prefix))
            .map(|(key, _)| key.clone())
            .collect())
    }
}
