//! The State protocol: where suspended dialog stacks live between events.

use crate::{error::StateError, id::ConversationId};
use async_trait::async_trait;
use serde::{Deserialize, Serialize};

/// The namespace a stored value belongs to.
#[non_exhaustive]
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Scope {
    /// Per-conversation data, including the persisted fiber.
    Conversation(ConversationId),
    /// Shared across every conversation.
    Global,
    /// Custom scope for future extensions.
    Custom(String),
}

/// Durable key/value storage for JSON values.
///
/// Implementations:
/// - MemoryStore: HashMap (testing, ephemeral)
/// - FsStore: one file per key, written atomically
///
/// The engine stores exactly one value per conversation (the serialized
/// fiber) and relies on single-key writes and deletes being atomic.
/// Transactions across keys are not part of this trait.
#[async_trait]
pub trait StateStore: Send + Sync {
    /// Read a value by key within a scope.
    /// Returns None if the key doesn't exist.
    async fn read(
        &self,
        scope: &Scope,
        key: &str,
    ) -> Result<Option<serde_json::Value>, StateError>;

    /// Write a value. Creates or overwrites.
    async fn write(
        &self,
        scope: &Scope,
        key: &str,
        value: serde_json::Value,
    ) -> Result<(), StateError>;

    /// Delete a value. No-op if key doesn't exist.
    async fn delete(&self, scope: &Scope, key: &str) -> Result<(), StateError>;

    /// List keys under a prefix within a scope.
    async fn list(&self, scope: &Scope, prefix: &str) -> Result<Vec<String>, StateError>;
}
