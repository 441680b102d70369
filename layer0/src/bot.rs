//! The outbound interface: messages from dialogs to the user.

use crate::{activity::Message, error::DialogError};
use async_trait::async_trait;

/// Sink for outbound messages.
///
/// Called by dialogs during a poll as an ordinary side effect. Delivery
/// is not transactional with the stack: a message sent before a fault
/// stays sent.
#[async_trait]
pub trait BotToUser: Send + Sync {
    /// Deliver one message.
    async fn post(&self, message: Message) -> Result<(), DialogError>;
}

/// Discards every message.
#[derive(Debug, Clone, Copy, Default)]
pub struct NullBotToUser;

#[async_trait]
impl BotToUser for NullBotToUser {
    async fn post(&self, _message: Message) -> Result<(), DialogError> {
        Ok(())
    }
}
