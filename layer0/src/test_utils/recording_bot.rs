//! RecordingBotToUser: keeps every outbound message for inspection.

use crate::activity::Message;
use crate::bot::BotToUser;
use crate::error::DialogError;
use async_trait::async_trait;
use std::sync::Mutex;

/// An outbound sink that records every message it is given.
/// Use `.texts()` to inspect what was sent.
#[derive(Default)]
pub struct RecordingBotToUser {
    messages: Mutex<Vec<Message>>,
}

impl RecordingBotToUser {
    /// Create an empty recorder.
    pub fn new() -> Self {
        Self::default()
    }

    /// Return a snapshot of all recorded messages.
    pub fn messages(&self) -> Vec<Message> {
        self.messages.lock().unwrap().clone()
    }

    /// Return the text of all recorded messages.
    pub fn texts(&self) -> Vec<String> {
        self.messages
            .lock()
            .unwrap()
            .iter()
            .map(|m| m.text.clone())
            .collect()
    }

    /// Forget everything recorded so far.
    pub fn clear(&self) {
        self.messages.lock().unwrap().clear();
    }
}

#[async_trait]
impl BotToUser for RecordingBotToUser {
    async fn post(&self, message: Message) -> Result<(), DialogError> {
        self.messages.lock().unwrap().push(message);
        Ok(())
    }
}
