//! Inbound activities and the items that flow through waits.

use crate::id::UserId;
use serde::{Deserialize, Serialize};
use std::fmt;

/// A text message from or to the user.
#[non_exhaustive]
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Message {
    /// Message text.
    pub text: String,
    /// Who sent it. `None` for outbound messages.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub from: Option<UserId>,
}

impl Message {
    /// Create a message with the given text.
    pub fn new(text: impl Into<String>) -> Self {
        Self {
            text: text.into(),
            from: None,
        }
    }

    /// Attach the sender.
    pub fn from_user(mut self, user: impl Into<UserId>) -> Self {
        self.from = Some(user.into());
        self
    }
}

impl From<&str> for Message {
    fn from(text: &str) -> Self {
        Message::new(text)
    }
}

impl From<String> for Message {
    fn from(text: String) -> Self {
        Message::new(text)
    }
}

/// A named, out-of-band event (end of conversation, proactive triggers,
/// events a dialog posts to itself).
#[non_exhaustive]
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Event {
    /// Event name, matched by event scorables.
    pub name: String,
    /// Event payload.
    #[serde(default)]
    pub value: serde_json::Value,
}

impl Event {
    /// Create an event with a null payload.
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            value: serde_json::Value::Null,
        }
    }

    /// Attach a payload.
    pub fn with_value(mut self, value: serde_json::Value) -> Self {
        self.value = value;
        self
    }
}

/// An inbound activity, as delivered by a channel.
#[non_exhaustive]
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum Activity {
    /// A user message.
    Message(Message),
    /// An event.
    Event(Event),
}

impl Activity {
    /// Shorthand for a text message activity.
    pub fn message(text: impl Into<String>) -> Self {
        Activity::Message(Message::new(text))
    }

    /// Shorthand for an event activity.
    pub fn event(name: impl Into<String>) -> Self {
        Activity::Event(Event::new(name))
    }

    /// Message text, if this is a message.
    pub fn text(&self) -> Option<&str> {
        match self {
            Activity::Message(m) => Some(&m.text),
            Activity::Event(_) => None,
        }
    }
}

/// The value flowing into a wait.
///
/// Items are what dialogs receive in their resumes and hand back with
/// `done`. The variant decides which [`WaitKind`] can accept it.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", content = "body", rename_all = "snake_case")]
pub enum Item {
    /// The sentinel delivered to a freshly called dialog.
    Start,
    /// A message.
    Message(Message),
    /// An event.
    Event(Event),
    /// A plain value, typically a child dialog's result.
    Value(serde_json::Value),
}

impl Item {
    /// The wait kind this item satisfies exactly.
    pub fn kind(&self) -> WaitKind {
        match self {
            Item::Start => WaitKind::Start,
            Item::Message(_) => WaitKind::Message,
            Item::Event(_) => WaitKind::Event,
            Item::Value(_) => WaitKind::Value,
        }
    }

    /// Borrow the message, if any.
    pub fn as_message(&self) -> Option<&Message> {
        match self {
            Item::Message(m) => Some(m),
            _ => None,
        }
    }

    /// Borrow the event, if any.
    pub fn as_event(&self) -> Option<&Event> {
        match self {
            Item::Event(e) => Some(e),
            _ => None,
        }
    }

    /// Borrow the plain value, if any.
    pub fn as_value(&self) -> Option<&serde_json::Value> {
        match self {
            Item::Value(v) => Some(v),
            _ => None,
        }
    }

    /// Render the item as text for outbound messages.
    pub fn to_text(&self) -> String {
        match self {
            Item::Start => String::new(),
            Item::Message(m) => m.text.clone(),
            Item::Event(e) => e.name.clone(),
            Item::Value(serde_json::Value::String(s)) => s.clone(),
            Item::Value(v) => v.to_string(),
        }
    }
}

impl From<Activity> for Item {
    fn from(activity: Activity) -> Self {
        match activity {
            Activity::Message(m) => Item::Message(m),
            Activity::Event(e) => Item::Event(e),
        }
    }
}

impl From<Message> for Item {
    fn from(message: Message) -> Self {
        Item::Message(message)
    }
}

impl From<Event> for Item {
    fn from(event: Event) -> Self {
        Item::Event(event)
    }
}

impl From<serde_json::Value> for Item {
    fn from(value: serde_json::Value) -> Self {
        Item::Value(value)
    }
}

/// The kind of item a wait accepts.
///
/// This is the closed set of input types a suspended frame can require.
/// Delivering an item of another kind faults the wait instead of running
/// the resume with a mistyped value.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum WaitKind {
    /// Only the start sentinel.
    Start,
    /// User messages.
    Message,
    /// Events.
    Event,
    /// Plain values.
    Value,
    /// Anything. Used when waiting on a child whose result kind is open.
    Any,
}

impl WaitKind {
    /// Whether an item can be delivered into a wait of this kind.
    pub fn accepts(self, item: &Item) -> bool {
        self == WaitKind::Any || self == item.kind()
    }
}

impl fmt::Display for WaitKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            WaitKind::Start => "start",
            WaitKind::Message => "message",
            WaitKind::Event => "event",
            WaitKind::Value => "value",
            WaitKind::Any => "any",
        };
        f.write_str(name)
    }
}
