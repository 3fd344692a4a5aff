//! Ordered message log with one mutable in-progress slot

use crate::protocol::{Role, WireMessage};
use chrono::{DateTime, Utc};
use serde::Serialize;

/// One exchanged message
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Message {
    pub id: String,
    pub role: Role,
    pub content: String,
    pub timestamp: DateTime<Utc>,
}

/// Append-only message store.
///
/// Entries are never reordered or removed individually; only the content of
/// the last entry may change, and only when it is an assistant message.
#[derive(Debug, Clone, Default)]
pub struct MessageLog {
    messages: Vec<Message>,
}

impl MessageLog {
    pub fn new() -> Self {
        Self::default()
    }

    /// Append a message, assigning its id and timestamp
    pub fn append(&mut self, role: Role, content: impl Into<String>) -> &Message {
        self.messages.push(Message {
            id: uuid::Uuid::new_v4().to_string(),
            role,
            content: content.into(),
            timestamp: Utc::now(),
        });
        &self.messages[self.messages.len() - 1]
    }

    /// Replace the content of the last message if it is from the assistant.
    ///
    /// Returns false (and changes nothing) otherwise.
    pub fn replace_last_assistant_content(&mut self, content: impl Into<String>) -> bool {
        match self.messages.last_mut() {
            Some(last) if last.role == Role::Assistant => {
                last.content = content.into();
                true
            }
            _ => false,
        }
    }

    /// Append text to the last message if it is from the assistant.
    ///
    /// Same no-op rule as [`Self::replace_last_assistant_content`].
    pub fn append_to_last_assistant(&mut self, text: &str) -> bool {
        match self.messages.last_mut() {
            Some(last) if last.role == Role::Assistant => {
                last.content.push_str(text);
                true
            }
            _ => false,
        }
    }

    /// Read-only ordered view for rendering
    pub fn snapshot(&self) -> &[Message] {
        &self.messages
    }

    pub fn last(&self) -> Option<&Message> {
        self.messages.last()
    }

    pub fn is_empty(&self) -> bool {
        self.messages.is_empty()
    }

    /// Drop every entry; only used when the conversation is reset
    pub fn clear(&mut self) {
        self.messages.clear();
    }

    /// Every entry in the shape a chat request carries
    pub fn history(&self) -> Vec<WireMessage> {
        self.messages
            .iter()
            .map(|m| WireMessage {
                role: m.role,
                content: m.content.clone(),
            })
            .collect()
    }
}
