//! Conversation Data Model
//!
//! Transcripts are immutable ordered sequences of messages. Every
//! transformation produces a new value; callers holding an older transcript
//! keep observing exactly the version they started with.

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// Role of the author of a message.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum MessageRole {
    System,
    User,
    Assistant,
}

/// A single conversation message.
///
/// Messages are value types and are never mutated in place; use
/// [`Message::with_content`] to derive an updated copy.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Message {
    pub role: MessageRole,
    pub content: String,
    /// Free-form metadata attached by the host (channel, locale, ...).
    #[serde(default)]
    pub metadata: BTreeMap<String, String>,
    /// Identifier of the conversational turn this message belongs to.
    #[serde(default)]
    pub turn_id: Option<String>,
}

impl Message {
    /// Create a message with the given role and content.
    pub fn new(role: MessageRole, content: impl Into<String>) -> Self {
        Self {
            role,
            content: content.into(),
            metadata: BTreeMap::new(),
            turn_id: None,
        }
    }

    /// Shorthand for a user message.
    pub fn user(content: impl Into<String>) -> Self {
        Self::new(MessageRole::User, content)
    }

    /// Shorthand for an assistant message.
    pub fn assistant(content: impl Into<String>) -> Self {
        Self::new(MessageRole::Assistant, content)
    }

    /// Shorthand for a system message.
    pub fn system(content: impl Into<String>) -> Self {
        Self::new(MessageRole::System, content)
    }

    /// Derive a copy of this message with replaced content.
    ///
    /// Role, metadata and turn id are preserved.
    pub fn with_content(&self, content: impl Into<String>) -> Self {
        Self {
            content: content.into(),
            ..self.clone()
        }
    }

    /// Derive a copy with an additional metadata entry.
    pub fn with_metadata(&self, key: impl Into<String>, value: impl Into<String>) -> Self {
        let mut updated = self.clone();
        updated.metadata.insert(key.into(), value.into());
        updated
    }
}

/// Immutable ordered sequence of conversation messages.
///
/// Message order is chronological and preserved across transformations.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Transcript {
    messages: Vec<Message>,
}

impl Transcript {
    /// Create an empty transcript.
    pub fn new() -> Self {
        Self::default()
    }

    /// Create a transcript from an ordered list of messages.
    pub fn from_messages(messages: Vec<Message>) -> Self {
        Self { messages }
    }

    /// Return a new transcript with `message` appended.
    pub fn append(&self, message: Message) -> Self {
        let mut messages = self.messages.clone();
        messages.push(message);
        Self { messages }
    }

    /// Return a new transcript without the most recent message.
    ///
    /// An empty transcript stays empty.
    pub fn drop_latest(&self) -> Self {
        let mut messages = self.messages.clone();
        messages.pop();
        Self { messages }
    }

    /// The most recent message, if any.
    pub fn latest(&self) -> Option<&Message> {
        self.messages.last()
    }

    /// All messages, oldest first.
    pub fn messages(&self) -> &[Message] {
        &self.messages
    }

    pub fn len(&self) -> usize {
        self.messages.len()
    }

    pub fn is_empty(&self) -> bool {
        self.messages.is_empty()
    }
}

impl From<Vec<Message>> for Transcript {
    fn from(messages: Vec<Message>) -> Self {
        Self::from_messages(messages)
    }
}

impl FromIterator<Message> for Transcript {
    fn from_iter<I: IntoIterator<Item = Message>>(iter: I) -> Self {
        Self::from_messages(iter.into_iter().collect())
    }
}
