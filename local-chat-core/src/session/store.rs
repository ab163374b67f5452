//! Conversation data structures

use serde::{Deserialize, Serialize};
use std::fmt;
use uuid::Uuid;

/// Who authored a message
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Role {
    User,
    Assistant,
}

impl Role {
    pub fn as_str(&self) -> &'static str {
        match self {
            Role::User => "user",
            Role::Assistant => "assistant",
        }
    }
}

impl fmt::Display for Role {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A chat message. Values are created once and never mutated.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Message {
    role: Role,
    content: String,
}

impl Message {
    /// Create a message with an explicit role
    pub fn new(role: Role, content: impl Into<String>) -> Self {
        Self {
            role,
            content: content.into(),
        }
    }

    /// Create a user message
    pub fn user(content: impl Into<String>) -> Self {
        Self::new(Role::User, content)
    }

    /// Create an assistant message
    pub fn assistant(content: impl Into<String>) -> Self {
        Self::new(Role::Assistant, content)
    }

    pub fn role(&self) -> Role {
        self.role
    }

    pub fn content(&self) -> &str {
        &self.content
    }
}

/// Stable reference to a conversation that survives title changes
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct ConversationHandle(Uuid);

impl ConversationHandle {
    pub(crate) fn generate() -> Self {
        Self(Uuid::new_v4())
    }
}

impl fmt::Display for ConversationHandle {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// A titled, ordered sequence of user/assistant turns
#[derive(Debug, Clone)]
pub struct Conversation {
    /// Internal identifier, never changes
    pub(crate) handle: ConversationHandle,
    /// Display title, unique within a store
    pub(crate) title: String,
    pub(crate) messages: Vec<Message>,
}

impl Conversation {
    /// Create an empty conversation
    pub fn new(title: impl Into<String>) -> Self {
        Self::with_messages(title, Vec::new())
    }

    /// Create a conversation with existing history
    pub fn with_messages(title: impl Into<String>, messages: Vec<Message>) -> Self {
        Self {
            handle: ConversationHandle::generate(),
            title: title.into(),
            messages,
        }
    }

    pub fn handle(&self) -> ConversationHandle {
        self.handle
    }

    pub fn title(&self) -> &str {
        &self.title
    }

    pub fn messages(&self) -> &[Message] {
        &self.messages
    }

    /// The first message the user sent, used for auto-titling
    pub fn opening_user_message(&self) -> Option<&Message> {
        self.messages.iter().find(|m| m.role() == Role::User)
    }
}
