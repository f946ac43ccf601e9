//! Conversation domain model.
//!
//! A conversation is an ordered, independently addressable thread of
//! messages between the human and one agent. Per-agent chat data keeps
//! a most-recent-first index alongside the conversation map; that index
//! is the sole recency ordering used for listing.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use uuid::Uuid;

use super::label::derive_label;

/// Label given to conversations created without an explicit one.
pub const DEFAULT_LABEL: &str = "New chat";

/// Represents the role of a message in a conversation.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum MessageRole {
    /// Message from the user.
    User,
    /// Message from the AI assistant.
    Assistant,
}

/// A single message in a conversation history.
///
/// Messages are immutable once appended.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Message {
    /// Unique message identifier (UUID format)
    pub id: String,
    /// Owning agent identifier
    pub agent_id: String,
    /// The role of the message sender
    pub role: MessageRole,
    /// Message text
    pub text: String,
    /// Timestamp when the message was created
    pub timestamp: DateTime<Utc>,
    /// External reasoning-process session id captured for this turn
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub session_id: Option<String>,
    /// Attachment references (paths or URLs)
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub attachments: Vec<String>,
}

impl Message {
    /// Creates a user message stamped with the current time.
    pub fn user(agent_id: impl Into<String>, text: impl Into<String>) -> Self {
        Self {
            id: Uuid::new_v4().to_string(),
            agent_id: agent_id.into(),
            role: MessageRole::User,
            text: text.into(),
            timestamp: Utc::now(),
            session_id: None,
            attachments: Vec::new(),
        }
    }

    /// Creates an assistant message stamped with the current time.
    pub fn assistant(
        agent_id: impl Into<String>,
        text: impl Into<String>,
        session_id: Option<String>,
    ) -> Self {
        Self {
            id: Uuid::new_v4().to_string(),
            agent_id: agent_id.into(),
            role: MessageRole::Assistant,
            text: text.into(),
            timestamp: Utc::now(),
            session_id,
            attachments: Vec::new(),
        }
    }

    /// Attaches file references to the message.
    pub fn with_attachments(mut self, attachments: Vec<String>) -> Self {
        self.attachments = attachments;
        self
    }
}

/// A thread of messages between the human and one agent.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Conversation {
    /// Unique conversation identifier (UUID format)
    pub id: String,
    /// Owning agent identifier
    pub agent_id: String,
    /// Short human-readable summary, auto-derived from the first user
    /// message unless explicitly set
    pub label: String,
    /// Ordered message history
    pub messages: Vec<Message>,
    /// Timestamp when the conversation was created
    pub created_at: DateTime<Utc>,
    /// Timestamp of the most recent message
    pub last_active_at: DateTime<Utc>,
}

impl Conversation {
    /// Creates an empty conversation for the given agent.
    pub fn new(agent_id: impl Into<String>, label: Option<String>) -> Self {
        let now = Utc::now();
        Self {
            id: Uuid::new_v4().to_string(),
            agent_id: agent_id.into(),
            label: label.unwrap_or_else(|| DEFAULT_LABEL.to_string()),
            messages: Vec::new(),
            created_at: now,
            last_active_at: now,
        }
    }
}

/// Per-agent conversation map plus its recency index.
///
/// `order` contains exactly the keys of `conversations`, most recent
/// first. It is re-ordered on every append and front-inserted on
/// creation; no timestamp sort is authoritative for listing.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct AgentChatData {
    /// Conversations keyed by id
    pub conversations: HashMap<String, Conversation>,
    /// Conversation ids, most recent first
    pub order: Vec<String>,
}

impl AgentChatData {
    /// Inserts a conversation at the front of the recency index.
    pub fn insert(&mut self, conversation: Conversation) {
        self.order.retain(|id| *id != conversation.id);
        self.order.insert(0, conversation.id.clone());
        self.conversations
            .insert(conversation.id.clone(), conversation);
    }

    /// Appends a message to the given conversation.
    ///
    /// Updates `last_active_at` to the message timestamp, moves the
    /// conversation to the front of the index, and derives the label
    /// from the first user message while the label is still the
    /// default placeholder.
    ///
    /// Returns `false` if the conversation id is unknown (no mutation).
    pub fn append_message(&mut self, conversation_id: &str, message: Message) -> bool {
        let Some(conversation) = self.conversations.get_mut(conversation_id) else {
            return false;
        };

        if conversation.label == DEFAULT_LABEL && message.role == MessageRole::User {
            conversation.label = derive_label(&message.text);
        }
        conversation.last_active_at = message.timestamp;
        conversation.messages.push(message);

        self.order.retain(|id| id != conversation_id);
        self.order.insert(0, conversation_id.to_string());
        true
    }

    /// Removes a conversation, returning it if it existed.
    pub fn remove(&mut self, conversation_id: &str) -> Option<Conversation> {
        self.order.retain(|id| id != conversation_id);
        self.conversations.remove(conversation_id)
    }

    /// Returns conversations in recency order (most recent first).
    pub fn ordered(&self) -> Vec<&Conversation> {
        self.order
            .iter()
            .filter_map(|id| self.conversations.get(id))
            .collect()
    }

    /// Checks the order invariant: the index holds exactly the keys of
    /// the conversation map, without duplicates.
    pub fn is_consistent(&self) -> bool {
        if self.order.len() != self.conversations.len() {
            return false;
        }
        self.order.iter().all(|id| self.conversations.contains_key(id))
    }
}
