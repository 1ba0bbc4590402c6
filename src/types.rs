//! Core data model for ChatSync
//!
//! This module defines the message and conversation-summary shapes shared by
//! the remote client, the cache store, and the reconciler. The JSON forms of
//! these types are the wire and cache formats, so they round-trip without
//! loss.

use chrono::Utc;
use serde::{Deserialize, Serialize};

/// Default conversation id selected when none is supplied
pub const DEFAULT_CONVERSATION_ID: u64 = 1;

/// Title given to the seeded conversation when neither the remote directory
/// nor the cache has any entries
pub const INITIAL_CHAT_TITLE: &str = "initial chat";

/// Preview shown for the seeded conversation
pub const WELCOME_PREVIEW: &str = "Welcome to the chat assistant";

/// Preview shown for conversations with no user messages yet (also used when
/// a per-conversation log fetch fails during reconciliation)
pub const NEW_CHAT_PREVIEW: &str = "New conversation";

/// Role of a message sender
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Role {
    /// Message authored by the user
    User,
    /// Message authored by the assistant
    Assistant,
    /// Backend-injected message, never surfaced to the user
    System,
}

impl std::fmt::Display for Role {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::User => write!(f, "user"),
            Self::Assistant => write!(f, "assistant"),
            Self::System => write!(f, "system"),
        }
    }
}

/// A single message within a conversation
///
/// Message logs are append-only: a message is never edited in place once it
/// has entered a conversation's log.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Message {
    /// Role of the sender
    pub role: Role,
    /// Raw message text (display transforms are applied at render time only)
    pub content: String,
    /// Creation time, unix epoch milliseconds
    pub timestamp: i64,
}

impl Message {
    /// Creates a new user message stamped with the current time
    ///
    /// # Examples
    ///
    /// ```
    /// use chatsync::types::{Message, Role};
    ///
    /// let msg = Message::user("Hello, assistant!");
    /// assert_eq!(msg.role, Role::User);
    /// ```
    pub fn user(content: impl Into<String>) -> Self {
        Self {
            role: Role::User,
            content: content.into(),
            timestamp: now_millis(),
        }
    }

    /// Creates a new assistant message stamped with the current time
    pub fn assistant(content: impl Into<String>) -> Self {
        Self {
            role: Role::Assistant,
            content: content.into(),
            timestamp: now_millis(),
        }
    }

    /// Creates a new system message stamped with the current time
    pub fn system(content: impl Into<String>) -> Self {
        Self {
            role: Role::System,
            content: content.into(),
            timestamp: now_millis(),
        }
    }
}

/// Index-level metadata for a conversation, shown in the selection list
///
/// Identity is `id`; display ordering is always descending by `updated_at`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ConversationSummary {
    /// Externally assigned unique conversation id
    pub id: u64,
    /// Conversation title
    pub title: String,
    /// Most recent user message, or a fixed placeholder
    pub last_message_preview: String,
    /// Last activity time, unix epoch milliseconds
    pub updated_at: i64,
}

impl ConversationSummary {
    /// Creates a summary with the standard title for an existing conversation
    pub fn new(id: u64, preview: impl Into<String>, updated_at: i64) -> Self {
        Self {
            id,
            title: format!("Chat {}", id),
            last_message_preview: preview.into(),
            updated_at,
        }
    }
}

/// Current time as unix epoch milliseconds
///
/// Used consistently for message and summary timestamps so recency
/// comparisons are uniform across the remote, cache, and in-memory views.
pub fn now_millis() -> i64 {
    Utc::now().timestamp_millis()
}
