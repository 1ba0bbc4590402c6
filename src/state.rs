//! Session state machine and application state
//!
//! The whole client mutates one owned [`AppState`], passed by reference into
//! the reconciler, stream engine, and lifecycle controller. There are no
//! ad hoc global writes.

use crate::types::{ConversationSummary, Message};

/// State of the single chat surface
///
/// At most one conversation may be awaiting or streaming a response at any
/// time. Destructive operations on the active conversation are rejected
/// unless the session is idle.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum SessionState {
    /// No send in flight
    #[default]
    Idle,
    /// Request issued, response headers not yet received
    AwaitingFirstByte,
    /// Response body being consumed chunk by chunk
    Streaming,
    /// Terminal chunk processed and the assistant message persisted
    Settled,
    /// Request or stream failed
    Failed,
}

impl SessionState {
    /// True while a response is in flight (request issued or body streaming)
    pub fn in_flight(&self) -> bool {
        matches!(self, Self::AwaitingFirstByte | Self::Streaming)
    }
}

impl std::fmt::Display for SessionState {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Idle => write!(f, "idle"),
            Self::AwaitingFirstByte => write!(f, "awaiting-first-byte"),
            Self::Streaming => write!(f, "streaming"),
            Self::Settled => write!(f, "settled"),
            Self::Failed => write!(f, "failed"),
        }
    }
}

/// The single owned application state
///
/// The reconciler is the only writer of `index`; the stream engine appends to
/// `log` and drives `session`; the lifecycle controller changes `active_id`.
#[derive(Debug, Clone)]
pub struct AppState {
    /// Merged conversation index, sorted descending by `updated_at`
    pub index: Vec<ConversationSummary>,
    /// Id of the conversation currently shown
    pub active_id: u64,
    /// Streaming session state
    pub session: SessionState,
    /// Message log of the active conversation
    pub log: Vec<Message>,
}

impl AppState {
    /// Creates a fresh state for the given active conversation
    pub fn new(active_id: u64) -> Self {
        Self {
            index: Vec::new(),
            active_id,
            session: SessionState::Idle,
            log: Vec::new(),
        }
    }

    /// Largest conversation id known to the index, if any
    pub fn max_id(&self) -> Option<u64> {
        self.index.iter().map(|s| s.id).max()
    }

    /// Looks up a summary by conversation id
    pub fn summary(&self, id: u64) -> Option<&ConversationSummary> {
        self.index.iter().find(|s| s.id == id)
    }
}
