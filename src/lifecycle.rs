//! Conversation lifecycle control
//!
//! The controller orchestrates creation, switching, and deletion of
//! conversations and owns the reconciler and stream engine. It enforces the
//! rule that no destructive action runs while a response is in flight for the
//! active conversation: a rejected attempt is dropped, not deferred.

use std::sync::Arc;

use crate::cache::CacheStore;
use crate::filter::ExclusionFilter;
use crate::reconcile::Reconciler;
use crate::remote::RemoteDirectory;
use crate::render::RenderSink;
use crate::state::AppState;
use crate::stream::{SendOutcome, StreamEngine};
use crate::types::{now_millis, ConversationSummary, NEW_CHAT_PREVIEW};

/// Notice shown when a conversation's log is empty
pub const WELCOME_NOTICE: &str =
    "Welcome! Each conversation keeps an independent history. Type a message to begin.";

/// Notice shown when deleting the active conversation is rejected
pub const DELETE_BLOCKED_NOTICE: &str =
    "A response is still in flight for this conversation; it cannot be deleted right now.";

/// Orchestrates conversation transitions and message sending
pub struct SessionController {
    remote: Arc<dyn RemoteDirectory>,
    cache: CacheStore,
    reconciler: Reconciler,
    engine: StreamEngine,
}

impl SessionController {
    pub fn new(remote: Arc<dyn RemoteDirectory>, cache: CacheStore, filter: ExclusionFilter) -> Self {
        let reconciler = Reconciler::new(Arc::clone(&remote), cache.clone(), filter);
        let engine = StreamEngine::new(Arc::clone(&remote), cache.clone());
        Self {
            remote,
            cache,
            reconciler,
            engine,
        }
    }

    /// Startup path: reconcile the index, then activate the selected
    /// conversation
    pub async fn initialize(&self, state: &mut AppState, sink: &mut dyn RenderSink) {
        self.reconciler.load_index(state, sink).await;
        let active_id = state.active_id;
        self.activate(state, active_id, sink).await;
    }

    /// Make `id` the active conversation and re-run its load path
    ///
    /// The log is fetched remote-first with cache fallback; an empty log
    /// surfaces the welcome notice instead.
    pub async fn activate(&self, state: &mut AppState, id: u64, sink: &mut dyn RenderSink) {
        state.active_id = id;
        state.log = self.reconciler.load_log(id).await;

        if state.log.is_empty() {
            sink.notice(WELCOME_NOTICE);
        } else {
            for message in &state.log {
                sink.message(message, false);
            }
        }
    }

    /// Send a message on the active conversation
    pub async fn send(
        &self,
        state: &mut AppState,
        text: &str,
        sink: &mut dyn RenderSink,
    ) -> SendOutcome {
        self.engine.send(state, &self.reconciler, text, sink).await
    }

    /// Switch the surface to another conversation
    ///
    /// No-op when `id` is already active or a response is in flight. The
    /// active log is flushed to the cache before the context changes.
    pub async fn switch_to(&self, state: &mut AppState, id: u64, sink: &mut dyn RenderSink) {
        if id == state.active_id || state.session.in_flight() {
            return;
        }
        self.flush_active_log(state);
        self.activate(state, id, sink).await;
    }

    /// Create a new conversation and switch to it
    ///
    /// The new id is strictly greater than every id in the index. Returns the
    /// new id, or `None` when a response is in flight.
    pub async fn start_new(
        &self,
        state: &mut AppState,
        sink: &mut dyn RenderSink,
    ) -> Option<u64> {
        if state.session.in_flight() {
            return None;
        }
        self.flush_active_log(state);

        let new_id = state.max_id().unwrap_or(0) + 1;
        state.index.insert(
            0,
            ConversationSummary {
                id: new_id,
                title: format!("New chat {}", new_id),
                last_message_preview: NEW_CHAT_PREVIEW.to_string(),
                updated_at: now_millis(),
            },
        );
        if let Err(e) = self.cache.save_index(&state.index) {
            tracing::warn!("failed to persist conversation index: {}", e);
        }
        sink.index_updated(&state.index);

        self.activate(state, new_id, sink).await;
        Some(new_id)
    }

    /// Delete a conversation
    ///
    /// Rejected with a notice when `id` is active and a response is in
    /// flight. Otherwise the `confirm` callback gates the removal; once
    /// confirmed, local state is the source of truth — the conversation is
    /// removed from the index and its cached log purged whether or not the
    /// remote delete succeeds. Deleting the active conversation switches to
    /// the first remaining one, or starts a fresh conversation when none
    /// remain. Returns whether removal happened.
    pub async fn delete<F>(
        &self,
        state: &mut AppState,
        id: u64,
        confirm: F,
        sink: &mut dyn RenderSink,
    ) -> bool
    where
        F: FnOnce(&ConversationSummary) -> bool,
    {
        if id == state.active_id && state.session.in_flight() {
            sink.notice(DELETE_BLOCKED_NOTICE);
            return false;
        }
        let Some(summary) = state.summary(id) else {
            sink.notice(&format!("No conversation with id {}", id));
            return false;
        };
        if !confirm(summary) {
            return false;
        }

        match self.remote.delete_conversation(id).await {
            Ok(()) => tracing::debug!(conversation_id = id, "remote delete acknowledged"),
            Err(e) => tracing::warn!(
                conversation_id = id,
                "remote delete failed, removing locally anyway: {}",
                e
            ),
        }

        state.index.retain(|s| s.id != id);
        if let Err(e) = self.cache.purge_log(id) {
            tracing::warn!(conversation_id = id, "failed to purge cached log: {}", e);
        }
        if let Err(e) = self.cache.save_index(&state.index) {
            tracing::warn!("failed to persist conversation index: {}", e);
        }
        sink.index_updated(&state.index);

        if id == state.active_id {
            // The active log belonged to the deleted conversation; drop it so
            // no later flush resurrects the purged entry.
            state.log.clear();
            match state.index.first().map(|s| s.id) {
                Some(next_id) => self.activate(state, next_id, sink).await,
                None => {
                    self.start_new(state, sink).await;
                }
            }
        }
        true
    }

    fn flush_active_log(&self, state: &AppState) {
        if state.log.is_empty() {
            return;
        }
        if let Err(e) = self.cache.save_log(state.active_id, &state.log) {
            tracing::warn!(
                conversation_id = state.active_id,
                "failed to flush message log: {}",
                e
            );
        }
    }
}
