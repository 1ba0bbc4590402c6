//! History reconciliation
//!
//! The reconciler merges the remote directory's view of the user's
//! conversations with the local cache into a single ordered index, preferring
//! remote truth when reachable. It never fails outward: remote unavailability
//! degrades to the cached index, and an absent cache degrades to a seeded
//! default conversation. The reconciler is the only writer of the in-memory
//! index.

use std::sync::Arc;

use crate::cache::CacheStore;
use crate::filter::ExclusionFilter;
use crate::remote::RemoteDirectory;
use crate::render::RenderSink;
use crate::state::AppState;
use crate::types::{
    now_millis, ConversationSummary, Message, Role, DEFAULT_CONVERSATION_ID, INITIAL_CHAT_TITLE,
    NEW_CHAT_PREVIEW, WELCOME_PREVIEW,
};

/// Spacing between synthesized summary timestamps, in milliseconds
///
/// The remote directory does not report recency, so summaries are stamped
/// with decreasing offsets from now in id-query order. The display order is
/// then deterministic within a session.
const RECENCY_STEP_MS: i64 = 1_000;

/// Merges remote and cached conversation history into one consistent index
pub struct Reconciler {
    remote: Arc<dyn RemoteDirectory>,
    cache: CacheStore,
    filter: ExclusionFilter,
}

impl Reconciler {
    pub fn new(remote: Arc<dyn RemoteDirectory>, cache: CacheStore, filter: ExclusionFilter) -> Self {
        Self {
            remote,
            cache,
            filter,
        }
    }

    /// Load the conversation index
    ///
    /// Queries the remote directory for all known conversation ids and
    /// derives a summary for each one; the preview is the most recent
    /// user-role message in its log, or a fixed placeholder when the log has
    /// no user messages or the per-id fetch fails. The assembled index is
    /// persisted to the cache as a backup.
    ///
    /// When the directory query itself fails (or lists nothing), the cached
    /// index is used instead; when no cache exists, a single default
    /// conversation is seeded. Afterwards the active conversation id is
    /// guaranteed to be present in the index.
    pub async fn load_index(&self, state: &mut AppState, sink: &mut dyn RenderSink) {
        match self.remote.conversation_ids().await {
            Ok(ids) if !ids.is_empty() => {
                let now = now_millis();
                let mut index = Vec::with_capacity(ids.len());
                for (position, id) in ids.into_iter().enumerate() {
                    let preview = match self.remote.message_log(id).await {
                        Ok(payload) => {
                            latest_user_preview(&self.filter.retain(payload.messages))
                                .unwrap_or_else(|| NEW_CHAT_PREVIEW.to_string())
                        }
                        Err(e) => {
                            tracing::debug!(
                                conversation_id = id,
                                "log fetch failed during reconciliation: {}",
                                e
                            );
                            NEW_CHAT_PREVIEW.to_string()
                        }
                    };
                    index.push(ConversationSummary::new(
                        id,
                        preview,
                        now - position as i64 * RECENCY_STEP_MS,
                    ));
                }

                state.index = index;
                if let Err(e) = self.cache.save_index(&state.index) {
                    tracing::warn!("failed to persist conversation index: {}", e);
                }
            }
            Ok(_) => {
                tracing::debug!("remote directory listed no conversations, using cache");
                self.load_cached_index(state);
            }
            Err(e) => {
                tracing::warn!("remote directory unavailable, using cache: {}", e);
                self.load_cached_index(state);
            }
        }

        self.ensure_active_present(state);
        sort_for_display(&mut state.index);
        sink.index_updated(&state.index);
    }

    /// Record a completed exchange for a conversation
    ///
    /// Upserts the conversation's summary (creating it if absent), sets the
    /// preview to the last user message and the timestamp to now, persists
    /// the whole index, and signals a re-render. Called exactly once per
    /// completed send, after the stream settles.
    pub fn record_exchange(
        &self,
        state: &mut AppState,
        conversation_id: u64,
        last_user_message: &str,
        sink: &mut dyn RenderSink,
    ) {
        let now = now_millis();
        match state.index.iter_mut().find(|s| s.id == conversation_id) {
            Some(summary) => {
                summary.last_message_preview = last_user_message.to_string();
                summary.updated_at = now;
            }
            None => {
                state.index.push(ConversationSummary::new(
                    conversation_id,
                    last_user_message,
                    now,
                ));
            }
        }

        sort_for_display(&mut state.index);
        if let Err(e) = self.cache.save_index(&state.index) {
            tracing::warn!("failed to persist conversation index: {}", e);
        }
        sink.index_updated(&state.index);
    }

    /// Load one conversation's message log, remote first
    ///
    /// Falls back to the cached log when the remote is unreachable, and to an
    /// empty log when neither has the conversation. Excluded messages are
    /// dropped on both paths.
    pub async fn load_log(&self, conversation_id: u64) -> Vec<Message> {
        match self.remote.message_log(conversation_id).await {
            Ok(payload) => {
                let messages = self.filter.retain(payload.messages);
                tracing::info!(
                    conversation_id,
                    "loaded {} messages from {}",
                    messages.len(),
                    payload.source.as_deref().unwrap_or("unknown source")
                );
                messages
            }
            Err(e) => {
                tracing::debug!(conversation_id, "remote log unavailable: {}", e);
                match self.cache.load_log(conversation_id) {
                    Ok(Some(messages)) => {
                        let messages = self.filter.retain(messages);
                        tracing::info!(
                            conversation_id,
                            "loaded {} messages from local cache",
                            messages.len()
                        );
                        messages
                    }
                    Ok(None) => Vec::new(),
                    Err(e) => {
                        tracing::warn!(conversation_id, "cached log unreadable: {}", e);
                        Vec::new()
                    }
                }
            }
        }
    }

    fn load_cached_index(&self, state: &mut AppState) {
        match self.cache.load_index() {
            Ok(Some(index)) => {
                state.index = index;
            }
            Ok(None) => {
                self.seed_default(state);
            }
            Err(e) => {
                tracing::warn!("cached index unreadable, seeding default: {}", e);
                self.seed_default(state);
            }
        }
    }

    fn seed_default(&self, state: &mut AppState) {
        state.index = vec![ConversationSummary {
            id: DEFAULT_CONVERSATION_ID,
            title: INITIAL_CHAT_TITLE.to_string(),
            last_message_preview: WELCOME_PREVIEW.to_string(),
            updated_at: now_millis(),
        }];
        if let Err(e) = self.cache.save_index(&state.index) {
            tracing::warn!("failed to persist seeded index: {}", e);
        }
    }

    fn ensure_active_present(&self, state: &mut AppState) {
        if state.summary(state.active_id).is_some() {
            return;
        }
        state.index.push(ConversationSummary::new(
            state.active_id,
            NEW_CHAT_PREVIEW,
            now_millis(),
        ));
        if let Err(e) = self.cache.save_index(&state.index) {
            tracing::warn!("failed to persist conversation index: {}", e);
        }
    }
}

/// Most recent user-role message content, when the log has one
fn latest_user_preview(messages: &[Message]) -> Option<String> {
    messages
        .iter()
        .filter(|m| m.role == Role::User)
        .max_by_key(|m| m.timestamp)
        .map(|m| m.content.clone())
}

/// Display ordering: descending by `updated_at`
fn sort_for_display(index: &mut [ConversationSummary]) {
    index.sort_by(|a, b| b.updated_at.cmp(&a.updated_at));
}
