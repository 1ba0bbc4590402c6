//! Stream ingestion engine
//!
//! Issues the chat request, consumes the chunked response body, accumulates
//! it into a single assistant message, and settles that message into the
//! conversation's log. The engine drives the session state machine:
//!
//! ```text
//! idle -[send]-> awaiting-first-byte -[headers ok]-> streaming -[stream end]-> settled
//! awaiting-first-byte -[non-2xx / network error]-> failed
//! streaming -[read error]-> failed
//! ```
//!
//! `settled` and `failed` both return control to `idle` for the next send;
//! there is no automatic retry. The accumulation buffer and the settlement
//! target are keyed by the conversation id captured at send time, never by
//! the currently active id.

use std::sync::Arc;

use futures::StreamExt;

use crate::cache::CacheStore;
use crate::reconcile::Reconciler;
use crate::remote::RemoteDirectory;
use crate::render::RenderSink;
use crate::state::{AppState, SessionState};
use crate::types::Message;

/// Fixed user-visible text appended when a chat request fails outright
pub const SEND_FAILURE_TEXT: &str =
    "Sorry, the server could not be reached. Check your connection and try again.";

/// How a call to [`StreamEngine::send`] ended
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SendOutcome {
    /// Preconditions not met; nothing happened
    Rejected,
    /// Stream consumed to the end and the assistant message settled
    Completed,
    /// Request failed before the first byte
    Failed,
    /// Stream broke mid-response; partial output was kept
    Interrupted,
}

/// Incremental UTF-8 decoder for opaque byte chunks
///
/// Chunk boundaries are arbitrary: a multi-byte character split across two
/// chunks is buffered until its remaining bytes arrive, not dropped or
/// corrupted. Invalid sequences decode to the replacement character.
#[derive(Debug, Default)]
pub struct Utf8Decoder {
    pending: Vec<u8>,
}

impl Utf8Decoder {
    pub fn new() -> Self {
        Self::default()
    }

    /// Decode the next chunk, returning all text completed by it
    pub fn feed(&mut self, bytes: &[u8]) -> String {
        self.pending.extend_from_slice(bytes);

        let mut out = String::new();
        loop {
            match std::str::from_utf8(&self.pending) {
                Ok(text) => {
                    out.push_str(text);
                    self.pending.clear();
                    break;
                }
                Err(e) => {
                    let valid = e.valid_up_to();
                    out.push_str(&String::from_utf8_lossy(&self.pending[..valid]));
                    match e.error_len() {
                        // Invalid sequence inside the chunk: replace and move on
                        Some(bad) => {
                            out.push('\u{FFFD}');
                            self.pending.drain(..valid + bad);
                        }
                        // Truncated sequence at the end: keep it for the next chunk
                        None => {
                            self.pending.drain(..valid);
                            break;
                        }
                    }
                }
            }
        }
        out
    }

    /// Flush any bytes still buffered at end of stream
    ///
    /// A non-empty remainder is a truncated sequence that never completed; it
    /// decodes lossily rather than disappearing.
    pub fn finish(&mut self) -> String {
        if self.pending.is_empty() {
            return String::new();
        }
        let out = String::from_utf8_lossy(&self.pending).into_owned();
        self.pending.clear();
        out
    }
}

/// Consumes streaming chat responses into settled assistant messages
pub struct StreamEngine {
    remote: Arc<dyn RemoteDirectory>,
    cache: CacheStore,
}

impl StreamEngine {
    pub fn new(remote: Arc<dyn RemoteDirectory>, cache: CacheStore) -> Self {
        Self { remote, cache }
    }

    /// Send a message on the active conversation and ingest the response
    ///
    /// No-op unless `text` is non-empty after trimming and the session is
    /// idle (at most one send per chat surface at a time). The user message
    /// is appended optimistically before the request is issued.
    ///
    /// On stream end the accumulated text settles as one assistant message,
    /// the log is persisted, and the reconciler records the exchange —
    /// strictly after the terminal chunk, exactly once. Failure paths keep
    /// whatever was accumulated and always return the session to idle.
    pub async fn send(
        &self,
        state: &mut AppState,
        reconciler: &Reconciler,
        text: &str,
        sink: &mut dyn RenderSink,
    ) -> SendOutcome {
        let text = text.trim();
        if text.is_empty() || state.session != SessionState::Idle {
            return SendOutcome::Rejected;
        }

        let conversation_id = state.active_id;
        let user_message = Message::user(text);
        state.log.push(user_message.clone());
        sink.message(&user_message, false);
        sink.pending();
        state.session = SessionState::AwaitingFirstByte;

        let mut stream = match self.remote.open_chat_stream(conversation_id, text).await {
            Ok(stream) => stream,
            Err(e) => {
                tracing::warn!(conversation_id, "chat request failed: {}", e);
                state.session = SessionState::Failed;
                self.append_failure_notice(state, conversation_id, sink);
                state.session = SessionState::Idle;
                return SendOutcome::Failed;
            }
        };

        state.session = SessionState::Streaming;
        let mut decoder = Utf8Decoder::new();
        let mut accumulated = String::new();
        let mut interrupted = false;

        while let Some(chunk) = stream.next().await {
            match chunk {
                Ok(bytes) => {
                    let delta = decoder.feed(&bytes);
                    if !delta.is_empty() {
                        accumulated.push_str(&delta);
                        sink.stream_chunk(&delta, &accumulated);
                    }
                }
                Err(e) => {
                    tracing::warn!(conversation_id, "chat stream interrupted: {}", e);
                    interrupted = true;
                    break;
                }
            }
        }
        if !interrupted {
            let tail = decoder.finish();
            if !tail.is_empty() {
                accumulated.push_str(&tail);
                sink.stream_chunk(&tail, &accumulated);
            }
        }
        sink.stream_closed();

        if interrupted {
            state.session = SessionState::Failed;
            if accumulated.is_empty() {
                // Nothing arrived before the break, so there is no partial
                // output to preserve; surface the fixed failure notice.
                self.append_failure_notice(state, conversation_id, sink);
                state.session = SessionState::Idle;
                return SendOutcome::Failed;
            }
            // Keep the partial output; no error message on top of it.
            self.settle(state, conversation_id, Message::assistant(&accumulated));
            state.session = SessionState::Idle;
            return SendOutcome::Interrupted;
        }

        state.session = SessionState::Settled;
        self.settle(state, conversation_id, Message::assistant(&accumulated));
        reconciler.record_exchange(state, conversation_id, text, sink);
        state.session = SessionState::Idle;
        SendOutcome::Completed
    }

    fn append_failure_notice(
        &self,
        state: &mut AppState,
        conversation_id: u64,
        sink: &mut dyn RenderSink,
    ) {
        let notice = Message::assistant(SEND_FAILURE_TEXT);
        sink.message(&notice, true);
        self.settle(state, conversation_id, notice);
    }

    /// Append a message to the log of the conversation captured at send time
    ///
    /// When that conversation is still active the in-memory log is extended
    /// and persisted. When the surface has navigated elsewhere the message
    /// settles into the captured conversation's cached log instead, so a
    /// late completion never corrupts the now-active conversation's log.
    pub(crate) fn settle(&self, state: &mut AppState, conversation_id: u64, message: Message) {
        if state.active_id == conversation_id {
            state.log.push(message);
            if let Err(e) = self.cache.save_log(conversation_id, &state.log) {
                tracing::warn!(conversation_id, "failed to persist message log: {}", e);
            }
        } else {
            let mut log = match self.cache.load_log(conversation_id) {
                Ok(Some(log)) => log,
                _ => Vec::new(),
            };
            log.push(message);
            if let Err(e) = self.cache.save_log(conversation_id, &log) {
                tracing::warn!(conversation_id, "failed to persist detached message log: {}", e);
            }
        }
    }
}
