//! Shared test doubles
//!
//! A scripted in-memory [`RemoteDirectory`] implementation and a recording
//! [`RenderSink`], used by the unit tests across modules.

use std::collections::{HashMap, HashSet};
use std::sync::Mutex;

use async_trait::async_trait;
use bytes::Bytes;

use crate::cache::CacheStore;
use crate::error::{ChatSyncError, Result};
use crate::remote::{ChatByteStream, LogPayload, RemoteDirectory};
use crate::render::RenderSink;
use crate::types::{ConversationSummary, Message};

/// Cache backed by a temp directory; the caller keeps the `TempDir` alive.
pub fn temp_cache() -> (CacheStore, tempfile::TempDir) {
    let dir = tempfile::tempdir().expect("failed to create tempdir");
    let cache = CacheStore::open(dir.path().join("cache")).expect("failed to open cache");
    (cache, dir)
}

/// Scripted remote directory
///
/// Built with the builder methods below; every behavior (listing, per-id
/// logs, chat stream shape, delete outcome) is configured up front.
#[derive(Debug, Default)]
pub struct FakeRemote {
    ids: Vec<u64>,
    directory_fails: bool,
    logs: HashMap<u64, Vec<Message>>,
    failing_logs: HashSet<u64>,
    chat_chunks: Vec<Vec<u8>>,
    chat_fails: bool,
    chat_errors_after: bool,
    delete_fails: bool,
    delete_calls: Mutex<Vec<u64>>,
    chat_call_log: Mutex<Vec<(u64, String)>>,
}

impl FakeRemote {
    pub fn new() -> Self {
        Self::default()
    }

    /// Directory listing returns these ids
    pub fn with_ids(mut self, ids: Vec<u64>) -> Self {
        self.ids = ids;
        self
    }

    /// Directory listing fails
    pub fn with_directory_failure(mut self) -> Self {
        self.directory_fails = true;
        self
    }

    /// Log fetch for `id` returns these messages
    pub fn with_log(mut self, id: u64, messages: Vec<Message>) -> Self {
        self.logs.insert(id, messages);
        self
    }

    /// Log fetch for `id` fails
    pub fn with_failing_log(mut self, id: u64) -> Self {
        self.failing_logs.insert(id);
        self
    }

    /// Chat stream delivers these chunks then closes cleanly
    pub fn with_chat_chunks(mut self, chunks: Vec<Vec<u8>>) -> Self {
        self.chat_chunks = chunks;
        self
    }

    /// Chat stream delivers these chunks then breaks with a read error
    pub fn with_chat_chunks_then_error(mut self, chunks: Vec<Vec<u8>>) -> Self {
        self.chat_chunks = chunks;
        self.chat_errors_after = true;
        self
    }

    /// Chat request fails before any byte arrives
    pub fn with_failing_chat(mut self) -> Self {
        self.chat_fails = true;
        self
    }

    /// Delete requests fail
    pub fn with_failing_delete(mut self) -> Self {
        self.delete_fails = true;
        self
    }

    /// Conversation ids passed to `delete_conversation`, in call order
    pub fn delete_calls(&self) -> Vec<u64> {
        self.delete_calls.lock().expect("lock poisoned").clone()
    }

    /// `(conversation_id, text)` pairs passed to `open_chat_stream`
    pub fn chat_calls(&self) -> Vec<(u64, String)> {
        self.chat_call_log.lock().expect("lock poisoned").clone()
    }
}

#[async_trait]
impl RemoteDirectory for FakeRemote {
    async fn conversation_ids(&self) -> Result<Vec<u64>> {
        if self.directory_fails {
            return Err(ChatSyncError::Remote("directory unavailable".into()).into());
        }
        Ok(self.ids.clone())
    }

    async fn message_log(&self, conversation_id: u64) -> Result<LogPayload> {
        if self.failing_logs.contains(&conversation_id) {
            return Err(ChatSyncError::Remote(format!(
                "log fetch failed for {}",
                conversation_id
            ))
            .into());
        }
        match self.logs.get(&conversation_id) {
            Some(messages) => Ok(LogPayload {
                messages: messages.clone(),
                source: Some("fake".to_string()),
            }),
            None => Err(ChatSyncError::Remote(format!(
                "unknown conversation {}",
                conversation_id
            ))
            .into()),
        }
    }

    async fn delete_conversation(&self, conversation_id: u64) -> Result<()> {
        self.delete_calls
            .lock()
            .expect("lock poisoned")
            .push(conversation_id);
        if self.delete_fails {
            return Err(ChatSyncError::Remote("delete rejected".into()).into());
        }
        Ok(())
    }

    async fn open_chat_stream(&self, conversation_id: u64, text: &str) -> Result<ChatByteStream> {
        self.chat_call_log
            .lock()
            .expect("lock poisoned")
            .push((conversation_id, text.to_string()));

        if self.chat_fails {
            return Err(ChatSyncError::Stream("chat request returned HTTP 502".into()).into());
        }

        let mut items: Vec<Result<Bytes>> = self
            .chat_chunks
            .iter()
            .map(|chunk| Ok(Bytes::from(chunk.clone())))
            .collect();
        if self.chat_errors_after {
            items.push(Err(ChatSyncError::Stream("connection reset".into()).into()));
        }
        Ok(Box::pin(futures::stream::iter(items)))
    }
}

/// Sink that records every render event for assertions
#[derive(Debug, Default)]
pub struct RecordingSink {
    /// Snapshot of the index at each `index_updated` call
    pub indexes: Vec<Vec<ConversationSummary>>,
    /// Complete messages with their error flag
    pub messages: Vec<(Message, bool)>,
    /// Number of pending affordances shown
    pub pending_count: usize,
    /// Decoded chunk deltas in arrival order
    pub chunks: Vec<String>,
    /// Accumulated text after each chunk
    pub accumulated: Vec<String>,
    /// Number of stream closures
    pub closed: usize,
    /// Out-of-band notices
    pub notices: Vec<String>,
}

impl RenderSink for RecordingSink {
    fn index_updated(&mut self, index: &[ConversationSummary]) {
        self.indexes.push(index.to_vec());
    }

    fn message(&mut self, message: &Message, is_error: bool) {
        self.messages.push((message.clone(), is_error));
    }

    fn pending(&mut self) {
        self.pending_count += 1;
    }

    fn stream_chunk(&mut self, delta: &str, accumulated: &str) {
        self.chunks.push(delta.to_string());
        self.accumulated.push(accumulated.to_string());
    }

    fn stream_closed(&mut self) {
        self.closed += 1;
    }

    fn notice(&mut self, text: &str) {
        self.notices.push(text.to_string());
    }
}
