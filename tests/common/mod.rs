//! Shared helpers for integration tests.

use chatsync::render::RenderSink;
use chatsync::types::{ConversationSummary, Message};
use chatsync::Config;

/// Build a config pointing at a mock server and a temp cache directory.
pub fn test_config(base_url: &str, cache_dir: &std::path::Path) -> Config {
    let mut config = Config::default();
    config.remote.base_url = base_url.to_string();
    config.remote.request_timeout_seconds = 5;
    config.cache.path = Some(cache_dir.join("cache").to_string_lossy().to_string());
    config
}

/// Sink that records render events for assertions.
#[derive(Debug, Default)]
pub struct CollectingSink {
    pub indexes: Vec<Vec<ConversationSummary>>,
    pub messages: Vec<(Message, bool)>,
    pub chunks: Vec<String>,
    pub notices: Vec<String>,
}

impl RenderSink for CollectingSink {
    fn index_updated(&mut self, index: &[ConversationSummary]) {
        self.indexes.push(index.to_vec());
    }

    fn message(&mut self, message: &Message, is_error: bool) {
        self.messages.push((message.clone(), is_error));
    }

    fn pending(&mut self) {}

    fn stream_chunk(&mut self, delta: &str, _accumulated: &str) {
        self.chunks.push(delta.to_string());
    }

    fn stream_closed(&mut self) {}

    fn notice(&mut self, text: &str) {
        self.notices.push(text.to_string());
    }
}
