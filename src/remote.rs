//! Remote directory client
//!
//! This module defines the [`RemoteDirectory`] trait covering the four
//! operations the authoritative service exposes (conversation listing,
//! per-conversation log fetch, streaming chat completion, and conversation
//! deletion), along with the HTTP implementation backed by `reqwest`.
//!
//! Payloads from the service are dynamically shaped; they are validated and
//! coerced into the strict [`crate::types`] shapes at this boundary.
//! Malformed log entries are quarantined (skipped with a warning) rather than
//! propagated inward.

use crate::config::RemoteConfig;
use crate::error::{ChatSyncError, Result};
use crate::types::Message;
use async_trait::async_trait;
use bytes::Bytes;
use futures::{Stream, StreamExt};
use std::pin::Pin;
use std::time::Duration;
use url::Url;

/// Raw byte chunks of a streaming chat response
///
/// Chunks are opaque bytes; decoding across chunk boundaries is the stream
/// engine's responsibility.
pub type ChatByteStream = Pin<Box<dyn Stream<Item = Result<Bytes>> + Send>>;

/// A conversation's message log as served by the remote
#[derive(Debug, Clone)]
pub struct LogPayload {
    /// Messages in insertion order
    pub messages: Vec<Message>,
    /// Where the backend served the log from, when reported
    pub source: Option<String>,
}

/// Operations of the authoritative conversation service
///
/// The trait is the seam between the sync engine and the network: the HTTP
/// client implements it for production and a fake implements it for tests.
#[async_trait]
pub trait RemoteDirectory: Send + Sync {
    /// Fetch the set of known conversation ids
    async fn conversation_ids(&self) -> Result<Vec<u64>>;

    /// Fetch the message log for one conversation
    async fn message_log(&self, conversation_id: u64) -> Result<LogPayload>;

    /// Delete a conversation
    ///
    /// Any JSON-parseable acknowledgment counts as success; network or parse
    /// failure counts as failure.
    async fn delete_conversation(&self, conversation_id: u64) -> Result<()>;

    /// Issue a chat request and return the raw response byte stream
    ///
    /// A non-2xx status is an error; the stream itself is returned only once
    /// response headers have arrived.
    async fn open_chat_stream(&self, conversation_id: u64, text: &str) -> Result<ChatByteStream>;
}

#[derive(Debug, serde::Deserialize)]
struct IdListingPayload {
    #[serde(rename = "userIds", default)]
    user_ids: Vec<u64>,
}

#[derive(Debug, serde::Deserialize)]
struct RawLogPayload {
    #[serde(default)]
    messages: Vec<serde_json::Value>,
    #[serde(default)]
    source: Option<String>,
}

/// HTTP implementation of [`RemoteDirectory`]
pub struct HttpRemote {
    client: reqwest::Client,
    base_url: Url,
    request_timeout: Duration,
}

impl HttpRemote {
    /// Create a client for the configured service
    ///
    /// The request timeout applies to the directory, log, and delete calls.
    /// The chat stream is exempt: its lifetime is bounded by the response
    /// body, not a fixed duration.
    pub fn new(config: &RemoteConfig) -> Result<Self> {
        let base_url = Url::parse(&config.base_url).map_err(|e| {
            ChatSyncError::Remote(format!("Invalid base URL {}: {}", config.base_url, e))
        })?;
        let client = reqwest::Client::builder().build()?;

        Ok(Self {
            client,
            base_url,
            request_timeout: Duration::from_secs(config.request_timeout_seconds),
        })
    }

    fn endpoint(&self, path: &str) -> Result<Url> {
        self.base_url
            .join(path)
            .map_err(|e| ChatSyncError::Remote(format!("Invalid endpoint {}: {}", path, e)).into())
    }
}

#[async_trait]
impl RemoteDirectory for HttpRemote {
    async fn conversation_ids(&self) -> Result<Vec<u64>> {
        let url = self.endpoint("api/users")?;
        let response = self
            .client
            .get(url)
            .timeout(self.request_timeout)
            .send()
            .await?;

        let status = response.status();
        if !status.is_success() {
            return Err(ChatSyncError::Remote(format!(
                "conversation listing returned HTTP {}",
                status
            ))
            .into());
        }

        let payload: IdListingPayload = response.json().await?;
        Ok(payload.user_ids)
    }

    async fn message_log(&self, conversation_id: u64) -> Result<LogPayload> {
        let url = self.endpoint("api/messages")?;
        let response = self
            .client
            .get(url)
            .query(&[("userId", conversation_id)])
            .timeout(self.request_timeout)
            .send()
            .await?;

        let status = response.status();
        if !status.is_success() {
            return Err(ChatSyncError::Remote(format!(
                "log fetch for conversation {} returned HTTP {}",
                conversation_id, status
            ))
            .into());
        }

        let raw: RawLogPayload = response.json().await?;
        let total = raw.messages.len();
        let mut messages = Vec::with_capacity(total);
        for value in raw.messages {
            match serde_json::from_value::<Message>(value) {
                Ok(message) => messages.push(message),
                Err(e) => {
                    tracing::warn!(
                        conversation_id,
                        "quarantined malformed message entry: {}",
                        e
                    );
                }
            }
        }
        if messages.len() < total {
            tracing::warn!(
                conversation_id,
                "dropped {} of {} log entries",
                total - messages.len(),
                total
            );
        }

        Ok(LogPayload {
            messages,
            source: raw.source,
        })
    }

    async fn delete_conversation(&self, conversation_id: u64) -> Result<()> {
        let url = self.endpoint(&format!("api/users/{}", conversation_id))?;
        let response = self
            .client
            .delete(url)
            .timeout(self.request_timeout)
            .send()
            .await?;

        // The acknowledgment body is not schema-validated: any JSON the
        // backend returns counts as success, regardless of shape or status.
        let ack: serde_json::Value = response.json().await?;
        tracing::debug!(conversation_id, "delete acknowledged: {}", ack);
        Ok(())
    }

    async fn open_chat_stream(&self, conversation_id: u64, text: &str) -> Result<ChatByteStream> {
        let url = self.endpoint("ai/memoryId_stream_chat")?;
        let conversation_id = conversation_id.to_string();
        let response = self
            .client
            .get(url)
            .query(&[("message", text), ("userId", conversation_id.as_str())])
            .send()
            .await?;

        let status = response.status();
        if !status.is_success() {
            return Err(ChatSyncError::Stream(format!(
                "chat request returned HTTP {}",
                status
            ))
            .into());
        }

        let stream = response
            .bytes_stream()
            .map(|item| item.map_err(|e| ChatSyncError::Http(e).into()));
        Ok(Box::pin(stream))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::Role;

    fn test_remote(base: &str) -> HttpRemote {
        HttpRemote::new(&RemoteConfig {
            base_url: base.to_string(),
            request_timeout_seconds: 5,
        })
        .expect("failed to build remote")
    }

    #[test]
    fn test_new_rejects_invalid_base_url() {
        let result = HttpRemote::new(&RemoteConfig {
            base_url: "not a url".to_string(),
            request_timeout_seconds: 5,
        });
        assert!(result.is_err());
    }

    #[test]
    fn test_endpoint_joins_relative_paths() {
        let remote = test_remote("http://localhost:8080");
        let url = remote.endpoint("api/users").unwrap();
        assert_eq!(url.as_str(), "http://localhost:8080/api/users");
    }

    #[test]
    fn test_endpoint_preserves_base_path() {
        let remote = test_remote("http://localhost:8080/app/");
        let url = remote.endpoint("api/users").unwrap();
        assert_eq!(url.as_str(), "http://localhost:8080/app/api/users");
    }

    #[test]
    fn test_id_listing_payload_shape() {
        let payload: IdListingPayload =
            serde_json::from_str(r#"{"userIds": [1, 2, 9]}"#).unwrap();
        assert_eq!(payload.user_ids, vec![1, 2, 9]);
    }

    #[test]
    fn test_id_listing_payload_missing_field_defaults_empty() {
        let payload: IdListingPayload = serde_json::from_str("{}").unwrap();
        assert!(payload.user_ids.is_empty());
    }

    #[test]
    fn test_raw_log_payload_shape() {
        let payload: RawLogPayload = serde_json::from_str(
            r#"{"messages": [{"role": "user", "content": "hi", "timestamp": 1}], "source": "redis"}"#,
        )
        .unwrap();
        assert_eq!(payload.messages.len(), 1);
        assert_eq!(payload.source.as_deref(), Some("redis"));

        let message: Message = serde_json::from_value(payload.messages[0].clone()).unwrap();
        assert_eq!(message.role, Role::User);
        assert_eq!(message.content, "hi");
    }
}
