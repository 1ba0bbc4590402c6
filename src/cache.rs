//! Local cache store
//!
//! Key-value persistence of the conversation index and per-conversation
//! message logs, backed by an embedded `sled` database. The cache is the
//! degraded substitute for the remote store: it is written as a backup after
//! every reconciliation and read back whenever the remote is unreachable.
//!
//! Keys: one fixed key for the full index, one key per conversation id for
//! its message log. Values are JSON-serialized arrays matching the shapes in
//! [`crate::types`], so cached data round-trips without loss.

use crate::error::{ChatSyncError, Result};
use crate::types::{ConversationSummary, Message};
use anyhow::Context;
use directories::ProjectDirs;
use sled::Db;
use std::path::{Path, PathBuf};

/// Key under which the full conversation index is stored
const INDEX_KEY: &str = "conversation_index";

/// Key for a conversation's message log
fn log_key(conversation_id: u64) -> String {
    format!("messages/{}", conversation_id)
}

/// Storage backend for the conversation index and message logs
#[derive(Clone)]
pub struct CacheStore {
    db: Db,
}

impl CacheStore {
    /// Open the cache in the user's data directory
    ///
    /// The location can be overridden via the `CHATSYNC_CACHE_DIR`
    /// environment variable, which makes it easy to point the binary at a
    /// test cache or alternate directory without changing the user's
    /// application data dir.
    pub fn open_default() -> Result<Self> {
        if let Ok(override_path) = std::env::var("CHATSYNC_CACHE_DIR") {
            return Self::open(override_path);
        }

        let proj_dirs = ProjectDirs::from("io", "chatsync", "chatsync")
            .ok_or_else(|| ChatSyncError::Storage("Could not determine data directory".into()))?;

        let cache_dir = proj_dirs.data_dir().join("cache");
        Self::open(cache_dir)
    }

    /// Open the cache at the specified directory
    ///
    /// This is primarily useful for tests where the default application data
    /// directory is not desirable (for example, using a temporary directory).
    ///
    /// # Examples
    ///
    /// ```no_run
    /// use chatsync::cache::CacheStore;
    ///
    /// let cache = CacheStore::open("/tmp/chatsync-cache").unwrap();
    /// ```
    pub fn open<P: AsRef<Path>>(path: P) -> Result<Self> {
        let path: PathBuf = path.as_ref().into();

        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)
                .context("Failed to create parent directory for cache")
                .map_err(|e| ChatSyncError::Storage(e.to_string()))?;
        }

        let db = sled::open(&path)
            .map_err(|e| ChatSyncError::Storage(format!("Failed to open cache: {}", e)))?;
        Ok(Self { db })
    }

    /// Load the cached conversation index, if one has been persisted
    pub fn load_index(&self) -> Result<Option<Vec<ConversationSummary>>> {
        self.get_json(INDEX_KEY.as_bytes())
    }

    /// Persist the full conversation index
    pub fn save_index(&self, index: &[ConversationSummary]) -> Result<()> {
        self.put_json(INDEX_KEY.as_bytes(), index)
    }

    /// Load a conversation's cached message log, if one has been persisted
    pub fn load_log(&self, conversation_id: u64) -> Result<Option<Vec<Message>>> {
        self.get_json(log_key(conversation_id).as_bytes())
    }

    /// Persist a conversation's message log
    pub fn save_log(&self, conversation_id: u64, messages: &[Message]) -> Result<()> {
        self.put_json(log_key(conversation_id).as_bytes(), messages)
    }

    /// Remove a conversation's cached message log
    ///
    /// Removing a log that was never stored is not an error.
    pub fn purge_log(&self, conversation_id: u64) -> Result<()> {
        self.db
            .remove(log_key(conversation_id).as_bytes())
            .map_err(|e| ChatSyncError::Storage(format!("Remove failed: {}", e)))?;
        self.db
            .flush()
            .map_err(|e| ChatSyncError::Storage(format!("Flush failed: {}", e)))?;
        Ok(())
    }

    fn get_json<T: serde::de::DeserializeOwned>(&self, key: &[u8]) -> Result<Option<T>> {
        match self
            .db
            .get(key)
            .map_err(|e| ChatSyncError::Storage(format!("Get failed: {}", e)))?
        {
            Some(bytes) => {
                let value = serde_json::from_slice(&bytes)
                    .map_err(|e| ChatSyncError::Storage(format!("Deserialization failed: {}", e)))?;
                Ok(Some(value))
            }
            None => Ok(None),
        }
    }

    fn put_json<T: serde::Serialize + ?Sized>(&self, key: &[u8], value: &T) -> Result<()> {
        let bytes = serde_json::to_vec(value)
            .map_err(|e| ChatSyncError::Storage(format!("Serialization failed: {}", e)))?;
        self.db
            .insert(key, bytes)
            .map_err(|e| ChatSyncError::Storage(format!("Insert failed: {}", e)))?;
        self.db
            .flush()
            .map_err(|e| ChatSyncError::Storage(format!("Flush failed: {}", e)))?;
        Ok(())
    }
}
