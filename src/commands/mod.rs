/*!
Command handlers for the CLI

This module provides the handlers invoked by the CLI entrypoint:

- `chat`    — Interactive chat mode
- `history` — Cached history listing and deletion

The handlers are intentionally small and drive the library components:
the cache store, the remote client, and the session controller.
*/

use crate::cache::CacheStore;
use crate::config::Config;
use crate::error::Result;

pub mod chat;
pub mod history;

/// Open the cache at the configured location, or the platform default
pub(crate) fn open_cache(config: &Config) -> Result<CacheStore> {
    match &config.cache.path {
        Some(path) => CacheStore::open(path),
        None => CacheStore::open_default(),
    }
}
