//! ChatSync - local-first conversation sync and streaming ingestion library
//!
//! This library keeps a user's multi-conversation chat history reconciled
//! against an authoritative remote service while remaining usable when that
//! service is unreachable.
//!
//! # Architecture
//!
//! The library is organized into the following modules:
//!
//! - `reconcile`: merging the remote directory with the local cache into one
//!   ordered conversation index
//! - `stream`: chat request issuing and chunked response ingestion
//! - `lifecycle`: conversation creation, switching, and deletion
//! - `cache`: embedded key-value persistence of the index and message logs
//! - `remote`: the remote directory client and its HTTP implementation
//! - `config`: configuration management and validation
//! - `error`: error types and result aliases
//! - `cli`: command-line interface definition
//!
//! # Example
//!
//! ```no_run
//! use std::sync::Arc;
//! use chatsync::{AppState, CacheStore, ExclusionFilter, SessionController};
//! use chatsync::remote::{HttpRemote, RemoteDirectory};
//! use chatsync::render::TerminalRenderer;
//! use chatsync::config::Config;
//!
//! # async fn example() -> anyhow::Result<()> {
//! let config = Config::default();
//! let cache = CacheStore::open_default()?;
//! let remote: Arc<dyn RemoteDirectory> = Arc::new(HttpRemote::new(&config.remote)?);
//! let controller = SessionController::new(remote, cache, ExclusionFilter::default());
//!
//! let mut state = AppState::new(1);
//! let mut sink = TerminalRenderer::new();
//! controller.initialize(&mut state, &mut sink).await;
//! # Ok(())
//! # }
//! ```

pub mod cache;
pub mod cli;
pub mod commands;
pub mod config;
pub mod error;
pub mod filter;
pub mod lifecycle;
pub mod reconcile;
pub mod remote;
pub mod render;
pub mod state;
pub mod stream;
pub mod types;

// Re-export commonly used types
pub use cache::CacheStore;
pub use config::Config;
pub use error::{ChatSyncError, Result};
pub use filter::ExclusionFilter;
pub use lifecycle::SessionController;
pub use reconcile::Reconciler;
pub use state::{AppState, SessionState};
pub use stream::{SendOutcome, StreamEngine, Utf8Decoder};
pub use types::{ConversationSummary, Message, Role};

#[cfg(test)]
pub mod test_utils;
