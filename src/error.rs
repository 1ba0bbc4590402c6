//! Error types for ChatSync
//!
//! This module defines all error types used throughout the application,
//! using `thiserror` for ergonomic error handling.

use thiserror::Error;

/// Main error type for ChatSync operations
///
/// This enum encompasses all possible errors that can occur during
/// configuration loading, remote directory access, stream ingestion,
/// and cache persistence.
#[derive(Error, Debug)]
pub enum ChatSyncError {
    /// Configuration-related errors
    #[error("Configuration error: {0}")]
    Config(String),

    /// Remote directory errors (listing, log fetch, delete)
    #[error("Remote error: {0}")]
    Remote(String),

    /// Chat stream errors (request rejected, read failure mid-stream)
    #[error("Stream error: {0}")]
    Stream(String),

    /// Conversation cache errors (database operations)
    #[error("Storage error: {0}")]
    Storage(String),

    /// IO errors
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// JSON serialization/deserialization errors
    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    /// YAML parsing errors
    #[error("YAML error: {0}")]
    Yaml(#[from] serde_yaml::Error),

    /// HTTP request errors
    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),
}

/// Result type alias for ChatSync operations
///
/// This is a convenience alias that uses `anyhow::Error` as the error type,
/// allowing for rich error context and easy error propagation.
pub type Result<T> = anyhow::Result<T>;
