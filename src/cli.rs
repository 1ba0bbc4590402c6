//! Command-line interface definition for ChatSync
//!
//! This module defines the CLI structure using clap's derive API,
//! providing commands for interactive chat and history management.

use clap::{Parser, Subcommand};

/// ChatSync - local-first conversation sync and streaming chat client
///
/// Keeps multi-conversation chat history reconciled against a remote
/// service, falling back to a local cache when the service is unreachable.
#[derive(Parser, Debug, Clone)]
#[command(name = "chatsync")]
#[command(version, about, long_about = None)]
pub struct Cli {
    /// Path to configuration file
    #[arg(short, long, default_value = "config/config.yaml")]
    pub config: Option<String>,

    /// Override the remote service base URL from config
    #[arg(long)]
    pub base_url: Option<String>,

    /// Override the local cache directory from config
    #[arg(long)]
    pub cache_dir: Option<String>,

    /// Command to execute
    #[command(subcommand)]
    pub command: Commands,
}

/// Available commands for ChatSync
#[derive(Subcommand, Debug, Clone)]
pub enum Commands {
    /// Start interactive chat mode
    Chat {
        /// Conversation id to open (defaults to conversation 1)
        ///
        /// Plays the role of the address bar: switching or creating
        /// conversations re-targets this selection in-process.
        #[arg(short = 'n', long)]
        conversation: Option<u64>,
    },

    /// Inspect or prune locally cached conversation history
    History {
        /// History subcommand
        #[command(subcommand)]
        command: HistoryCommand,
    },
}

/// History management subcommands
#[derive(Subcommand, Debug, Clone)]
pub enum HistoryCommand {
    /// List cached conversations
    List,

    /// Delete a conversation locally and (best effort) remotely
    Delete {
        /// Conversation id to delete
        id: u64,
    },
}

impl Cli {
    /// Parse command line arguments
    pub fn parse_args() -> Self {
        Self::parse()
    }
}
