//! History command handlers
//!
//! Lists the locally cached conversation index and deletes conversations
//! outside of an interactive session. Deletion mirrors the lifecycle rule:
//! local removal is authoritative, the remote delete is best effort.

use chrono::DateTime;
use colored::Colorize;
use prettytable::{format, Table};

use crate::cli::HistoryCommand;
use crate::commands::open_cache;
use crate::config::Config;
use crate::error::Result;
use crate::remote::{HttpRemote, RemoteDirectory};

/// Handle history commands
pub async fn handle_history(config: Config, command: HistoryCommand) -> Result<()> {
    let cache = open_cache(&config)?;

    match command {
        HistoryCommand::List => {
            let index = cache.load_index()?.unwrap_or_default();

            if index.is_empty() {
                println!("{}", "No cached conversation history found.".yellow());
                return Ok(());
            }

            let mut table = Table::new();
            table.set_format(*format::consts::FORMAT_BORDERS_ONLY);

            table.add_row(prettytable::row![
                "ID".bold(),
                "Title".bold(),
                "Preview".bold(),
                "Last Updated".bold()
            ]);

            for summary in index {
                let preview = if summary.last_message_preview.chars().count() > 40 {
                    let truncated: String =
                        summary.last_message_preview.chars().take(37).collect();
                    format!("{}...", truncated)
                } else {
                    summary.last_message_preview
                };
                let updated = DateTime::from_timestamp_millis(summary.updated_at)
                    .map(|dt| dt.format("%Y-%m-%d %H:%M").to_string())
                    .unwrap_or_else(|| "-".to_string());

                table.add_row(prettytable::row![
                    summary.id.to_string().cyan(),
                    summary.title,
                    preview,
                    updated
                ]);
            }

            println!("\nCached Conversations:");
            table.printstd();
            println!();
            println!(
                "Use {} to open a conversation.",
                "chatsync chat --conversation <ID>".cyan()
            );
            println!();
        }
        HistoryCommand::Delete { id } => {
            // Best effort on the remote side; local removal is what counts.
            match HttpRemote::new(&config.remote) {
                Ok(remote) => {
                    if let Err(e) = remote.delete_conversation(id).await {
                        tracing::warn!(conversation_id = id, "remote delete failed: {}", e);
                    }
                }
                Err(e) => tracing::warn!("remote client unavailable: {}", e),
            }

            let mut index = cache.load_index()?.unwrap_or_default();
            let before = index.len();
            index.retain(|s| s.id != id);
            cache.save_index(&index)?;
            cache.purge_log(id)?;

            if index.len() < before {
                println!("{}", format!("Deleted conversation {}", id).green());
            } else {
                println!(
                    "{}",
                    format!("Conversation {} was not in the cached index", id).yellow()
                );
            }
        }
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::{ConversationSummary, Message};
    use tempfile::tempdir;

    fn config_with_cache(dir: &std::path::Path) -> Config {
        let mut config = Config::default();
        config.cache.path = Some(dir.join("cache").to_string_lossy().to_string());
        // Point at a closed port so remote calls fail fast
        config.remote.base_url = "http://127.0.0.1:9".to_string();
        config.remote.request_timeout_seconds = 1;
        config
    }

    #[tokio::test]
    async fn test_history_list_empty_cache() {
        let dir = tempdir().unwrap();
        let config = config_with_cache(dir.path());
        assert!(handle_history(config, HistoryCommand::List).await.is_ok());
    }

    #[tokio::test]
    async fn test_history_delete_removes_local_state() {
        let dir = tempdir().unwrap();
        let config = config_with_cache(dir.path());

        {
            // Scoped so the sled lock is released before the handler opens
            // the same cache.
            let cache = open_cache(&config).unwrap();
            cache
                .save_index(&[
                    ConversationSummary::new(1, "a", 10),
                    ConversationSummary::new(2, "b", 20),
                ])
                .unwrap();
            cache.save_log(1, &[Message::user("bye")]).unwrap();
        }

        handle_history(config.clone(), HistoryCommand::Delete { id: 1 })
            .await
            .expect("delete failed");

        let cache = open_cache(&config).unwrap();
        let index = cache.load_index().unwrap().unwrap();
        assert_eq!(index.len(), 1);
        assert_eq!(index[0].id, 2);
        assert!(cache.load_log(1).unwrap().is_none());
    }

    #[tokio::test]
    async fn test_history_delete_unknown_id_is_harmless() {
        let dir = tempdir().unwrap();
        let config = config_with_cache(dir.path());

        handle_history(config, HistoryCommand::Delete { id: 99 })
            .await
            .expect("delete failed");
    }
}
