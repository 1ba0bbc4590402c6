//! Interactive chat mode handler.
//!
//! Instantiates the cache, remote client, and session controller, then runs
//! a readline-based interactive loop. Plain input is sent as a chat message;
//! slash commands drive conversation lifecycle transitions.

use std::sync::Arc;

use colored::Colorize;
use rustyline::error::ReadlineError;
use rustyline::DefaultEditor;

use crate::commands::open_cache;
use crate::config::Config;
use crate::error::Result;
use crate::filter::ExclusionFilter;
use crate::lifecycle::SessionController;
use crate::remote::{HttpRemote, RemoteDirectory};
use crate::render::TerminalRenderer;
use crate::state::AppState;
use crate::types::{ConversationSummary, DEFAULT_CONVERSATION_ID};

/// Slash commands recognized in the interactive loop
#[derive(Debug, Clone, PartialEq, Eq)]
enum ChatCommand {
    /// Show the conversation list
    List,
    /// Create a new conversation and switch to it
    New,
    /// Switch to another conversation
    Switch(u64),
    /// Delete a conversation
    Delete(u64),
    /// Show command help
    Help,
    /// Leave the chat loop
    Exit,
    /// A slash command that could not be parsed
    Invalid(String),
    /// Ordinary chat input
    Message,
}

fn parse_command(input: &str) -> ChatCommand {
    if !input.starts_with('/') {
        if input.eq_ignore_ascii_case("exit") || input.eq_ignore_ascii_case("quit") {
            return ChatCommand::Exit;
        }
        return ChatCommand::Message;
    }

    let mut parts = input.split_whitespace();
    let head = parts.next().unwrap_or("");
    let arg = parts.next();

    match head {
        "/list" => ChatCommand::List,
        "/new" => ChatCommand::New,
        "/switch" => match arg.and_then(|a| a.parse().ok()) {
            Some(id) => ChatCommand::Switch(id),
            None => ChatCommand::Invalid("usage: /switch <conversation-id>".to_string()),
        },
        "/delete" => match arg.and_then(|a| a.parse().ok()) {
            Some(id) => ChatCommand::Delete(id),
            None => ChatCommand::Invalid("usage: /delete <conversation-id>".to_string()),
        },
        "/help" => ChatCommand::Help,
        "/exit" | "/quit" => ChatCommand::Exit,
        other => ChatCommand::Invalid(format!("unknown command: {}", other)),
    }
}

/// Start interactive chat mode
///
/// # Arguments
///
/// * `config` - Global configuration (consumed)
/// * `conversation` - Conversation id to open; defaults to conversation 1
pub async fn run_chat(config: Config, conversation: Option<u64>) -> Result<()> {
    let cache = open_cache(&config)?;
    let remote: Arc<dyn RemoteDirectory> = Arc::new(HttpRemote::new(&config.remote)?);
    let filter = ExclusionFilter::new(config.filter.boilerplate_signatures.clone());
    let controller = SessionController::new(remote, cache, filter);

    let mut state = AppState::new(conversation.unwrap_or(DEFAULT_CONVERSATION_ID));
    let mut sink = TerminalRenderer::new();

    print_welcome_banner();
    controller.initialize(&mut state, &mut sink).await;
    print_index(&state.index, state.active_id);

    let mut rl = DefaultEditor::new()?;

    loop {
        let prompt = format!("[chat {}] >> ", state.active_id);
        match rl.readline(&prompt) {
            Ok(line) => {
                let trimmed = line.trim();
                if trimmed.is_empty() {
                    continue;
                }
                rl.add_history_entry(trimmed)?;

                match parse_command(trimmed) {
                    ChatCommand::List => print_index(&state.index, state.active_id),
                    ChatCommand::New => {
                        if controller.start_new(&mut state, &mut sink).await.is_none() {
                            println!("{}", "A response is still in flight.".yellow());
                        }
                    }
                    ChatCommand::Switch(id) => {
                        controller.switch_to(&mut state, id, &mut sink).await;
                    }
                    ChatCommand::Delete(id) => {
                        controller
                            .delete(&mut state, id, confirm_delete, &mut sink)
                            .await;
                    }
                    ChatCommand::Help => print_help(),
                    ChatCommand::Exit => break,
                    ChatCommand::Invalid(reason) => println!("{}", reason.yellow()),
                    ChatCommand::Message => {
                        controller.send(&mut state, trimmed, &mut sink).await;
                    }
                }
            }
            Err(ReadlineError::Interrupted) => {
                println!("CTRL-C");
                break;
            }
            Err(ReadlineError::Eof) => {
                println!("CTRL-D");
                break;
            }
            Err(err) => {
                tracing::error!("Readline error: {:?}", err);
                break;
            }
        }
    }

    println!("Goodbye!");
    Ok(())
}

/// Ask the user to confirm a deletion on stdin
fn confirm_delete(summary: &ConversationSummary) -> bool {
    println!(
        "Delete \"{}\" (conversation {})? This cannot be undone. [y/N]",
        summary.title, summary.id
    );
    let mut answer = String::new();
    if std::io::stdin().read_line(&mut answer).is_err() {
        return false;
    }
    matches!(answer.trim(), "y" | "Y" | "yes" | "YES")
}

fn print_welcome_banner() {
    println!("\n╔══════════════════════════════════════════════════════════════╗");
    println!("║              ChatSync Interactive Chat - Welcome!            ║");
    println!("╚══════════════════════════════════════════════════════════════╝\n");
    println!("Type '/help' for available commands, 'exit' to quit\n");
}

fn print_help() {
    println!("\nAvailable commands:");
    println!("  /list           Show the conversation list");
    println!("  /new            Start a new conversation");
    println!("  /switch <id>    Switch to another conversation");
    println!("  /delete <id>    Delete a conversation");
    println!("  /help           Show this help");
    println!("  /exit           Quit\n");
}

fn print_index(index: &[ConversationSummary], active_id: u64) {
    println!();
    for summary in index {
        let marker = if summary.id == active_id { "*" } else { " " };
        let line = format!(
            "{} [{}] {} — {}",
            marker, summary.id, summary.title, summary.last_message_preview
        );
        if summary.id == active_id {
            println!("{}", line.green());
        } else {
            println!("{}", line);
        }
    }
    println!();
}
