//! Display rendering
//!
//! Two concerns live here: the presentational transform applied to message
//! content before display, and the [`RenderSink`] seam through which the
//! engine and reconciler emit incremental render updates. Persisted content
//! is always the raw text; the transform is display-only and idempotent.

use colored::Colorize;

use crate::types::{ConversationSummary, Message, Role};

/// Applies the display transform to raw message content
///
/// Newlines become `<br>` line breaks and triple-backtick fenced spans become
/// preformatted blocks. Applying the transform to already-transformed text is
/// a no-op: the first pass leaves no newline and no paired fence behind.
///
/// # Examples
///
/// ```
/// use chatsync::render::to_display;
///
/// assert_eq!(to_display("a\nb"), "a<br>b");
/// assert_eq!(to_display("```x```"), "<pre><code>x</code></pre>");
/// ```
pub fn to_display(content: &str) -> String {
    let content = content.replace('\n', "<br>");

    let mut out = String::with_capacity(content.len());
    let mut rest = content.as_str();
    while let Some(start) = rest.find("```") {
        let after_open = &rest[start + 3..];
        match after_open.find("```") {
            Some(len) if len > 0 => {
                out.push_str(&rest[..start]);
                out.push_str("<pre><code>");
                out.push_str(&after_open[..len]);
                out.push_str("</code></pre>");
                rest = &after_open[len + 3..];
            }
            // Unpaired or empty fence: left verbatim
            _ => break,
        }
    }
    out.push_str(rest);
    out
}

/// Render event sink
///
/// The engine, reconciler, and controller push updates through this trait
/// instead of writing to a display directly, so the same core drives a
/// terminal, a test recorder, or any other surface.
pub trait RenderSink {
    /// The conversation index changed (already sorted for display)
    fn index_updated(&mut self, index: &[ConversationSummary]);

    /// A complete message entered the active conversation's view
    fn message(&mut self, message: &Message, is_error: bool);

    /// A send is waiting on the first byte of the response
    fn pending(&mut self);

    /// A decoded chunk arrived; `accumulated` is the full in-progress text
    fn stream_chunk(&mut self, delta: &str, accumulated: &str);

    /// The response stream closed (successfully or not)
    fn stream_closed(&mut self);

    /// Out-of-band notice (welcome text, rejected operations)
    fn notice(&mut self, text: &str);
}

/// Terminal-backed sink used by the CLI
#[derive(Debug, Default)]
pub struct TerminalRenderer;

impl TerminalRenderer {
    pub fn new() -> Self {
        Self
    }
}

impl RenderSink for TerminalRenderer {
    fn index_updated(&mut self, index: &[ConversationSummary]) {
        tracing::debug!("conversation index updated: {} entries", index.len());
    }

    fn message(&mut self, message: &Message, is_error: bool) {
        let rendered = to_display(&message.content);
        match (message.role, is_error) {
            (_, true) => println!("{}", rendered.red()),
            (Role::User, _) => println!("{} {}", ">".bold(), rendered),
            _ => println!("{}", rendered.cyan()),
        }
    }

    fn pending(&mut self) {
        println!("{}", "...".dimmed());
    }

    fn stream_chunk(&mut self, delta: &str, _accumulated: &str) {
        use std::io::Write;
        print!("{}", delta);
        let _ = std::io::stdout().flush();
    }

    fn stream_closed(&mut self) {
        println!();
    }

    fn notice(&mut self, text: &str) {
        println!("{}", text.yellow());
    }
}
