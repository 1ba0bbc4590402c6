//! Boilerplate message exclusion
//!
//! Older backend deployments leaked their system prompt into stored message
//! logs as greeting blurbs. Those messages, along with all system-role
//! messages, must never surface to the user or be written back into local
//! history. The signature phrases are configurable; the defaults match the
//! blurbs known from legacy deployments.

use crate::types::{Message, Role};

/// Default greeting signature: a message is boilerplate when it contains
/// every phrase of the set.
const DEFAULT_GREETING_SIGNATURE: [&str; 2] =
    ["福州旅游规划小助手", "AI 驱动的本地旅游问答系统"];

/// Default signature sets, used when no configuration overrides them
pub fn default_signatures() -> Vec<Vec<String>> {
    vec![DEFAULT_GREETING_SIGNATURE
        .iter()
        .map(|s| s.to_string())
        .collect()]
}

/// Predicate deciding which messages are excluded from display and history
///
/// A message is excluded when its role is [`Role::System`], or when its
/// content contains every phrase of any configured signature set.
#[derive(Debug, Clone)]
pub struct ExclusionFilter {
    signatures: Vec<Vec<String>>,
}

impl Default for ExclusionFilter {
    fn default() -> Self {
        Self {
            signatures: default_signatures(),
        }
    }
}

impl ExclusionFilter {
    /// Creates a filter with explicit signature sets
    ///
    /// Empty sets are discarded: an empty signature would match every
    /// message.
    pub fn new(signatures: Vec<Vec<String>>) -> Self {
        Self {
            signatures: signatures.into_iter().filter(|s| !s.is_empty()).collect(),
        }
    }

    /// True when the message must not be surfaced or persisted
    ///
    /// # Examples
    ///
    /// ```
    /// use chatsync::filter::ExclusionFilter;
    /// use chatsync::types::Message;
    ///
    /// let filter = ExclusionFilter::default();
    /// assert!(filter.excludes(&Message::system("prompt")));
    /// assert!(!filter.excludes(&Message::user("hello")));
    /// ```
    pub fn excludes(&self, message: &Message) -> bool {
        if message.role == Role::System {
            return true;
        }
        self.signatures
            .iter()
            .any(|set| set.iter().all(|phrase| message.content.contains(phrase)))
    }

    /// Drops excluded messages, preserving order of the rest
    pub fn retain(&self, messages: Vec<Message>) -> Vec<Message> {
        messages
            .into_iter()
            .filter(|m| !self.excludes(m))
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn boilerplate_content() -> String {
        format!(
            "{} — {}",
            DEFAULT_GREETING_SIGNATURE[0], DEFAULT_GREETING_SIGNATURE[1]
        )
    }

    #[test]
    fn test_system_role_is_excluded() {
        let filter = ExclusionFilter::default();
        assert!(filter.excludes(&Message::system("anything")));
    }

    #[test]
    fn test_default_signature_requires_all_phrases() {
        let filter = ExclusionFilter::default();

        // Both phrases present: excluded
        assert!(filter.excludes(&Message::assistant(boilerplate_content())));

        // A single phrase is not enough
        assert!(!filter.excludes(&Message::assistant(DEFAULT_GREETING_SIGNATURE[0])));
        assert!(!filter.excludes(&Message::assistant(DEFAULT_GREETING_SIGNATURE[1])));
    }

    #[test]
    fn test_ordinary_messages_pass() {
        let filter = ExclusionFilter::default();
        assert!(!filter.excludes(&Message::user("what is the weather?")));
        assert!(!filter.excludes(&Message::assistant("sunny today")));
    }

    #[test]
    fn test_custom_signature_sets() {
        let filter = ExclusionFilter::new(vec![vec![
            "internal use".to_string(),
            "do not display".to_string(),
        ]]);

        assert!(filter.excludes(&Message::assistant(
            "internal use only — do not display this"
        )));
        assert!(!filter.excludes(&Message::assistant("internal use only")));
        // Custom configuration replaces the default set
        assert!(!filter.excludes(&Message::assistant(boilerplate_content())));
    }

    #[test]
    fn test_empty_signature_sets_are_discarded() {
        let filter = ExclusionFilter::new(vec![vec![]]);
        assert!(!filter.excludes(&Message::assistant("any content at all")));
    }

    #[test]
    fn test_retain_preserves_order() {
        let filter = ExclusionFilter::default();
        let messages = vec![
            Message::user("first"),
            Message::system("hidden"),
            Message::assistant("second"),
            Message::assistant(boilerplate_content()),
            Message::user("third"),
        ];

        let kept = filter.retain(messages);
        let contents: Vec<&str> = kept.iter().map(|m| m.content.as_str()).collect();
        assert_eq!(contents, vec!["first", "second", "third"]);
    }
}
