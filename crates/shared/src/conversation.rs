//! Per-popup conversation state: the selected text, the first explanation
//! and the follow-up transcript.

use serde::{Deserialize, Serialize};

use crate::agent_api::ChatMessage;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TurnRole {
    User,
    Assistant,
}

/// One chat message in the follow-up transcript.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Turn {
    pub role: TurnRole,
    pub content: String,
}

impl From<&Turn> for ChatMessage {
    fn from(turn: &Turn) -> Self {
        match turn.role {
            TurnRole::User => ChatMessage::user(turn.content.clone()),
            TurnRole::Assistant => ChatMessage::assistant(turn.content.clone()),
        }
    }
}

/// Conversation owned by the active popup.
///
/// Turns are append-only; a new gesture builds a fresh value with
/// [`Conversation::start`] instead of editing the old one.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Conversation {
    source_text: String,
    original_explanation: Option<String>,
    turns: Vec<Turn>,
}

impl Conversation {
    pub fn start(source_text: impl Into<String>) -> Self {
        Self {
            source_text: source_text.into(),
            original_explanation: None,
            turns: Vec::new(),
        }
    }

    pub fn source_text(&self) -> &str {
        &self.source_text
    }

    pub fn original_explanation(&self) -> Option<&str> {
        self.original_explanation.as_deref()
    }

    pub fn turns(&self) -> &[Turn] {
        &self.turns
    }

    pub fn set_explanation(&mut self, explanation: impl Into<String>) {
        self.original_explanation = Some(explanation.into());
    }

    pub fn push_user(&mut self, content: impl Into<String>) {
        self.push(TurnRole::User, content.into());
    }

    pub fn push_assistant(&mut self, content: impl Into<String>) {
        self.push(TurnRole::Assistant, content.into());
    }

    fn push(&mut self, role: TurnRole, content: String) {
        self.turns.push(Turn { role, content });
    }

    /// Turns as wire messages, oldest first.
    pub fn transcript(&self) -> impl Iterator<Item = ChatMessage> + '_ {
        self.turns.iter().map(ChatMessage::from)
    }
}

/// Trimmed follow-up text, or `None` when there is nothing to send.
pub fn validate_follow_up(input: &str) -> Option<&str> {
    let trimmed = input.trim();
    (!trimmed.is_empty()).then_some(trimmed)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::agent_api::Role;

    #[test]
    fn test_start_resets_everything() {
        let conv = Conversation::start("Photosynthesis converts light into energy");
        assert_eq!(conv.source_text(), "Photosynthesis converts light into energy");
        assert!(conv.original_explanation().is_none());
        assert!(conv.turns().is_empty());
    }

    #[test]
    fn test_turns_keep_append_order() {
        let mut conv = Conversation::start("text");
        conv.set_explanation("simple");
        conv.push_user("why?");
        conv.push_assistant("because");
        conv.push_user("and then?");

        let roles: Vec<_> = conv.transcript().map(|m| m.role).collect();
        assert_eq!(roles, vec![Role::User, Role::Assistant, Role::User]);
        assert_eq!(conv.turns()[1].content, "because");
    }

    #[test]
    fn test_validate_follow_up() {
        assert_eq!(validate_follow_up("   "), None);
        assert_eq!(validate_follow_up(""), None);
        assert_eq!(validate_follow_up("  why? \n"), Some("why?"));
    }
}
