//! Prompt text sent to the model.

use shared::Conversation;

pub fn explanation_prompt(text: &str, language: &str) -> String {
    format!(
        "Please explain this text in very simple, easy-to-understand language. \
         Make it short and clear, like you're explaining to a friend who doesn't know much about this topic. \
         Text: \"{text}\". IMPORTANT: Please respond in {language} language. \
         Keep your explanation: Short and simple (3-4 sentences max), use everyday words, not technical terms, \
         make it conversational and friendly, focus on the main point only, and write in {language} language."
    )
}

/// System instruction restating what the chat is about, so every follow-up
/// request stands on its own.
pub fn follow_up_system_prompt(conversation: &Conversation, language: &str) -> String {
    format!(
        "You are a helpful AI assistant. The user originally asked about this text: \"{}\". \
         You previously explained it as: \"{}\". Now continue the conversation naturally. \
         Always respond in {language} language and keep responses concise and helpful.",
        conversation.source_text(),
        conversation.original_explanation().unwrap_or_default(),
    )
}

pub fn key_check_prompt(language: &str) -> String {
    format!(
        "Explain what 2+2 equals like I'm 5 years old, with simple words. \
         Please respond in {language} language."
    )
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_explanation_prompt_embeds_text_and_language() {
        let prompt = explanation_prompt("Photosynthesis converts light into energy", "English");
        assert!(prompt.contains("Text: \"Photosynthesis converts light into energy\""));
        assert!(prompt.contains("respond in English language"));
        assert!(prompt.contains("3-4 sentences max"));
    }

    #[test]
    fn test_follow_up_prompt_restates_context() {
        let mut conv = Conversation::start("Photosynthesis converts light into energy");
        conv.set_explanation("Plants eat sunlight to grow!");
        let prompt = follow_up_system_prompt(&conv, "French");
        assert!(prompt.contains("\"Photosynthesis converts light into energy\""));
        assert!(prompt.contains("\"Plants eat sunlight to grow!\""));
        assert!(prompt.contains("respond in French language"));
    }
}
