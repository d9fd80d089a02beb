//! Main reply generation

use std::sync::Arc;

use realty_agent_core::ConversationTurn;

use crate::backend::LlmBackend;
use crate::prompt::Message;
use crate::LlmError;

/// Sends prior turns plus the composed prompt to the chat model
#[derive(Clone)]
pub struct ResponseGenerator {
    backend: Arc<dyn LlmBackend>,
}

impl ResponseGenerator {
    pub fn new(backend: Arc<dyn LlmBackend>) -> Self {
        Self { backend }
    }

    pub fn model_name(&self) -> &str {
        self.backend.model_name()
    }

    /// History as role-tagged messages in order, then the prompt as the
    /// final user message
    pub fn build_messages(history: &[ConversationTurn], prompt: &str) -> Vec<Message> {
        let mut messages: Vec<Message> = history.iter().map(Message::from).collect();
        messages.push(Message::user(prompt));
        messages
    }

    /// One chat round; returns the model text with surrounding whitespace removed
    pub async fn generate(
        &self,
        history: &[ConversationTurn],
        prompt: &str,
    ) -> Result<String, LlmError> {
        let messages = Self::build_messages(history, prompt);
        let result = self.backend.generate(&messages).await?;

        tracing::debug!(
            model = self.backend.model_name(),
            messages = messages.len(),
            tokens = result.tokens,
            total_time_ms = result.total_time_ms,
            finish_reason = ?result.finish_reason,
            "Reply generated"
        );

        Ok(result.text.trim().to_string())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::prompt::Role;

    #[test]
    fn test_build_messages_appends_prompt_last() {
        let history = vec![
            ConversationTurn::user("Any sea-facing flats?"),
            ConversationTurn::assistant("Two in Worli."),
            ConversationTurn::user("Prices?"),
        ];
        let messages = ResponseGenerator::build_messages(&history, "PROMPT");

        assert_eq!(messages.len(), 4);
        assert_eq!(messages[0].role, Role::User);
        assert_eq!(messages[1].role, Role::Assistant);
        assert_eq!(messages[1].content, "Two in Worli.");
        assert_eq!(messages[3], Message::user("PROMPT"));
    }

    #[test]
    fn test_build_messages_with_empty_history() {
        let messages = ResponseGenerator::build_messages(&[], "PROMPT");
        assert_eq!(messages, vec![Message::user("PROMPT")]);
    }
}
