//! Agent traits for abstraction and testability

use async_trait::async_trait;

use realty_agent_core::{ConversationTurn, PipelineResult, ResponseMode};

use crate::AgentError;

/// Produces the structured reply for a conversation.
///
/// Implementations are stateless with respect to the conversation: the
/// caller owns the history and passes a snapshot whose last user turn is the
/// utterance to answer.
///
/// # Example
///
/// ```ignore
/// struct EchoResponder;
///
/// #[async_trait]
/// impl Responder for EchoResponder {
///     async fn respond(
///         &self,
///         history: &[ConversationTurn],
///         _mode: ResponseMode,
///     ) -> Result<PipelineResult, AgentError> {
///         let text = history.last().map(|t| t.content.clone()).unwrap_or_default();
///         Ok(PipelineResult { text, image_urls: vec![], language: Language::English })
///     }
///
///     fn name(&self) -> &str {
///         "echo"
///     }
/// }
/// ```
#[async_trait]
pub trait Responder: Send + Sync {
    /// Answer the latest user turn in `history`
    async fn respond(
        &self,
        history: &[ConversationTurn],
        mode: ResponseMode,
    ) -> Result<PipelineResult, AgentError>;

    /// Name for logging
    fn name(&self) -> &str;
}
