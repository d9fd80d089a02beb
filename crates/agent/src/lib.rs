//! Conversational agent for real-estate queries
//!
//! Features:
//! - Retrieval-augmented response pipeline (language, context, prompt,
//!   generation, reply extraction)
//! - Chat sessions with bounded, serialized conversation history
//! - Voice sessions bridging streaming STT and TTS around the pipeline
//! - `Responder` trait abstraction for testability

pub mod pipeline;
pub mod session;
pub mod traits;
pub mod voice_session;

pub use pipeline::RealtyAgent;
pub use session::ChatSession;
pub use traits::Responder;
pub use voice_session::{
    ListenerAction, ListenerInput, ListenerPhase, UtterancePhase, VoiceSession,
    VoiceSessionConfig, VoiceSessionEvent,
};

use thiserror::Error;

/// Agent errors
#[derive(Error, Debug)]
pub enum AgentError {
    #[error("Conversation error: {0}")]
    Conversation(String),

    #[error("LLM error: {0}")]
    Llm(String),

    #[error("Retrieval error: {0}")]
    Retrieval(String),

    #[error("Speech error: {0}")]
    Speech(String),

    #[error("Pipeline error: {0}")]
    Pipeline(String),
}

impl AgentError {
    /// Whether the failure came from an external service rather than the
    /// caller's input
    pub fn is_upstream(&self) -> bool {
        matches!(self, Self::Llm(_) | Self::Retrieval(_) | Self::Speech(_))
    }
}

impl From<realty_agent_llm::LlmError> for AgentError {
    fn from(err: realty_agent_llm::LlmError) -> Self {
        AgentError::Llm(err.to_string())
    }
}

impl From<realty_agent_rag::RagError> for AgentError {
    fn from(err: realty_agent_rag::RagError) -> Self {
        AgentError::Retrieval(err.to_string())
    }
}

impl From<realty_agent_core::Error> for AgentError {
    fn from(err: realty_agent_core::Error) -> Self {
        use realty_agent_core::Error;
        match err {
            Error::Llm(msg) => AgentError::Llm(msg),
            Error::Rag(msg) => AgentError::Retrieval(msg),
            Error::Speech(msg) => AgentError::Speech(msg),
            Error::InvalidInput(msg) => AgentError::Conversation(msg),
            other => AgentError::Pipeline(other.to_string()),
        }
    }
}
