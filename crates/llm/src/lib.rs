//! Chat-model integration for the real-estate agent
//!
//! Features:
//! - OpenAI-compatible chat backend
//! - Reply-language detection
//! - Prompt composition with conversation memory and retrieved context
//! - Tolerant extraction of the structured reply from model output

pub mod backend;
pub mod generator;
pub mod language;
pub mod prompt;
pub mod reply;

pub use backend::{
    warm_up, FinishReason, GenerationResult, LlmBackend, OpenAIBackend, OpenAIConfig,
};
pub use generator::ResponseGenerator;
pub use language::LanguageDetector;
pub use prompt::{Message, PromptComposer, PromptInputs, Role};
pub use reply::{extract_reply, first_json_object, ExtractedReply};

use thiserror::Error;

/// LLM errors
#[derive(Error, Debug)]
pub enum LlmError {
    #[error("API error: {0}")]
    Api(String),

    #[error("Network error: {0}")]
    Network(String),

    #[error("Invalid response: {0}")]
    InvalidResponse(String),

    #[error("Timeout")]
    Timeout,

    #[error("Configuration error: {0}")]
    Configuration(String),
}

impl From<reqwest::Error> for LlmError {
    fn from(err: reqwest::Error) -> Self {
        if err.is_timeout() {
            LlmError::Timeout
        } else {
            LlmError::Network(err.to_string())
        }
    }
}

impl From<LlmError> for realty_agent_core::Error {
    fn from(err: LlmError) -> Self {
        realty_agent_core::Error::Llm(err.to_string())
    }
}
