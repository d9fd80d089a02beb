//! Shared error type used by the core traits

use thiserror::Error;

/// Errors surfaced through the core traits.
///
/// Each crate owns a richer error enum and converts into this one at the
/// trait boundary.
#[derive(Error, Debug)]
pub enum Error {
    #[error("LLM error: {0}")]
    Llm(String),

    #[error("Retrieval error: {0}")]
    Rag(String),

    #[error("Speech error: {0}")]
    Speech(String),

    #[error("Invalid input: {0}")]
    InvalidInput(String),

    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),
}

pub type Result<T> = std::result::Result<T, Error>;
