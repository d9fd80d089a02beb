//! Core traits and types for the real-estate agent
//!
//! This crate provides foundational types used across all other crates:
//! - Conversation turns and the shared per-session history
//! - Retrieved documents and image references
//! - Reply languages and the pipeline result
//! - Audio frames and transcript events
//! - Traits for pluggable retrieval and speech backends
//! - Error types

pub mod audio;
pub mod conversation;
pub mod document;
pub mod error;
pub mod language;
pub mod result;
pub mod traits;
pub mod transcript;
pub mod voice_config;

pub use audio::{AudioEncoding, AudioFrame};
pub use conversation::{latest_user_message, ConversationHistory, ConversationTurn, TurnRole};
pub use document::{
    DocumentMetadata, ImageReference, ImageSource, RetrievedDocument, PROJECT_DOC_TYPE,
};
pub use error::{Error, Result};
pub use language::Language;
pub use result::{PipelineResult, ResponseMode};
pub use traits::{
    AudioStream, RetrieveOptions, Retriever, SpeechToText, TextToSpeech, TranscriptStream,
};
pub use transcript::TranscriptEvent;
pub use voice_config::VoiceConfig;
