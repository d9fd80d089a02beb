//! Speech pipeline for voice sessions
//!
//! Components:
//! - Streaming speech-to-text over Deepgram's live WebSocket API
//! - Streaming text-to-speech over ElevenLabs' HTTP streaming API
//!
//! Both implement the core `SpeechToText` / `TextToSpeech` traits so voice
//! sessions can swap them for other providers or mocks.

pub mod stt;
pub mod tts;

pub use stt::{DeepgramConfig, DeepgramStt};
pub use tts::{ElevenLabsConfig, ElevenLabsTts};

use thiserror::Error;

/// Pipeline errors
#[derive(Error, Debug)]
pub enum PipelineError {
    #[error("STT error: {0}")]
    Stt(String),

    #[error("TTS error: {0}")]
    Tts(String),

    #[error("Connection error: {0}")]
    Connection(String),

    #[error("Configuration error: {0}")]
    Configuration(String),

    #[error("Invalid provider message: {0}")]
    Protocol(String),
}

impl From<PipelineError> for realty_agent_core::Error {
    fn from(err: PipelineError) -> Self {
        realty_agent_core::Error::Speech(err.to_string())
    }
}
