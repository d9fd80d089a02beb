//! Transcription events produced by a streaming recognizer

use serde::{Deserialize, Serialize};

/// One recognizer update
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TranscriptEvent {
    pub text: String,
    /// Final transcripts are never revised; interim ones may be
    pub is_final: bool,
    #[serde(default)]
    pub confidence: f32,
    /// Language reported by the recognizer, if any
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub language: Option<String>,
}

impl TranscriptEvent {
    pub fn interim(text: impl Into<String>) -> Self {
        Self {
            text: text.into(),
            is_final: false,
            confidence: 0.0,
            language: None,
        }
    }

    pub fn final_text(text: impl Into<String>) -> Self {
        Self {
            is_final: true,
            ..Self::interim(text)
        }
    }

    /// True when the transcript carries no words
    pub fn is_blank(&self) -> bool {
        self.text.trim().is_empty()
    }
}
