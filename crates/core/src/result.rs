//! Pipeline output

use crate::Language;
use serde::{Deserialize, Serialize};

/// Whether the reply will be read or spoken
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum ResponseMode {
    #[default]
    Text,
    Voice,
}

impl ResponseMode {
    pub fn from_voice_flag(voice_mode: bool) -> Self {
        if voice_mode {
            Self::Voice
        } else {
            Self::Text
        }
    }

    pub fn is_voice(&self) -> bool {
        matches!(self, Self::Voice)
    }
}

/// Structured reply for one turn
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PipelineResult {
    pub text: String,
    pub image_urls: Vec<String>,
    pub language: Language,
}
