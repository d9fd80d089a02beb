//! Synthesis voice parameters

use crate::Language;
use serde::{Deserialize, Serialize};

/// Voice parameters for one synthesis request
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct VoiceConfig {
    pub language: Language,
    /// Provider voice id; `None` uses the synthesizer's default
    pub voice_id: Option<String>,
    /// Speaking rate multiplier
    pub speed: f32,
}

impl VoiceConfig {
    pub fn new(language: Language) -> Self {
        Self {
            language,
            voice_id: None,
            speed: 1.0,
        }
    }

    pub fn with_speed(mut self, speed: f32) -> Self {
        self.speed = speed;
        self
    }
}

impl Default for VoiceConfig {
    fn default() -> Self {
        Self::new(Language::default())
    }
}
