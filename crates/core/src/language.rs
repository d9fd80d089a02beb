//! Reply languages
//!
//! The agent answers in English, Hindi or Tamil. Anything the detector
//! cannot place is treated as Hindi, which is the audience's native default.

use serde::{Deserialize, Serialize};
use std::fmt;

/// Languages the agent replies in
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
pub enum Language {
    #[serde(rename = "en")]
    English,
    #[default]
    #[serde(rename = "hi")]
    Hindi,
    #[serde(rename = "ta")]
    Tamil,
}

impl Language {
    pub const ALL: [Language; 3] = [Language::English, Language::Hindi, Language::Tamil];

    /// ISO 639-1 code
    pub fn code(&self) -> &'static str {
        match self {
            Self::English => "en",
            Self::Hindi => "hi",
            Self::Tamil => "ta",
        }
    }

    /// Human-readable name
    pub fn name(&self) -> &'static str {
        match self {
            Self::English => "English",
            Self::Hindi => "Hindi",
            Self::Tamil => "Tamil",
        }
    }

    /// Map a free-form language name (as returned by the classifier) to a
    /// language. Unknown labels fall back to Hindi.
    pub fn from_label(label: &str) -> Self {
        match label.trim().to_lowercase().as_str() {
            "english" => Self::English,
            "hindi" => Self::Hindi,
            "tamil" => Self::Tamil,
            _ => Self::Hindi,
        }
    }

    /// Whether replies should use the mixed Hindi/English register
    pub fn prefers_code_mixing(&self) -> bool {
        matches!(self, Self::Hindi)
    }
}

impl fmt::Display for Language {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.code())
    }
}
