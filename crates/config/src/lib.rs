//! Configuration management for the real-estate agent
//!
//! Supports loading configuration from:
//! - YAML/TOML files under `config/` (`default`, then the environment name)
//! - Environment variables (`REALTY_AGENT__` prefix, `__` between keys)
//! - Provider credential variables (`OPENAI_API_KEY`, `DEEPGRAM_API_KEY`,
//!   `ELEVENLABS_API_KEY`, `QDRANT_API_KEY`) as field defaults

pub mod constants;
pub mod settings;

pub use settings::{
    load_settings, load_settings_from, ConversationConfig, LlmConfig, ObservabilityConfig,
    RagConfig, RuntimeEnvironment, ServerConfig, Settings, SpeechConfig, SttConfig, TtsConfig,
};

use thiserror::Error;

#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("Configuration file not found: {0}")]
    FileNotFound(String),

    #[error("Failed to parse configuration: {0}")]
    ParseError(String),

    #[error("Missing required field: {0}")]
    MissingField(String),

    #[error("Invalid value for {field}: {message}")]
    InvalidValue { field: String, message: String },
}

impl From<config::ConfigError> for ConfigError {
    fn from(err: config::ConfigError) -> Self {
        ConfigError::ParseError(err.to_string())
    }
}
