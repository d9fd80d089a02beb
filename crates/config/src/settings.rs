//! Main settings module

use config::{Config, Environment, File};
use serde::{Deserialize, Serialize};
use std::path::Path;

use crate::constants::{conversation, endpoints, env_keys, llm, rag, speech};
use crate::ConfigError;

/// Runtime environment
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum RuntimeEnvironment {
    #[default]
    Development,
    Staging,
    Production,
}

impl RuntimeEnvironment {
    /// Missing provider credentials are fatal in strict environments
    pub fn is_strict(&self) -> bool {
        matches!(self, Self::Production | Self::Staging)
    }
}

/// Main application settings
#[derive(Debug, Clone, Serialize, Deserialize, Default)]
pub struct Settings {
    #[serde(default)]
    pub environment: RuntimeEnvironment,

    #[serde(default)]
    pub server: ServerConfig,

    /// Chat model used for detection and replies
    #[serde(default)]
    pub llm: LlmConfig,

    /// Embeddings and vector index
    #[serde(default)]
    pub rag: RagConfig,

    #[serde(default)]
    pub speech: SpeechConfig,

    #[serde(default)]
    pub conversation: ConversationConfig,

    #[serde(default)]
    pub observability: ObservabilityConfig,
}

fn env_or_empty(key: &str) -> String {
    std::env::var(key).unwrap_or_default()
}

fn default_true() -> bool {
    true
}

/// HTTP / WebSocket server configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ServerConfig {
    #[serde(default = "default_host")]
    pub host: String,

    #[serde(default = "default_port")]
    pub port: u16,

    /// Maximum concurrent sessions
    #[serde(default = "default_max_sessions")]
    pub max_sessions: usize,

    /// Request timeout in seconds
    #[serde(default = "default_timeout")]
    pub timeout_seconds: u64,

    #[serde(default = "default_true")]
    pub cors_enabled: bool,

    /// CORS allowed origins; empty allows any origin
    #[serde(default)]
    pub cors_origins: Vec<String>,
}

fn default_host() -> String {
    "0.0.0.0".to_string()
}
fn default_port() -> u16 {
    8080
}
fn default_max_sessions() -> usize {
    100
}
fn default_timeout() -> u64 {
    120
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            host: default_host(),
            port: default_port(),
            max_sessions: default_max_sessions(),
            timeout_seconds: default_timeout(),
            cors_enabled: true,
            cors_origins: Vec::new(),
        }
    }
}

/// Chat-completion configuration (OpenAI-compatible)
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LlmConfig {
    #[serde(default = "default_openai_endpoint")]
    pub endpoint: String,

    /// Falls back to `OPENAI_API_KEY`
    #[serde(default = "default_openai_api_key")]
    pub api_key: String,

    #[serde(default = "default_llm_model")]
    pub model: String,

    #[serde(default = "default_temperature")]
    pub temperature: f32,

    #[serde(default = "default_max_tokens")]
    pub max_tokens: u32,

    #[serde(default = "default_llm_timeout")]
    pub timeout_secs: u64,

    /// Send one tiny request at startup so the first real turn is not cold
    #[serde(default = "default_true")]
    pub warmup_enabled: bool,

    #[serde(default = "default_warmup_model")]
    pub warmup_model: String,
}

fn default_openai_endpoint() -> String {
    endpoints::OPENAI_API.to_string()
}
fn default_openai_api_key() -> String {
    env_or_empty(env_keys::OPENAI_API_KEY)
}
fn default_llm_model() -> String {
    llm::MODEL.to_string()
}
fn default_temperature() -> f32 {
    llm::TEMPERATURE
}
fn default_max_tokens() -> u32 {
    llm::MAX_TOKENS
}
fn default_llm_timeout() -> u64 {
    llm::TIMEOUT_SECS
}
fn default_warmup_model() -> String {
    llm::WARMUP_MODEL.to_string()
}

impl Default for LlmConfig {
    fn default() -> Self {
        Self {
            endpoint: default_openai_endpoint(),
            api_key: default_openai_api_key(),
            model: default_llm_model(),
            temperature: default_temperature(),
            max_tokens: default_max_tokens(),
            timeout_secs: default_llm_timeout(),
            warmup_enabled: true,
            warmup_model: default_warmup_model(),
        }
    }
}

/// Retrieval configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RagConfig {
    #[serde(default = "default_qdrant_endpoint")]
    pub qdrant_endpoint: String,

    #[serde(default = "default_collection")]
    pub collection: String,

    /// Falls back to `QDRANT_API_KEY`; empty means no auth
    #[serde(default = "default_qdrant_api_key")]
    pub qdrant_api_key: String,

    /// Embedding endpoint; defaults to the chat endpoint's host
    #[serde(default = "default_openai_endpoint")]
    pub embedding_endpoint: String,

    #[serde(default = "default_embedding_model")]
    pub embedding_model: String,

    #[serde(default = "default_vector_dim")]
    pub vector_dim: usize,

    /// Documents retrieved per query
    #[serde(default = "default_top_k")]
    pub top_k: usize,

    /// Directory of YAML/JSON project documents ingested at startup
    #[serde(default)]
    pub knowledge_dir: Option<String>,
}

fn default_qdrant_endpoint() -> String {
    endpoints::QDRANT.to_string()
}
fn default_collection() -> String {
    rag::COLLECTION.to_string()
}
fn default_qdrant_api_key() -> String {
    env_or_empty(env_keys::QDRANT_API_KEY)
}
fn default_embedding_model() -> String {
    rag::EMBEDDING_MODEL.to_string()
}
fn default_vector_dim() -> usize {
    rag::VECTOR_DIM
}
fn default_top_k() -> usize {
    rag::TOP_K
}

impl Default for RagConfig {
    fn default() -> Self {
        Self {
            qdrant_endpoint: default_qdrant_endpoint(),
            collection: default_collection(),
            qdrant_api_key: default_qdrant_api_key(),
            embedding_endpoint: default_openai_endpoint(),
            embedding_model: default_embedding_model(),
            vector_dim: default_vector_dim(),
            top_k: default_top_k(),
            knowledge_dir: None,
        }
    }
}

/// Speech providers
#[derive(Debug, Clone, Serialize, Deserialize, Default)]
pub struct SpeechConfig {
    #[serde(default)]
    pub stt: SttConfig,
    #[serde(default)]
    pub tts: TtsConfig,
}

impl SpeechConfig {
    /// Voice sessions need both providers
    pub fn is_configured(&self) -> bool {
        !self.stt.api_key.is_empty() && !self.tts.api_key.is_empty()
    }
}

/// Streaming speech-to-text (Deepgram)
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SttConfig {
    #[serde(default = "default_deepgram_endpoint")]
    pub endpoint: String,

    /// Falls back to `DEEPGRAM_API_KEY`
    #[serde(default = "default_deepgram_api_key")]
    pub api_key: String,

    #[serde(default = "default_stt_model")]
    pub model: String,

    /// `multi` enables code-switching recognition
    #[serde(default = "default_stt_language")]
    pub language: String,

    /// Sample rate of inbound linear16 audio
    #[serde(default = "default_input_sample_rate")]
    pub sample_rate: u32,

    #[serde(default = "default_true")]
    pub interim_results: bool,

    #[serde(default = "default_true")]
    pub punctuate: bool,

    #[serde(default = "default_true")]
    pub filler_words: bool,

    #[serde(default = "default_true")]
    pub profanity_filter: bool,

    #[serde(default = "default_true")]
    pub numerals: bool,
}

fn default_deepgram_endpoint() -> String {
    endpoints::DEEPGRAM_LISTEN.to_string()
}
fn default_deepgram_api_key() -> String {
    env_or_empty(env_keys::DEEPGRAM_API_KEY)
}
fn default_stt_model() -> String {
    speech::STT_MODEL.to_string()
}
fn default_stt_language() -> String {
    speech::STT_LANGUAGE.to_string()
}
fn default_input_sample_rate() -> u32 {
    speech::INPUT_SAMPLE_RATE
}

impl Default for SttConfig {
    fn default() -> Self {
        Self {
            endpoint: default_deepgram_endpoint(),
            api_key: default_deepgram_api_key(),
            model: default_stt_model(),
            language: default_stt_language(),
            sample_rate: default_input_sample_rate(),
            interim_results: true,
            punctuate: true,
            filler_words: true,
            profanity_filter: true,
            numerals: true,
        }
    }
}

/// Streaming text-to-speech (ElevenLabs)
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TtsConfig {
    #[serde(default = "default_elevenlabs_endpoint")]
    pub endpoint: String,

    /// Falls back to `ELEVENLABS_API_KEY`
    #[serde(default = "default_elevenlabs_api_key")]
    pub api_key: String,

    #[serde(default = "default_voice_id")]
    pub voice_id: String,

    #[serde(default = "default_tts_model")]
    pub model: String,

    /// Provider output format, e.g. `pcm_16000` or `mp3_44100_128`
    #[serde(default = "default_output_format")]
    pub output_format: String,

    #[serde(default = "default_tts_speed")]
    pub speed: f32,
}

fn default_elevenlabs_endpoint() -> String {
    endpoints::ELEVENLABS_API.to_string()
}
fn default_elevenlabs_api_key() -> String {
    env_or_empty(env_keys::ELEVENLABS_API_KEY)
}
fn default_voice_id() -> String {
    speech::TTS_VOICE_ID.to_string()
}
fn default_tts_model() -> String {
    speech::TTS_MODEL.to_string()
}
fn default_output_format() -> String {
    speech::TTS_OUTPUT_FORMAT.to_string()
}
fn default_tts_speed() -> f32 {
    speech::TTS_SPEED
}

impl Default for TtsConfig {
    fn default() -> Self {
        Self {
            endpoint: default_elevenlabs_endpoint(),
            api_key: default_elevenlabs_api_key(),
            voice_id: default_voice_id(),
            model: default_tts_model(),
            output_format: default_output_format(),
            speed: default_tts_speed(),
        }
    }
}

/// Conversation memory
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ConversationConfig {
    /// Sliding window of turns kept per session (0 = unbounded)
    #[serde(default = "default_max_history_turns")]
    pub max_history_turns: usize,

    /// Idle sessions are dropped after this many seconds
    #[serde(default = "default_session_timeout")]
    pub session_timeout_secs: u64,
}

fn default_max_history_turns() -> usize {
    conversation::MAX_HISTORY_TURNS
}
fn default_session_timeout() -> u64 {
    conversation::SESSION_TIMEOUT_SECS
}

impl Default for ConversationConfig {
    fn default() -> Self {
        Self {
            max_history_turns: default_max_history_turns(),
            session_timeout_secs: default_session_timeout(),
        }
    }
}

/// Observability configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ObservabilityConfig {
    #[serde(default = "default_log_level")]
    pub log_level: String,

    #[serde(default)]
    pub log_json: bool,

    #[serde(default = "default_true")]
    pub metrics_enabled: bool,
}

fn default_log_level() -> String {
    "info".to_string()
}

impl Default for ObservabilityConfig {
    fn default() -> Self {
        Self {
            log_level: default_log_level(),
            log_json: false,
            metrics_enabled: true,
        }
    }
}

impl Settings {
    pub fn new() -> Self {
        Self::default()
    }

    /// Validate settings
    pub fn validate(&self) -> Result<(), ConfigError> {
        self.validate_server()?;
        self.validate_llm()?;
        self.validate_rag()?;
        self.validate_speech()?;
        Ok(())
    }

    fn validate_server(&self) -> Result<(), ConfigError> {
        if self.server.port == 0 {
            return Err(invalid("server.port", "Port must be non-zero"));
        }
        if self.server.max_sessions == 0 {
            return Err(invalid("server.max_sessions", "Must allow at least one session"));
        }
        Ok(())
    }

    fn validate_llm(&self) -> Result<(), ConfigError> {
        if !(0.0..=2.0).contains(&self.llm.temperature) {
            return Err(invalid(
                "llm.temperature",
                format!("Must be between 0.0 and 2.0, got {}", self.llm.temperature),
            ));
        }
        if self.llm.model.trim().is_empty() {
            return Err(ConfigError::MissingField("llm.model".to_string()));
        }
        if self.environment.is_strict() && self.llm.api_key.is_empty() {
            return Err(ConfigError::MissingField(format!(
                "llm.api_key (or {})",
                env_keys::OPENAI_API_KEY
            )));
        }
        Ok(())
    }

    fn validate_rag(&self) -> Result<(), ConfigError> {
        if self.rag.top_k == 0 {
            return Err(invalid("rag.top_k", "Must retrieve at least one document"));
        }
        if self.rag.vector_dim == 0 {
            return Err(invalid("rag.vector_dim", "Vector dimension must be non-zero"));
        }
        Ok(())
    }

    fn validate_speech(&self) -> Result<(), ConfigError> {
        let speed = self.speech.tts.speed;
        if !(0.5..=2.0).contains(&speed) {
            return Err(invalid(
                "speech.tts.speed",
                format!("Must be between 0.5 and 2.0, got {speed}"),
            ));
        }
        if self.speech.stt.sample_rate == 0 {
            return Err(invalid("speech.stt.sample_rate", "Sample rate must be non-zero"));
        }
        Ok(())
    }
}

fn invalid(field: &str, message: impl Into<String>) -> ConfigError {
    ConfigError::InvalidValue {
        field: field.to_string(),
        message: message.into(),
    }
}

/// Load settings from `config/` relative to the working directory
pub fn load_settings(env: Option<&str>) -> Result<Settings, ConfigError> {
    load_settings_from(Path::new("config"), env)
}

/// Load settings from files under `config_dir`, then environment variables.
///
/// Later sources win: `default.*`, then `<env>.*`, then
/// `REALTY_AGENT__SECTION__KEY` variables.
pub fn load_settings_from(config_dir: &Path, env: Option<&str>) -> Result<Settings, ConfigError> {
    let mut builder = Config::builder();

    builder = builder.add_source(File::from(config_dir.join("default")).required(false));

    if let Some(env_name) = env {
        builder = builder.add_source(File::from(config_dir.join(env_name)).required(false));
    }

    builder = builder.add_source(
        Environment::with_prefix("REALTY_AGENT")
            .separator("__")
            .try_parsing(true),
    );

    let config = builder.build()?;
    let settings: Settings = config.try_deserialize()?;

    settings.validate()?;

    tracing::debug!(
        environment = ?settings.environment,
        model = %settings.llm.model,
        collection = %settings.rag.collection,
        "Settings loaded"
    );

    Ok(settings)
}
