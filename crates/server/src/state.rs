//! Application State
//!
//! Shared state across all handlers.

use metrics_exporter_prometheus::PrometheusHandle;
use std::sync::Arc;

use realty_agent_agent::{Responder, VoiceSessionConfig};
use realty_agent_config::Settings;
use realty_agent_core::{SpeechToText, TextToSpeech};
use realty_agent_llm::LlmBackend;

use crate::session::SessionManager;

/// Streaming speech providers, present only when both are configured
#[derive(Clone)]
pub struct SpeechServices {
    pub stt: Arc<dyn SpeechToText>,
    pub tts: Arc<dyn TextToSpeech>,
}

/// Application state
#[derive(Clone)]
pub struct AppState {
    pub config: Arc<Settings>,
    pub sessions: Arc<SessionManager>,
    /// Answers stateless chat requests; sessions hold their own handle
    pub responder: Arc<dyn Responder>,
    pub speech: Option<SpeechServices>,
    /// Probed by `/ready`
    pub llm: Option<Arc<dyn LlmBackend>>,
    pub metrics: Option<PrometheusHandle>,
}

impl AppState {
    pub fn new(config: Settings, responder: Arc<dyn Responder>) -> Self {
        let sessions = Arc::new(SessionManager::new(
            responder.clone(),
            config.server.max_sessions,
            config.conversation.max_history_turns,
        ));
        Self {
            config: Arc::new(config),
            sessions,
            responder,
            speech: None,
            llm: None,
            metrics: None,
        }
    }

    pub fn with_speech(mut self, speech: Option<SpeechServices>) -> Self {
        self.speech = speech;
        self
    }

    pub fn with_llm(mut self, llm: Arc<dyn LlmBackend>) -> Self {
        self.llm = Some(llm);
        self
    }

    pub fn with_metrics(mut self, handle: Option<PrometheusHandle>) -> Self {
        self.metrics = handle;
        self
    }

    pub fn voice_enabled(&self) -> bool {
        self.speech.is_some()
    }

    pub fn voice_config(&self) -> VoiceSessionConfig {
        VoiceSessionConfig::from_settings(&self.config.speech.tts)
    }
}
