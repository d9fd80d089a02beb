//! Voice Session Handler
//!
//! Bridges a live audio stream to the response pipeline.
//!
//! ```text
//! ┌─────────────┐     ┌─────────────┐     ┌─────────────┐     ┌─────────────┐
//! │  Inbound    │────▶│     STT     │────▶│ Utterance   │────▶│     TTS     │
//! │  audio      │     │ (streaming) │     │ tasks       │     │ (streaming) │
//! └─────────────┘     └─────────────┘     └─────────────┘     └─────────────┘
//!                                                                    │
//!                          Outbound audio ◀──────────────────────────┘
//! ```
//!
//! The listener side is a small state machine (`ListenerPhase`) driven by
//! transcript events. Every non-empty final transcript is dispatched as an
//! independent utterance task; several may be in flight at once and none is
//! cancelled. Replies take turns on the outbound channel so their audio never
//! interleaves.

use futures::StreamExt;
use parking_lot::Mutex;
use serde::{Deserialize, Serialize};
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;
use tokio::sync::{broadcast, mpsc};
use tokio::task::{JoinError, JoinSet};
use tokio_stream::wrappers::ReceiverStream;

use realty_agent_config::TtsConfig;
use realty_agent_core::{
    AudioFrame, AudioStream, PipelineResult, ResponseMode, SpeechToText, TextToSpeech,
    TranscriptEvent, VoiceConfig,
};

use crate::session::ChatSession;
use crate::AgentError;

/// Voice session configuration
#[derive(Debug, Clone)]
pub struct VoiceSessionConfig {
    /// Base synthesis parameters; the language is taken from each reply
    pub voice: VoiceConfig,
    /// Inbound frames buffered between the forwarder and STT
    pub forward_buffer: usize,
    /// Broadcast capacity for session events
    pub event_capacity: usize,
}

impl Default for VoiceSessionConfig {
    fn default() -> Self {
        Self {
            voice: VoiceConfig::default(),
            forward_buffer: 64,
            event_capacity: 256,
        }
    }
}

impl VoiceSessionConfig {
    pub fn from_settings(tts: &TtsConfig) -> Self {
        Self {
            voice: VoiceConfig::default().with_speed(tts.speed),
            ..Self::default()
        }
    }
}

/// Listener phase for one participant
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ListenerPhase {
    /// Not started
    Idle,
    /// Audio flowing, no partial transcript pending
    Streaming,
    /// A partial transcript is pending
    Transcribing,
    /// STT stream closed
    Ended,
}

/// What the listener reacts to
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ListenerInput {
    Start,
    Interim,
    Final(String),
    Closed,
}

/// What the session should do after a transition
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ListenerAction {
    Continue,
    /// Run the pipeline for this utterance
    Dispatch(String),
    /// Input ignored (empty final, or transcript before start)
    Discard,
}

impl ListenerPhase {
    /// Pure transition function
    pub fn on(self, input: ListenerInput) -> (ListenerPhase, ListenerAction) {
        use ListenerPhase::*;

        match (self, input) {
            (Ended, _) => (Ended, ListenerAction::Continue),
            (_, ListenerInput::Closed) => (Ended, ListenerAction::Continue),
            (Idle, ListenerInput::Start) => (Streaming, ListenerAction::Continue),
            (Idle, _) => (Idle, ListenerAction::Discard),
            (phase, ListenerInput::Start) => (phase, ListenerAction::Continue),
            (_, ListenerInput::Interim) => (Transcribing, ListenerAction::Continue),
            (phase, ListenerInput::Final(text)) => {
                let text = text.trim();
                if text.is_empty() {
                    (phase, ListenerAction::Discard)
                } else {
                    (Streaming, ListenerAction::Dispatch(text.to_string()))
                }
            },
        }
    }
}

/// Lifecycle of one dispatched utterance
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum UtterancePhase {
    /// History update and pipeline run
    Dispatching,
    /// Reply audio streaming out
    Speaking,
    Completed,
    Failed,
}

/// Voice session events
#[derive(Debug, Clone)]
pub enum VoiceSessionEvent {
    Started { session_id: String },
    ListenerChanged { old: ListenerPhase, new: ListenerPhase },
    Transcript { text: String, is_final: bool },
    Utterance { utterance_id: u64, phase: UtterancePhase },
    Response { utterance_id: u64, result: PipelineResult },
    /// `utterance_id` is `None` for session-level failures
    Error { utterance_id: Option<u64>, message: String },
    Ended { session_id: String },
}

/// Voice session for one participant
pub struct VoiceSession {
    chat: Arc<ChatSession>,
    stt: Arc<dyn SpeechToText>,
    tts: Arc<dyn TextToSpeech>,
    config: VoiceSessionConfig,
    phase: Mutex<ListenerPhase>,
    event_tx: broadcast::Sender<VoiceSessionEvent>,
    next_utterance: AtomicU64,
}

impl VoiceSession {
    /// Voice session answering into `chat`'s history
    pub fn new(
        chat: Arc<ChatSession>,
        stt: Arc<dyn SpeechToText>,
        tts: Arc<dyn TextToSpeech>,
        config: VoiceSessionConfig,
    ) -> Self {
        let (event_tx, _) = broadcast::channel(config.event_capacity.max(1));
        Self {
            chat,
            stt,
            tts,
            config,
            phase: Mutex::new(ListenerPhase::Idle),
            event_tx,
            next_utterance: AtomicU64::new(0),
        }
    }

    pub fn session_id(&self) -> &str {
        self.chat.id()
    }

    pub fn phase(&self) -> ListenerPhase {
        *self.phase.lock()
    }

    pub fn subscribe(&self) -> broadcast::Receiver<VoiceSessionEvent> {
        self.event_tx.subscribe()
    }

    /// Run the session until the inbound audio ends and STT has flushed.
    ///
    /// Returns once every dispatched utterance has finished. Reply audio is
    /// written to `audio_out`; a closed `audio_out` silences replies but does
    /// not stop the session.
    pub async fn run(
        &self,
        audio_in: mpsc::Receiver<AudioFrame>,
        audio_out: mpsc::Sender<AudioFrame>,
    ) -> Result<(), AgentError> {
        let current = self.phase();
        if current != ListenerPhase::Idle {
            return Err(AgentError::Conversation(format!(
                "Voice session cannot start from {:?}",
                current
            )));
        }

        self.apply(ListenerInput::Start);
        self.emit(VoiceSessionEvent::Started {
            session_id: self.session_id().to_string(),
        });
        tracing::info!(
            session_id = %self.session_id(),
            stt = self.stt.model_name(),
            tts = self.tts.model_name(),
            "Voice session started"
        );

        let (stt_tx, stt_rx) = mpsc::channel(self.config.forward_buffer.max(1));
        let forwarder = tokio::spawn(forward_audio(audio_in, stt_tx));
        let audio: AudioStream = Box::pin(ReceiverStream::new(stt_rx));
        let mut transcripts = self.stt.transcribe_stream(audio);

        let speaker = Arc::new(tokio::sync::Mutex::new(()));
        let mut in_flight: JoinSet<UtterancePhase> = JoinSet::new();
        let mut outcome = Ok(());

        loop {
            tokio::select! {
                Some(joined) = in_flight.join_next(), if !in_flight.is_empty() => {
                    self.log_joined(joined);
                }
                event = transcripts.next() => match event {
                    Some(Ok(event)) => {
                        self.on_transcript(event, &mut in_flight, &speaker, &audio_out);
                    }
                    Some(Err(e)) => {
                        tracing::error!(session_id = %self.session_id(), error = %e, "STT stream failed");
                        metrics::counter!("realty_agent_errors_total", "kind" => "stt").increment(1);
                        self.emit(VoiceSessionEvent::Error {
                            utterance_id: None,
                            message: e.to_string(),
                        });
                        outcome = Err(e.into());
                        break;
                    }
                    None => break,
                },
            }
        }

        forwarder.abort();
        while let Some(joined) = in_flight.join_next().await {
            self.log_joined(joined);
        }

        self.apply(ListenerInput::Closed);
        self.emit(VoiceSessionEvent::Ended {
            session_id: self.session_id().to_string(),
        });
        tracing::info!(
            session_id = %self.session_id(),
            utterances = self.next_utterance.load(Ordering::Relaxed),
            "Voice session ended"
        );

        outcome
    }

    fn on_transcript(
        &self,
        event: TranscriptEvent,
        in_flight: &mut JoinSet<UtterancePhase>,
        speaker: &Arc<tokio::sync::Mutex<()>>,
        audio_out: &mpsc::Sender<AudioFrame>,
    ) {
        if !event.is_blank() {
            self.emit(VoiceSessionEvent::Transcript {
                text: event.text.clone(),
                is_final: event.is_final,
            });
        }

        let input = if event.is_final {
            ListenerInput::Final(event.text)
        } else {
            ListenerInput::Interim
        };

        match self.apply(input) {
            ListenerAction::Dispatch(text) => {
                let utterance_id = self.next_utterance.fetch_add(1, Ordering::Relaxed) + 1;
                metrics::counter!("realty_agent_utterances_dispatched_total").increment(1);
                tracing::info!(
                    session_id = %self.session_id(),
                    utterance_id,
                    chars = text.len(),
                    "Utterance dispatched"
                );

                let utterance = Utterance {
                    id: utterance_id,
                    text,
                    chat: Arc::clone(&self.chat),
                    tts: Arc::clone(&self.tts),
                    voice: self.config.voice.clone(),
                    speaker: Arc::clone(speaker),
                    audio_out: audio_out.clone(),
                    event_tx: self.event_tx.clone(),
                };
                in_flight.spawn(utterance.run());
            },
            ListenerAction::Discard => {
                tracing::debug!(session_id = %self.session_id(), "Transcript discarded");
            },
            ListenerAction::Continue => {},
        }
    }

    fn apply(&self, input: ListenerInput) -> ListenerAction {
        let (old, new, action) = {
            let mut phase = self.phase.lock();
            let old = *phase;
            let (new, action) = old.on(input);
            *phase = new;
            (old, new, action)
        };

        if old != new {
            tracing::debug!(session_id = %self.session_id(), ?old, ?new, "Listener phase changed");
            self.emit(VoiceSessionEvent::ListenerChanged { old, new });
        }
        action
    }

    fn emit(&self, event: VoiceSessionEvent) {
        // no subscribers is fine
        let _ = self.event_tx.send(event);
    }

    fn log_joined(&self, joined: Result<UtterancePhase, JoinError>) {
        match joined {
            Ok(phase) => {
                tracing::debug!(session_id = %self.session_id(), ?phase, "Utterance finished");
            },
            Err(e) => {
                tracing::error!(session_id = %self.session_id(), error = %e, "Utterance task aborted");
            },
        }
    }
}

async fn forward_audio(mut inbound: mpsc::Receiver<AudioFrame>, stt: mpsc::Sender<AudioFrame>) {
    let mut frames: u64 = 0;
    while let Some(frame) = inbound.recv().await {
        if stt.send(frame).await.is_err() {
            break;
        }
        frames += 1;
    }
    tracing::debug!(frames, "Audio forwarding finished");
}

/// One finalized utterance, run as its own task
struct Utterance {
    id: u64,
    text: String,
    chat: Arc<ChatSession>,
    tts: Arc<dyn TextToSpeech>,
    voice: VoiceConfig,
    speaker: Arc<tokio::sync::Mutex<()>>,
    audio_out: mpsc::Sender<AudioFrame>,
    event_tx: broadcast::Sender<VoiceSessionEvent>,
}

impl Utterance {
    async fn run(self) -> UtterancePhase {
        self.enter(UtterancePhase::Dispatching);

        let result = match self.chat.ask(&self.text, ResponseMode::Voice).await {
            Ok(result) => result,
            Err(e) => return self.fail(e.to_string()),
        };
        let _ = self.event_tx.send(VoiceSessionEvent::Response {
            utterance_id: self.id,
            result: result.clone(),
        });

        let voice = VoiceConfig {
            language: result.language,
            ..self.voice.clone()
        };

        // one reply on the outbound channel at a time
        let _speaker = self.speaker.lock().await;
        self.enter(UtterancePhase::Speaking);

        let mut audio = self.tts.synthesize_stream(&result.text, &voice);
        let mut frames = 0usize;
        while let Some(frame) = audio.next().await {
            match frame {
                Ok(frame) => {
                    if self.audio_out.send(frame).await.is_err() {
                        tracing::debug!(utterance_id = self.id, "Audio output closed");
                        break;
                    }
                    frames += 1;
                },
                Err(e) => return self.fail(e.to_string()),
            }
        }

        tracing::debug!(utterance_id = self.id, frames, "Reply spoken");
        self.enter(UtterancePhase::Completed)
    }

    fn enter(&self, phase: UtterancePhase) -> UtterancePhase {
        let _ = self.event_tx.send(VoiceSessionEvent::Utterance {
            utterance_id: self.id,
            phase,
        });
        phase
    }

    fn fail(&self, message: String) -> UtterancePhase {
        tracing::warn!(utterance_id = self.id, error = %message, "Utterance failed");
        metrics::counter!("realty_agent_errors_total", "kind" => "utterance").increment(1);
        let _ = self.event_tx.send(VoiceSessionEvent::Error {
            utterance_id: Some(self.id),
            message,
        });
        self.enter(UtterancePhase::Failed)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_start_moves_idle_to_streaming() {
        assert_eq!(
            ListenerPhase::Idle.on(ListenerInput::Start),
            (ListenerPhase::Streaming, ListenerAction::Continue)
        );
        assert_eq!(
            ListenerPhase::Idle.on(ListenerInput::Final("hi".into())),
            (ListenerPhase::Idle, ListenerAction::Discard)
        );
    }

    #[test]
    fn test_interim_then_final_dispatches() {
        let (phase, _) = ListenerPhase::Streaming.on(ListenerInput::Interim);
        assert_eq!(phase, ListenerPhase::Transcribing);

        let (phase, action) = phase.on(ListenerInput::Final("  villas in Goa ".into()));
        assert_eq!(phase, ListenerPhase::Streaming);
        assert_eq!(action, ListenerAction::Dispatch("villas in Goa".to_string()));
    }

    #[test]
    fn test_empty_final_changes_nothing() {
        assert_eq!(
            ListenerPhase::Transcribing.on(ListenerInput::Final("   ".into())),
            (ListenerPhase::Transcribing, ListenerAction::Discard)
        );
        assert_eq!(
            ListenerPhase::Streaming.on(ListenerInput::Final(String::new())),
            (ListenerPhase::Streaming, ListenerAction::Discard)
        );
    }

    #[test]
    fn test_closed_is_terminal() {
        for phase in [
            ListenerPhase::Idle,
            ListenerPhase::Streaming,
            ListenerPhase::Transcribing,
        ] {
            assert_eq!(phase.on(ListenerInput::Closed).0, ListenerPhase::Ended);
        }
        assert_eq!(
            ListenerPhase::Ended.on(ListenerInput::Final("late".into())),
            (ListenerPhase::Ended, ListenerAction::Continue)
        );
    }

    #[test]
    fn test_phases_serialize_snake_case() {
        assert_eq!(
            serde_json::to_string(&UtterancePhase::Speaking).unwrap(),
            "\"speaking\""
        );
        assert_eq!(
            serde_json::to_string(&ListenerPhase::Transcribing).unwrap(),
            "\"transcribing\""
        );
    }

    #[test]
    fn test_config_from_settings_uses_tts_speed() {
        let config = VoiceSessionConfig::from_settings(&TtsConfig::default());
        assert!((config.voice.speed - 0.8).abs() < f32::EPSILON);
        assert!(config.voice.voice_id.is_none());
    }
}
