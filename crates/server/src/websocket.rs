//! WebSocket Handler
//!
//! Real-time audio streaming and conversation over one socket per session.
//! Binary frames (or base64 `audio` messages) carry linear16 audio into the
//! voice session; JSON `text` messages run a text turn.

use axum::{
    extract::{
        ws::{Message, WebSocket, WebSocketUpgrade},
        Path, State,
    },
    http::StatusCode,
    response::Response,
};
use base64::{engine::general_purpose::STANDARD as BASE64, Engine as _};
use futures::stream::SplitSink;
use futures::{SinkExt, StreamExt};
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use tokio::sync::{broadcast, mpsc, Mutex};

use realty_agent_agent::{ChatSession, UtterancePhase, VoiceSession, VoiceSessionEvent};
use realty_agent_core::{AudioFrame, Language, ResponseMode};

use crate::metrics::{record_error, record_request};
use crate::state::AppState;

const AUDIO_CHANNEL_CAPACITY: usize = 100;

/// WebSocket message types
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum WsMessage {
    /// Audio data (base64 encoded linear16)
    Audio { data: String },
    /// Text input
    Text { content: String },
    /// End session
    EndSession,
    Ping,
    Pong,
    /// Transcript update
    Transcript { text: String, is_final: bool },
    /// Agent response
    Response {
        text: String,
        image_urls: Vec<String>,
        language: Language,
    },
    /// Agent audio response (base64)
    ResponseAudio {
        data: String,
        sample_rate: u32,
        sequence: u64,
    },
    /// Utterance progress
    Utterance { utterance_id: u64, phase: UtterancePhase },
    Error { message: String },
    /// Session info
    SessionInfo { session_id: String, voice_enabled: bool },
}

impl WsMessage {
    fn from_voice_event(event: VoiceSessionEvent) -> Option<Self> {
        match event {
            VoiceSessionEvent::Transcript { text, is_final } => {
                Some(Self::Transcript { text, is_final })
            },
            VoiceSessionEvent::Response { result, .. } => Some(Self::Response {
                text: result.text,
                image_urls: result.image_urls,
                language: result.language,
            }),
            VoiceSessionEvent::Utterance { utterance_id, phase } => {
                Some(Self::Utterance { utterance_id, phase })
            },
            VoiceSessionEvent::Error { message, .. } => Some(Self::Error { message }),
            VoiceSessionEvent::Started { .. }
            | VoiceSessionEvent::ListenerChanged { .. }
            | VoiceSessionEvent::Ended { .. } => None,
        }
    }

    fn response_audio(frame: &AudioFrame) -> Self {
        Self::ResponseAudio {
            data: BASE64.encode(&frame.data),
            sample_rate: frame.sample_rate,
            sequence: frame.sequence,
        }
    }
}

type WsSender = Arc<Mutex<SplitSink<WebSocket, Message>>>;

async fn send(sender: &WsSender, msg: &WsMessage) -> bool {
    let json = match serde_json::to_string(msg) {
        Ok(json) => json,
        Err(e) => {
            tracing::error!(error = %e, "Failed to encode WebSocket message");
            return false;
        },
    };
    sender.lock().await.send(Message::Text(json)).await.is_ok()
}

/// Inbound audio plumbing for a voice-enabled socket
struct VoiceLink {
    audio_tx: mpsc::Sender<AudioFrame>,
    sample_rate: u32,
    sequence: u64,
    session_task: tokio::task::JoinHandle<()>,
    event_task: tokio::task::JoinHandle<()>,
    audio_task: tokio::task::JoinHandle<()>,
}

impl VoiceLink {
    fn start(state: &AppState, session: &Arc<ChatSession>, sender: &WsSender) -> Option<Self> {
        let speech = state.speech.as_ref()?;
        let voice = Arc::new(VoiceSession::new(
            session.clone(),
            speech.stt.clone(),
            speech.tts.clone(),
            state.voice_config(),
        ));

        let (audio_tx, audio_rx) = mpsc::channel(AUDIO_CHANNEL_CAPACITY);
        let (out_tx, mut out_rx) = mpsc::channel::<AudioFrame>(AUDIO_CHANNEL_CAPACITY);
        let mut events = voice.subscribe();

        let event_sender = sender.clone();
        let event_task = tokio::spawn(async move {
            loop {
                match events.recv().await {
                    Ok(event) => {
                        if let Some(msg) = WsMessage::from_voice_event(event) {
                            if !send(&event_sender, &msg).await {
                                break;
                            }
                        }
                    },
                    Err(broadcast::error::RecvError::Lagged(skipped)) => {
                        tracing::warn!(skipped, "WebSocket lagging behind voice events");
                    },
                    Err(broadcast::error::RecvError::Closed) => break,
                }
            }
        });

        let audio_sender = sender.clone();
        let audio_task = tokio::spawn(async move {
            while let Some(frame) = out_rx.recv().await {
                if !send(&audio_sender, &WsMessage::response_audio(&frame)).await {
                    tracing::debug!("Socket closed, dropping reply audio");
                    break;
                }
            }
        });

        let session_task = tokio::spawn(async move {
            if let Err(e) = voice.run(audio_rx, out_tx).await {
                tracing::warn!(session_id = %voice.session_id(), error = %e, "Voice session ended with error");
            }
        });

        Some(Self {
            audio_tx,
            sample_rate: state.config.speech.stt.sample_rate,
            sequence: 0,
            session_task,
            event_task,
            audio_task,
        })
    }

    async fn push(&mut self, data: Vec<u8>) {
        let frame = AudioFrame::pcm16(data, self.sample_rate).with_sequence(self.sequence);
        self.sequence += 1;
        if let Err(e) = self.audio_tx.send(frame).await {
            tracing::warn!(error = %e, "Voice session is no longer accepting audio");
        }
    }

    /// End the inbound audio and wait for in-flight replies to finish
    async fn close(self) {
        drop(self.audio_tx);
        let _ = self.session_task.await;
        let _ = self.audio_task.await;
        let _ = self.event_task.await;
    }
}

/// WebSocket handler
pub struct WebSocketHandler;

impl WebSocketHandler {
    /// Handle WebSocket upgrade
    pub async fn handle(
        ws: WebSocketUpgrade,
        State(state): State<AppState>,
        Path(session_id): Path<String>,
    ) -> Result<Response, StatusCode> {
        record_request("websocket");
        let session = state
            .sessions
            .get(&session_id)
            .ok_or(StatusCode::NOT_FOUND)?;

        Ok(ws.on_upgrade(move |socket| Self::handle_socket(socket, session, state)))
    }

    /// Handle WebSocket connection
    async fn handle_socket(socket: WebSocket, session: Arc<ChatSession>, state: AppState) {
        let (sender, mut receiver) = socket.split();
        let sender: WsSender = Arc::new(Mutex::new(sender));

        let mut voice = VoiceLink::start(&state, &session, &sender);
        send(
            &sender,
            &WsMessage::SessionInfo {
                session_id: session.id().to_string(),
                voice_enabled: voice.is_some(),
            },
        )
        .await;
        tracing::info!(session_id = %session.id(), voice = voice.is_some(), "WebSocket connected");

        while let Some(msg) = receiver.next().await {
            session.touch();
            match msg {
                Ok(Message::Binary(data)) => {
                    Self::on_audio(&mut voice, &sender, data).await;
                },
                Ok(Message::Text(text)) => match serde_json::from_str::<WsMessage>(&text) {
                    Ok(WsMessage::Audio { data }) => match BASE64.decode(data.as_bytes()) {
                        Ok(bytes) => Self::on_audio(&mut voice, &sender, bytes).await,
                        Err(e) => {
                            record_error("invalid_audio");
                            let message = format!("Invalid base64 audio: {}", e);
                            send(&sender, &WsMessage::Error { message }).await;
                        },
                    },
                    Ok(WsMessage::Text { content }) => {
                        Self::spawn_text_turn(session.clone(), sender.clone(), content);
                    },
                    Ok(WsMessage::Ping) => {
                        send(&sender, &WsMessage::Pong).await;
                    },
                    Ok(WsMessage::EndSession) => break,
                    Ok(other) => {
                        tracing::debug!(?other, "Ignoring server-bound message type");
                    },
                    Err(e) => {
                        record_error("invalid_message");
                        let message = format!("Invalid message: {}", e);
                        send(&sender, &WsMessage::Error { message }).await;
                    },
                },
                Ok(Message::Ping(data)) => {
                    let _ = sender.lock().await.send(Message::Pong(data)).await;
                },
                Ok(Message::Close(_)) => break,
                Ok(Message::Pong(_)) => {},
                Err(e) => {
                    tracing::warn!(error = %e, "WebSocket error");
                    break;
                },
            }
        }

        if let Some(voice) = voice {
            voice.close().await;
        }
        let _ = sender.lock().await.close().await;

        tracing::info!(session_id = %session.id(), "WebSocket closed");
    }

    async fn on_audio(voice: &mut Option<VoiceLink>, sender: &WsSender, data: Vec<u8>) {
        match voice {
            Some(link) => link.push(data).await,
            None => {
                let message = "Voice is not enabled on this server".to_string();
                send(sender, &WsMessage::Error { message }).await;
            },
        }
    }

    /// Text turns run off the receive loop so audio keeps flowing
    fn spawn_text_turn(session: Arc<ChatSession>, sender: WsSender, content: String) {
        tokio::spawn(async move {
            let msg = match session.ask(&content, ResponseMode::Text).await {
                Ok(result) => WsMessage::Response {
                    text: result.text,
                    image_urls: result.image_urls,
                    language: result.language,
                },
                Err(e) => {
                    record_error("text_turn");
                    tracing::warn!(session_id = %session.id(), error = %e, "Text turn failed");
                    WsMessage::Error {
                        message: e.to_string(),
                    }
                },
            };
            send(&sender, &msg).await;
        });
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use realty_agent_core::PipelineResult;

    #[test]
    fn test_client_messages_parse() {
        let msg: WsMessage =
            serde_json::from_str(r#"{"type":"text","content":"2BHK in Pune?"}"#).unwrap();
        assert_eq!(
            msg,
            WsMessage::Text {
                content: "2BHK in Pune?".to_string()
            }
        );

        let msg: WsMessage = serde_json::from_str(r#"{"type":"end_session"}"#).unwrap();
        assert_eq!(msg, WsMessage::EndSession);
    }

    #[test]
    fn test_voice_events_map_to_wire() {
        let msg = WsMessage::from_voice_event(VoiceSessionEvent::Response {
            utterance_id: 2,
            result: PipelineResult {
                text: "Palm Grove has a pool.".to_string(),
                image_urls: vec!["http://x/1.jpg".to_string()],
                language: Language::Hindi,
            },
        })
        .unwrap();
        let json = serde_json::to_value(&msg).unwrap();
        assert_eq!(json["type"], "response");
        assert_eq!(json["language"], "hi");
        assert_eq!(json["image_urls"][0], "http://x/1.jpg");

        let msg = WsMessage::from_voice_event(VoiceSessionEvent::Utterance {
            utterance_id: 2,
            phase: UtterancePhase::Speaking,
        })
        .unwrap();
        let json = serde_json::to_value(&msg).unwrap();
        assert_eq!(json["type"], "utterance");
        assert_eq!(json["phase"], "speaking");

        assert!(WsMessage::from_voice_event(VoiceSessionEvent::Ended {
            session_id: "s".to_string()
        })
        .is_none());
    }

    #[test]
    fn test_response_audio_is_base64() {
        let frame = AudioFrame::pcm16(vec![0, 1, 2, 3], 16000).with_sequence(7);
        let json = serde_json::to_value(WsMessage::response_audio(&frame)).unwrap();
        assert_eq!(json["type"], "response_audio");
        assert_eq!(json["data"], "AAECAw==");
        assert_eq!(json["sequence"], 7);
    }
}
