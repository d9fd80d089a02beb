//! Deepgram live transcription
//!
//! Audio is sent as binary linear16 frames over one WebSocket per session.
//! Results arrive as JSON text messages carrying interim and final
//! transcripts. A `KeepAlive` is sent while the caller is silent and
//! `CloseStream` asks the server to flush once the audio ends.

use futures::{SinkExt, Stream, StreamExt};
use reqwest::Url;
use serde::Deserialize;
use std::time::Duration;
use tokio_tungstenite::tungstenite::client::IntoClientRequest;
use tokio_tungstenite::tungstenite::handshake::client::Request;
use tokio_tungstenite::tungstenite::http::HeaderValue;
use tokio_tungstenite::tungstenite::protocol::Message;
use tokio_tungstenite::connect_async;

use realty_agent_config::SttConfig;
use realty_agent_core::{AudioStream, SpeechToText, TranscriptEvent, TranscriptStream};

use crate::PipelineError;

const KEEP_ALIVE: &str = r#"{"type":"KeepAlive"}"#;
const CLOSE_STREAM: &str = r#"{"type":"CloseStream"}"#;
const KEEP_ALIVE_INTERVAL: Duration = Duration::from_secs(5);

/// Deepgram streaming configuration
#[derive(Debug, Clone)]
pub struct DeepgramConfig {
    pub endpoint: String,
    pub api_key: String,
    pub model: String,
    /// `multi` for code-switched speech
    pub language: String,
    pub sample_rate: u32,
    pub channels: u16,
    pub interim_results: bool,
    pub punctuate: bool,
    pub filler_words: bool,
    pub profanity_filter: bool,
    pub numerals: bool,
}

impl Default for DeepgramConfig {
    fn default() -> Self {
        Self::from_settings(&SttConfig::default())
    }
}

impl DeepgramConfig {
    pub fn from_settings(settings: &SttConfig) -> Self {
        Self {
            endpoint: settings.endpoint.clone(),
            api_key: settings.api_key.clone(),
            model: settings.model.clone(),
            language: settings.language.clone(),
            sample_rate: settings.sample_rate,
            channels: 1,
            interim_results: settings.interim_results,
            punctuate: settings.punctuate,
            filler_words: settings.filler_words,
            profanity_filter: settings.profanity_filter,
            numerals: settings.numerals,
        }
    }

    /// Listen URL with all recognition options as query parameters
    pub fn listen_url(&self) -> Result<Url, PipelineError> {
        let sample_rate = self.sample_rate.to_string();
        let channels = self.channels.to_string();
        let params = [
            ("model", self.model.as_str()),
            ("language", self.language.as_str()),
            ("encoding", "linear16"),
            ("sample_rate", sample_rate.as_str()),
            ("channels", channels.as_str()),
            ("interim_results", flag(self.interim_results)),
            ("punctuate", flag(self.punctuate)),
            ("filler_words", flag(self.filler_words)),
            ("profanity_filter", flag(self.profanity_filter)),
            ("numerals", flag(self.numerals)),
            ("no_delay", "true"),
        ];
        Url::parse_with_params(&self.endpoint, &params)
            .map_err(|e| PipelineError::Configuration(format!("Invalid STT endpoint: {}", e)))
    }

    fn request(&self) -> Result<Request, PipelineError> {
        let mut request = self
            .listen_url()?
            .as_str()
            .into_client_request()
            .map_err(|e| PipelineError::Configuration(e.to_string()))?;
        let token = HeaderValue::from_str(&format!("Token {}", self.api_key))
            .map_err(|e| PipelineError::Configuration(format!("Invalid API key: {}", e)))?;
        request.headers_mut().insert("Authorization", token);
        Ok(request)
    }
}

fn flag(value: bool) -> &'static str {
    if value {
        "true"
    } else {
        "false"
    }
}

/// Deepgram live speech-to-text
#[derive(Debug, Clone)]
pub struct DeepgramStt {
    config: DeepgramConfig,
}

impl DeepgramStt {
    pub fn new(config: DeepgramConfig) -> Result<Self, PipelineError> {
        if config.api_key.is_empty() {
            return Err(PipelineError::Configuration(
                "Deepgram API key is required".to_string(),
            ));
        }
        // fail early on a malformed endpoint
        config.listen_url()?;
        Ok(Self { config })
    }
}

impl SpeechToText for DeepgramStt {
    fn transcribe_stream(&self, audio: AudioStream) -> TranscriptStream {
        let config = self.config.clone();

        boxed(async_stream::try_stream! {
            let request = config.request()?;
            let (socket, _) = connect_async(request)
                .await
                .map_err(|e| PipelineError::Connection(format!("Deepgram connect failed: {}", e)))?;
            tracing::debug!(model = %config.model, language = %config.language, "Deepgram stream opened");

            let (mut sink, mut source) = socket.split();

            let writer = tokio::spawn(async move {
                let mut audio = audio;
                let mut keep_alive = tokio::time::interval(KEEP_ALIVE_INTERVAL);
                keep_alive.tick().await;
                loop {
                    tokio::select! {
                        frame = audio.next() => match frame {
                            Some(frame) => {
                                if frame.is_empty() {
                                    continue;
                                }
                                if sink.send(Message::Binary(frame.data)).await.is_err() {
                                    return;
                                }
                                keep_alive.reset();
                            }
                            None => break,
                        },
                        _ = keep_alive.tick() => {
                            if sink.send(Message::Text(KEEP_ALIVE.to_string())).await.is_err() {
                                return;
                            }
                        }
                    }
                }
                let _ = sink.send(Message::Text(CLOSE_STREAM.to_string())).await;
            });

            while let Some(message) = source.next().await {
                let message = message
                    .map_err(|e| PipelineError::Stt(format!("Deepgram stream error: {}", e)))?;
                match message {
                    Message::Text(text) => {
                        if let Some(event) = parse_message(&text)? {
                            yield event;
                        }
                    }
                    Message::Close(frame) => {
                        tracing::debug!(?frame, "Deepgram stream closed");
                        break;
                    }
                    _ => {}
                }
            }

            writer.abort();
        })
    }

    fn model_name(&self) -> &str {
        &self.config.model
    }
}

fn boxed<S>(stream: S) -> TranscriptStream
where
    S: Stream<Item = realty_agent_core::Result<TranscriptEvent>> + Send + 'static,
{
    Box::pin(stream)
}

#[derive(Debug, Deserialize)]
#[serde(tag = "type")]
enum DeepgramMessage {
    Results(DeepgramResults),
    #[serde(other)]
    Other,
}

#[derive(Debug, Deserialize)]
struct DeepgramResults {
    channel: DeepgramChannel,
    #[serde(default)]
    is_final: bool,
}

#[derive(Debug, Deserialize)]
struct DeepgramChannel {
    #[serde(default)]
    alternatives: Vec<DeepgramAlternative>,
}

#[derive(Debug, Deserialize)]
struct DeepgramAlternative {
    #[serde(default)]
    transcript: String,
    #[serde(default)]
    confidence: f32,
    #[serde(default)]
    languages: Vec<String>,
}

/// Decode one server message. Non-result messages and blank interim
/// results yield `None`; blank finals are passed through.
fn parse_message(text: &str) -> Result<Option<TranscriptEvent>, PipelineError> {
    let message: DeepgramMessage =
        serde_json::from_str(text).map_err(|e| PipelineError::Protocol(e.to_string()))?;

    let DeepgramMessage::Results(results) = message else {
        return Ok(None);
    };

    let Some(best) = results.channel.alternatives.into_iter().next() else {
        return Ok(None);
    };

    if !results.is_final && best.transcript.trim().is_empty() {
        return Ok(None);
    }

    Ok(Some(TranscriptEvent {
        text: best.transcript,
        is_final: results.is_final,
        confidence: best.confidence,
        language: best.languages.into_iter().next(),
    }))
}
