//! ElevenLabs streaming synthesis
//!
//! One HTTP request per reply; the response body is forwarded chunk by chunk
//! as it arrives. PCM output is re-cut so every frame holds whole 16-bit
//! samples.

use futures::{Stream, StreamExt};
use reqwest::{Client, Url};
use serde::Serialize;
use std::pin::Pin;
use std::time::Duration;

use realty_agent_config::TtsConfig;
use realty_agent_core::{AudioEncoding, AudioFrame, TextToSpeech, VoiceConfig};

use crate::PipelineError;

/// ElevenLabs configuration
#[derive(Debug, Clone)]
pub struct ElevenLabsConfig {
    pub endpoint: String,
    pub api_key: String,
    /// Default voice when the request does not name one
    pub voice_id: String,
    pub model: String,
    /// e.g. `pcm_16000` or `mp3_44100_128`
    pub output_format: String,
    pub speed: f32,
    pub timeout: Duration,
}

impl Default for ElevenLabsConfig {
    fn default() -> Self {
        Self::from_settings(&TtsConfig::default())
    }
}

impl ElevenLabsConfig {
    pub fn from_settings(settings: &TtsConfig) -> Self {
        Self {
            endpoint: settings.endpoint.clone(),
            api_key: settings.api_key.clone(),
            voice_id: settings.voice_id.clone(),
            model: settings.model.clone(),
            output_format: settings.output_format.clone(),
            speed: settings.speed,
            timeout: Duration::from_secs(60),
        }
    }

    pub fn stream_url(&self, voice_id: &str) -> Result<Url, PipelineError> {
        let base = format!(
            "{}/v1/text-to-speech/{}/stream",
            self.endpoint.trim_end_matches('/'),
            voice_id
        );
        Url::parse_with_params(&base, &[("output_format", self.output_format.as_str())])
            .map_err(|e| PipelineError::Configuration(format!("Invalid TTS endpoint: {}", e)))
    }
}

#[derive(Debug, Serialize)]
struct SynthesisRequest<'a> {
    text: &'a str,
    model_id: &'a str,
    language_code: &'a str,
    voice_settings: VoiceSettings,
}

#[derive(Debug, Serialize)]
struct VoiceSettings {
    speed: f32,
}

/// ElevenLabs streaming text-to-speech
pub struct ElevenLabsTts {
    client: Client,
    config: ElevenLabsConfig,
    encoding: AudioEncoding,
    sample_rate: u32,
}

impl ElevenLabsTts {
    pub fn new(config: ElevenLabsConfig) -> Result<Self, PipelineError> {
        if config.api_key.is_empty() {
            return Err(PipelineError::Configuration(
                "ElevenLabs API key is required".to_string(),
            ));
        }
        let (encoding, sample_rate) = AudioEncoding::from_output_format(&config.output_format)
            .ok_or_else(|| {
                PipelineError::Configuration(format!(
                    "Unsupported output format: {}",
                    config.output_format
                ))
            })?;

        let client = Client::builder()
            .timeout(config.timeout)
            .build()
            .map_err(|e| PipelineError::Connection(e.to_string()))?;

        Ok(Self {
            client,
            config,
            encoding,
            sample_rate,
        })
    }

    fn request_body<'a>(&'a self, text: &'a str, voice: &'a VoiceConfig) -> SynthesisRequest<'a> {
        SynthesisRequest {
            text,
            model_id: &self.config.model,
            language_code: voice.language.code(),
            voice_settings: VoiceSettings { speed: voice.speed },
        }
    }
}

impl TextToSpeech for ElevenLabsTts {
    fn synthesize_stream(
        &self,
        text: &str,
        config: &VoiceConfig,
    ) -> Pin<Box<dyn Stream<Item = realty_agent_core::Result<AudioFrame>> + Send + 'static>> {
        let voice_id = config
            .voice_id
            .clone()
            .unwrap_or_else(|| self.config.voice_id.clone());
        let url = self.config.stream_url(&voice_id);
        let body = serde_json::to_value(self.request_body(text, config));
        let client = self.client.clone();
        let api_key = self.config.api_key.clone();
        let encoding = self.encoding;
        let sample_rate = self.sample_rate;

        boxed(async_stream::try_stream! {
            let url = url?;
            let body = body.map_err(|e| PipelineError::Tts(e.to_string()))?;

            let response = client
                .post(url)
                .header("xi-api-key", api_key)
                .json(&body)
                .send()
                .await
                .map_err(|e| PipelineError::Connection(format!("TTS request failed: {}", e)))?;

            let status = response.status();
            if !status.is_success() {
                let text = response.text().await.unwrap_or_default();
                Err(PipelineError::Tts(format!("HTTP {}: {}", status, text)))?;
                return;
            }

            let mut body = response.bytes_stream();
            let mut framer = FrameCutter::new(encoding, sample_rate);
            while let Some(chunk) = body.next().await {
                let chunk = chunk.map_err(|e| PipelineError::Tts(format!("TTS stream error: {}", e)))?;
                if let Some(frame) = framer.push(&chunk) {
                    yield frame;
                }
            }
            if let Some(frame) = framer.finish() {
                yield frame;
            }
        })
    }

    fn model_name(&self) -> &str {
        &self.config.model
    }
}

fn boxed<S>(stream: S) -> Pin<Box<dyn Stream<Item = realty_agent_core::Result<AudioFrame>> + Send + 'static>>
where
    S: Stream<Item = realty_agent_core::Result<AudioFrame>> + Send + 'static,
{
    Box::pin(stream)
}

/// Cuts a byte stream into frames, holding back a trailing odd byte of PCM
struct FrameCutter {
    encoding: AudioEncoding,
    sample_rate: u32,
    carry: Vec<u8>,
    sequence: u64,
}

impl FrameCutter {
    fn new(encoding: AudioEncoding, sample_rate: u32) -> Self {
        Self {
            encoding,
            sample_rate,
            carry: Vec::new(),
            sequence: 0,
        }
    }

    fn push(&mut self, chunk: &[u8]) -> Option<AudioFrame> {
        self.carry.extend_from_slice(chunk);
        let usable = match self.encoding {
            AudioEncoding::Pcm16 => self.carry.len() - self.carry.len() % 2,
            AudioEncoding::Mp3 => self.carry.len(),
        };
        if usable == 0 {
            return None;
        }
        let rest = self.carry.split_off(usable);
        let data = std::mem::replace(&mut self.carry, rest);
        Some(self.frame(data))
    }

    /// Whatever is left once the body ends; a lone PCM byte is dropped
    fn finish(&mut self) -> Option<AudioFrame> {
        let data = std::mem::take(&mut self.carry);
        if data.is_empty() || (self.encoding == AudioEncoding::Pcm16 && data.len() < 2) {
            return None;
        }
        Some(self.frame(data))
    }

    fn frame(&mut self, data: Vec<u8>) -> AudioFrame {
        let frame = AudioFrame {
            data,
            encoding: self.encoding,
            sample_rate: self.sample_rate,
            channels: 1,
            sequence: self.sequence,
        };
        self.sequence += 1;
        frame
    }
}
