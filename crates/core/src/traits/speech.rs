//! Speech processing traits

use crate::{AudioFrame, Result, TranscriptEvent, VoiceConfig};
use futures::Stream;
use std::pin::Pin;

/// Owned stream of audio frames
pub type AudioStream = Pin<Box<dyn Stream<Item = AudioFrame> + Send + 'static>>;

/// Owned stream of recognizer updates
pub type TranscriptStream = Pin<Box<dyn Stream<Item = Result<TranscriptEvent>> + Send + 'static>>;

/// Streaming speech-to-text
///
/// Implementations:
/// - `DeepgramStt` - Deepgram live transcription over WebSocket
pub trait SpeechToText: Send + Sync + 'static {
    /// Transcribe audio as it arrives.
    ///
    /// Yields interim transcripts (`is_final = false`) followed by final
    /// ones. The output stream ends once the input stream ends and the
    /// recognizer has flushed.
    fn transcribe_stream(&self, audio: AudioStream) -> TranscriptStream;

    /// Model name for logging
    fn model_name(&self) -> &str;
}

/// Streaming text-to-speech
///
/// Implementations:
/// - `ElevenLabsTts` - ElevenLabs HTTP streaming synthesis
pub trait TextToSpeech: Send + Sync + 'static {
    /// Synthesize `text`, yielding audio chunks in playback order
    fn synthesize_stream(
        &self,
        text: &str,
        config: &VoiceConfig,
    ) -> Pin<Box<dyn Stream<Item = Result<AudioFrame>> + Send + 'static>>;

    /// Model name for logging
    fn model_name(&self) -> &str;
}
