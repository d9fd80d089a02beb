//! Test doubles shared by the agent integration tests

#![allow(dead_code)]

use async_trait::async_trait;
use futures::{stream, Stream, StreamExt};
use parking_lot::Mutex;
use std::pin::Pin;
use std::sync::Arc;

use realty_agent_core::{
    AudioFrame, AudioStream, DocumentMetadata, ImageSource, RetrieveOptions, RetrievedDocument,
    Retriever, SpeechToText, TextToSpeech, TranscriptEvent, TranscriptStream, VoiceConfig,
};
use realty_agent_llm::{FinishReason, GenerationResult, LlmBackend, LlmError, Message};

/// How the scripted model answers the main prompt
pub enum Reply {
    Fixed(String),
    /// `{"answer": "Reply to <query>", "image_urls": []}`
    Echo,
    Fail,
}

/// Chat backend answering language probes with a fixed label
pub struct ScriptedBackend {
    label: String,
    reply: Reply,
    calls: Mutex<Vec<Vec<Message>>>,
}

impl ScriptedBackend {
    pub fn new(label: &str, reply: Reply) -> Arc<Self> {
        Arc::new(Self {
            label: label.to_string(),
            reply,
            calls: Mutex::new(Vec::new()),
        })
    }

    pub fn calls(&self) -> Vec<Vec<Message>> {
        self.calls.lock().clone()
    }

    /// The last message of every main (non-detection) call
    pub fn prompts(&self) -> Vec<String> {
        self.calls
            .lock()
            .iter()
            .filter(|messages| !is_detection(messages))
            .filter_map(|messages| messages.last().map(|m| m.content.clone()))
            .collect()
    }
}

fn is_detection(messages: &[Message]) -> bool {
    messages.len() == 1 && messages[0].content.contains("language name only")
}

fn current_query(prompt: &str) -> String {
    prompt
        .split("Current user message:\n")
        .nth(1)
        .and_then(|rest| rest.lines().next())
        .unwrap_or_default()
        .to_string()
}

#[async_trait]
impl LlmBackend for ScriptedBackend {
    async fn generate(&self, messages: &[Message]) -> Result<GenerationResult, LlmError> {
        self.calls.lock().push(messages.to_vec());

        let text = if is_detection(messages) {
            self.label.clone()
        } else {
            let prompt = messages.last().map(|m| m.content.as_str()).unwrap_or_default();
            match &self.reply {
                Reply::Fixed(text) => text.clone(),
                Reply::Echo => format!(
                    r#"{{"answer": "Reply to {}", "image_urls": []}}"#,
                    current_query(prompt)
                ),
                Reply::Fail => return Err(LlmError::Api("HTTP 503: overloaded".to_string())),
            }
        };

        Ok(GenerationResult {
            text,
            tokens: 8,
            total_time_ms: 1,
            finish_reason: FinishReason::Stop,
        })
    }

    async fn is_available(&self) -> bool {
        true
    }

    fn model_name(&self) -> &str {
        "scripted"
    }
}

/// Retriever returning the same documents for every query
pub struct StaticRetriever {
    documents: Vec<RetrievedDocument>,
    pub queries: Mutex<Vec<(String, usize)>>,
}

impl StaticRetriever {
    pub fn new(documents: Vec<RetrievedDocument>) -> Arc<Self> {
        Arc::new(Self {
            documents,
            queries: Mutex::new(Vec::new()),
        })
    }
}

#[async_trait]
impl Retriever for StaticRetriever {
    async fn retrieve(
        &self,
        query: &str,
        options: &RetrieveOptions,
    ) -> realty_agent_core::Result<Vec<RetrievedDocument>> {
        self.queries.lock().push((query.to_string(), options.top_k));
        Ok(self.documents.iter().take(options.top_k).cloned().collect())
    }

    fn name(&self) -> &str {
        "static"
    }
}

pub fn project(content: &str) -> RetrievedDocument {
    RetrievedDocument::new(content, DocumentMetadata::project())
}

pub fn project_with_images(content: &str, images: &[(&str, &str)]) -> RetrievedDocument {
    let metadata = images
        .iter()
        .fold(DocumentMetadata::project(), |metadata, (label, url)| {
            metadata.with_image(*label, ImageSource::Single(url.to_string()))
        });
    RetrievedDocument::new(content, metadata)
}

/// STT emitting a fixed script, then staying open until the audio ends
pub struct ScriptedStt {
    events: Vec<TranscriptEvent>,
}

impl ScriptedStt {
    pub fn new(events: Vec<TranscriptEvent>) -> Arc<Self> {
        Arc::new(Self { events })
    }
}

impl SpeechToText for ScriptedStt {
    fn transcribe_stream(&self, audio: AudioStream) -> TranscriptStream {
        let script = stream::iter(self.events.clone().into_iter().map(Ok));
        let drain = audio.filter_map(|_| async { None::<realty_agent_core::Result<TranscriptEvent>> });
        Box::pin(script.chain(drain))
    }

    fn model_name(&self) -> &str {
        "scripted-stt"
    }
}

/// TTS yielding `frames` frames per reply, each carrying the reply text
pub struct TaggedTts {
    frames: usize,
    pub requests: Mutex<Vec<(String, VoiceConfig)>>,
}

impl TaggedTts {
    pub fn new(frames: usize) -> Arc<Self> {
        Arc::new(Self {
            frames,
            requests: Mutex::new(Vec::new()),
        })
    }
}

impl TextToSpeech for TaggedTts {
    fn synthesize_stream(
        &self,
        text: &str,
        config: &VoiceConfig,
    ) -> Pin<Box<dyn Stream<Item = realty_agent_core::Result<AudioFrame>> + Send + 'static>> {
        self.requests.lock().push((text.to_string(), config.clone()));
        let tag = text.as_bytes().to_vec();
        let frames: Vec<_> = (0..self.frames)
            .map(|i| {
                Ok::<_, realty_agent_core::Error>(
                    AudioFrame::pcm16(tag.clone(), 16000).with_sequence(i as u64),
                )
            })
            .collect();
        // yield between frames so concurrent replies get a chance to interleave
        Box::pin(stream::iter(frames).then(|frame| async move {
            tokio::task::yield_now().await;
            frame
        }))
    }

    fn model_name(&self) -> &str {
        "tagged-tts"
    }
}
