//! Retrieval-augmented response pipeline
//!
//! One call runs, strictly in order: language detection on the latest user
//! utterance, similarity search and context assembly, prompt composition,
//! one chat round, and reply extraction. Nothing is retried and nothing is
//! cached between calls.

use async_trait::async_trait;
use std::sync::Arc;
use std::time::Instant;

use realty_agent_core::{
    latest_user_message, ConversationTurn, PipelineResult, ResponseMode, Retriever,
};
use realty_agent_llm::{
    extract_reply, LanguageDetector, LlmBackend, PromptComposer, PromptInputs, ResponseGenerator,
};
use realty_agent_rag::ContextRetriever;

use crate::traits::Responder;
use crate::AgentError;

/// The real-estate response pipeline
#[derive(Clone)]
pub struct RealtyAgent {
    detector: LanguageDetector,
    context: ContextRetriever,
    composer: PromptComposer,
    generator: ResponseGenerator,
}

impl RealtyAgent {
    /// Pipeline using `backend` for both detection and generation
    pub fn new(backend: Arc<dyn LlmBackend>, retriever: Arc<dyn Retriever>, top_k: usize) -> Self {
        Self {
            detector: LanguageDetector::new(Arc::clone(&backend)),
            context: ContextRetriever::new(retriever, top_k),
            composer: PromptComposer::new(),
            generator: ResponseGenerator::new(backend),
        }
    }

    pub fn with_composer(mut self, composer: PromptComposer) -> Self {
        self.composer = composer;
        self
    }

    pub fn model_name(&self) -> &str {
        self.generator.model_name()
    }

    /// Produce `{text, image_urls, language}` for the latest user turn.
    ///
    /// Upstream failures propagate; malformed model output does not.
    pub async fn generate_response(
        &self,
        history: &[ConversationTurn],
        mode: ResponseMode,
    ) -> Result<PipelineResult, AgentError> {
        let start = Instant::now();
        let query = latest_user_message(history)
            .ok_or_else(|| AgentError::Conversation("History has no user message".to_string()))?;

        let language = self.detector.detect(query).await?;
        let context = self.context.gather(query).await?;

        let context_block = context.context_block();
        let images_block = context.images_block();
        let prompt = self.composer.compose(&PromptInputs {
            context: &context_block,
            query,
            history,
            language,
            images: &images_block,
            mode,
        });

        let raw = self.generator.generate(history, &prompt).await?;
        let reply = extract_reply(&raw);

        let elapsed_ms = start.elapsed().as_secs_f64() * 1000.0;
        metrics::histogram!("realty_agent_pipeline_latency_ms", "mode" => mode_label(mode))
            .record(elapsed_ms);
        tracing::info!(
            language = %language,
            documents = context.documents.len(),
            images = reply.image_urls.len(),
            structured = reply.structured,
            voice = mode.is_voice(),
            elapsed_ms = elapsed_ms as u64,
            "Response generated"
        );

        Ok(PipelineResult {
            text: reply.answer,
            image_urls: reply.image_urls,
            language,
        })
    }
}

fn mode_label(mode: ResponseMode) -> &'static str {
    match mode {
        ResponseMode::Text => "text",
        ResponseMode::Voice => "voice",
    }
}

#[async_trait]
impl Responder for RealtyAgent {
    async fn respond(
        &self,
        history: &[ConversationTurn],
        mode: ResponseMode,
    ) -> Result<PipelineResult, AgentError> {
        self.generate_response(history, mode).await
    }

    fn name(&self) -> &str {
        "realty-agent"
    }
}
