//! Component wiring shared by the server and the terminal client

use std::path::Path;
use std::sync::Arc;

use realty_agent_agent::RealtyAgent;
use realty_agent_config::Settings;
use realty_agent_llm::{LlmBackend, OpenAIBackend, OpenAIConfig};
use realty_agent_pipeline::{DeepgramConfig, DeepgramStt, ElevenLabsConfig, ElevenLabsTts};
use realty_agent_rag::{
    Embedder, KnowledgeLoader, OpenAIEmbedder, OpenAIEmbeddingConfig, QdrantRetriever,
    VectorStore, VectorStoreConfig,
};

use crate::state::SpeechServices;
use crate::ServerError;

/// Everything a front end needs to answer turns
pub struct Components {
    pub backend: Arc<dyn LlmBackend>,
    pub agent: Arc<RealtyAgent>,
    pub speech: Option<SpeechServices>,
}

/// Build the chat backend, retrieval stack and (when configured) speech.
///
/// When `rag.knowledge_dir` is set its YAML/JSON files are indexed before
/// the agent is returned.
pub async fn build_components(config: &Settings) -> Result<Components, ServerError> {
    let backend: Arc<dyn LlmBackend> = Arc::new(
        OpenAIBackend::new(OpenAIConfig::from_settings(&config.llm))
            .map_err(|e| ServerError::Startup(format!("LLM backend: {}", e)))?,
    );

    let embedder: Arc<dyn Embedder> = Arc::new(
        OpenAIEmbedder::new(OpenAIEmbeddingConfig::from_settings(
            &config.rag,
            &config.llm.api_key,
        ))
        .map_err(|e| ServerError::Startup(format!("Embedder: {}", e)))?,
    );

    let store = Arc::new(
        VectorStore::new(VectorStoreConfig::from_settings(&config.rag))
            .map_err(|e| ServerError::Startup(format!("Vector store: {}", e)))?,
    );

    if let Some(dir) = &config.rag.knowledge_dir {
        store
            .ensure_collection()
            .await
            .map_err(|e| ServerError::Startup(format!("Vector store: {}", e)))?;
        let indexed = KnowledgeLoader::load_directory(Path::new(dir), &store, embedder.as_ref())
            .await
            .map_err(|e| ServerError::Startup(format!("Knowledge base: {}", e)))?;
        tracing::info!(directory = %dir, documents = indexed, "Knowledge base indexed");
    }

    let retriever = Arc::new(QdrantRetriever::new(embedder, store));
    let agent = Arc::new(RealtyAgent::new(backend.clone(), retriever, config.rag.top_k));

    tracing::info!(
        model = agent.model_name(),
        collection = %config.rag.collection,
        top_k = config.rag.top_k,
        "Agent ready"
    );

    Ok(Components {
        backend,
        agent,
        speech: build_speech(config),
    })
}

/// Speech providers, or `None` when credentials are missing or invalid
fn build_speech(config: &Settings) -> Option<SpeechServices> {
    if !config.speech.is_configured() {
        tracing::info!("Speech providers not configured, voice sessions disabled");
        return None;
    }

    let stt = DeepgramStt::new(DeepgramConfig::from_settings(&config.speech.stt));
    let tts = ElevenLabsTts::new(ElevenLabsConfig::from_settings(&config.speech.tts));
    match (stt, tts) {
        (Ok(stt), Ok(tts)) => {
            tracing::info!(
                stt_model = %config.speech.stt.model,
                tts_model = %config.speech.tts.model,
                "Voice sessions enabled"
            );
            Some(SpeechServices {
                stt: Arc::new(stt),
                tts: Arc::new(tts),
            })
        },
        (Err(e), _) | (_, Err(e)) => {
            tracing::warn!(error = %e, "Speech providers unavailable, voice sessions disabled");
            None
        },
    }
}

/// Send one small request through the warm-up model.
///
/// Failure is logged and otherwise ignored.
pub async fn warm_up_llm(config: &Settings) {
    if !config.llm.warmup_enabled {
        return;
    }

    let warmup_config = OpenAIConfig::from_settings(&config.llm).with_model(&config.llm.warmup_model);
    let backend = match OpenAIBackend::new(warmup_config) {
        Ok(backend) => backend,
        Err(e) => {
            tracing::warn!(error = %e, "LLM warm-up skipped");
            return;
        },
    };

    match realty_agent_llm::warm_up(&backend).await {
        Ok(elapsed) => tracing::info!(
            model = %config.llm.warmup_model,
            elapsed_ms = elapsed.as_millis() as u64,
            "LLM warmed up"
        ),
        Err(e) => tracing::warn!(error = %e, "LLM warm-up failed"),
    }
}
