//! Retrieval for the real-estate agent
//!
//! Features:
//! - OpenAI embeddings over HTTP
//! - Dense vector search via Qdrant
//! - Core `Retriever` implementation
//! - Context assembly with de-duplicated project images
//! - Knowledge base ingestion from YAML/JSON files

pub mod context;
pub mod embeddings;
pub mod knowledge_loader;
pub mod retriever;
pub mod vector_store;

pub use context::{ContextRetriever, RetrievedContext, NO_IMAGE_DATA, NO_PROJECT_DATA};
pub use embeddings::{Embedder, OpenAIEmbedder, OpenAIEmbeddingConfig};
pub use knowledge_loader::{KnowledgeDocument, KnowledgeFile, KnowledgeLoader};
pub use retriever::QdrantRetriever;
pub use vector_store::{IndexedDocument, VectorDistance, VectorStore, VectorStoreConfig};

use thiserror::Error;

/// RAG errors
#[derive(Error, Debug)]
pub enum RagError {
    #[error("Embedding error: {0}")]
    Embedding(String),

    #[error("Vector store error: {0}")]
    VectorStore(String),

    #[error("Search error: {0}")]
    Search(String),

    #[error("Index error: {0}")]
    Index(String),

    #[error("Connection error: {0}")]
    Connection(String),
}

impl From<RagError> for realty_agent_core::Error {
    fn from(err: RagError) -> Self {
        realty_agent_core::Error::Rag(err.to_string())
    }
}
