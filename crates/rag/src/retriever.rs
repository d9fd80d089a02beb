//! Qdrant-backed retriever
//!
//! Embeds the query, runs a dense search and returns documents in index
//! order. No re-ranking or metadata filtering is applied.

use async_trait::async_trait;
use std::sync::Arc;
use std::time::Instant;

use realty_agent_core::{Result, RetrieveOptions, RetrievedDocument, Retriever};

use crate::embeddings::Embedder;
use crate::vector_store::VectorStore;

pub struct QdrantRetriever {
    embedder: Arc<dyn Embedder>,
    store: Arc<VectorStore>,
}

impl QdrantRetriever {
    pub fn new(embedder: Arc<dyn Embedder>, store: Arc<VectorStore>) -> Self {
        Self { embedder, store }
    }
}

#[async_trait]
impl Retriever for QdrantRetriever {
    async fn retrieve(
        &self,
        query: &str,
        options: &RetrieveOptions,
    ) -> Result<Vec<RetrievedDocument>> {
        let start = Instant::now();
        let embedding = self.embedder.embed(query).await?;
        let documents = self.store.search(&embedding, options.top_k).await?;

        tracing::debug!(
            collection = self.store.collection(),
            top_k = options.top_k,
            returned = documents.len(),
            elapsed_ms = start.elapsed().as_millis() as u64,
            "Similarity search complete"
        );

        Ok(documents)
    }

    fn name(&self) -> &str {
        "qdrant"
    }
}
