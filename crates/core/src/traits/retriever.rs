//! Document retrieval trait

use crate::{Result, RetrievedDocument};
use async_trait::async_trait;

/// Options for one retrieval call
#[derive(Debug, Clone)]
pub struct RetrieveOptions {
    /// Maximum number of documents returned
    pub top_k: usize,
}

impl Default for RetrieveOptions {
    fn default() -> Self {
        Self {
            top_k: 15,
        }
    }
}

impl RetrieveOptions {
    pub fn with_top_k(mut self, top_k: usize) -> Self {
        self.top_k = top_k;
        self
    }
}

/// Similarity search over an index of documents
///
/// Results come back in index order, most similar first.
#[async_trait]
pub trait Retriever: Send + Sync + 'static {
    async fn retrieve(&self, query: &str, options: &RetrieveOptions)
        -> Result<Vec<RetrievedDocument>>;

    /// Retriever name for logging
    fn name(&self) -> &str;
}
