//! Context assembly for one turn
//!
//! Turns the retrieved documents into the two prompt blocks: project text
//! and image candidates. Images come only from project documents and each
//! `label: url` pair appears once, in first-seen order.

use std::collections::HashSet;
use std::sync::Arc;

use realty_agent_core::{ImageReference, Result, RetrieveOptions, RetrievedDocument, Retriever};

/// Context block used when nothing was retrieved
pub const NO_PROJECT_DATA: &str = "No project data available";
/// Image block used when no project images were found
pub const NO_IMAGE_DATA: &str = "No image data available";

/// Documents and image candidates for one query
#[derive(Debug, Clone, Default, PartialEq)]
pub struct RetrievedContext {
    pub documents: Vec<RetrievedDocument>,
    pub images: Vec<ImageReference>,
}

impl RetrievedContext {
    pub fn from_documents(documents: Vec<RetrievedDocument>) -> Self {
        let mut seen = HashSet::new();
        let mut images = Vec::new();

        for image in documents.iter().flat_map(RetrievedDocument::image_references) {
            if seen.insert(image.key()) {
                images.push(image);
            }
        }

        Self { documents, images }
    }

    /// Newline-joined document contents, or the placeholder
    pub fn context_block(&self) -> String {
        let joined = self
            .documents
            .iter()
            .map(|d| d.content.as_str())
            .collect::<Vec<_>>()
            .join("\n");
        if joined.trim().is_empty() {
            NO_PROJECT_DATA.to_string()
        } else {
            joined
        }
    }

    /// Newline-joined `- label: url` lines, or the placeholder
    pub fn images_block(&self) -> String {
        if self.images.is_empty() {
            return NO_IMAGE_DATA.to_string();
        }
        self.images
            .iter()
            .map(ToString::to_string)
            .collect::<Vec<_>>()
            .join("\n")
    }
}

/// Runs the similarity query for a turn and assembles its context
#[derive(Clone)]
pub struct ContextRetriever {
    retriever: Arc<dyn Retriever>,
    top_k: usize,
}

impl ContextRetriever {
    pub fn new(retriever: Arc<dyn Retriever>, top_k: usize) -> Self {
        Self { retriever, top_k }
    }

    pub fn top_k(&self) -> usize {
        self.top_k
    }

    pub async fn gather(&self, query: &str) -> Result<RetrievedContext> {
        let options = RetrieveOptions::default().with_top_k(self.top_k);
        let documents = self.retriever.retrieve(query, &options).await?;
        let context = RetrievedContext::from_documents(documents);

        tracing::debug!(
            retriever = self.retriever.name(),
            documents = context.documents.len(),
            images = context.images.len(),
            "Context assembled"
        );

        Ok(context)
    }
}
