//! Knowledge Base Loader
//!
//! Loads project documents from YAML/JSON files and indexes them in the
//! vector store for retrieval.

use serde::{Deserialize, Serialize};
use std::path::Path;

use realty_agent_core::DocumentMetadata;

use crate::embeddings::Embedder;
use crate::vector_store::IndexedDocument;
use crate::{RagError, VectorStore};

/// Knowledge document format for YAML/JSON files
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct KnowledgeDocument {
    /// Unique document ID
    pub id: String,
    /// Document content (will be embedded)
    pub content: String,
    /// Free-form metadata; `type: project` plus an `images` mapping of
    /// label to URL (or list of URLs) makes images available to replies
    #[serde(default)]
    pub metadata: serde_json::Value,
}

impl KnowledgeDocument {
    fn into_indexed(self) -> IndexedDocument {
        IndexedDocument {
            id: self.id,
            content: self.content,
            metadata: DocumentMetadata::from_value(self.metadata),
        }
    }
}

/// Knowledge base file format
#[derive(Debug, Serialize, Deserialize)]
pub struct KnowledgeFile {
    #[serde(default)]
    pub version: Option<String>,
    pub documents: Vec<KnowledgeDocument>,
}

/// Knowledge loader for populating vector store
pub struct KnowledgeLoader;

impl KnowledgeLoader {
    /// Load every YAML/JSON file in `knowledge_dir`.
    ///
    /// Files that fail to parse or index are logged and skipped. Returns the
    /// number of documents indexed.
    pub async fn load_directory(
        knowledge_dir: &Path,
        vector_store: &VectorStore,
        embedder: &dyn Embedder,
    ) -> Result<usize, RagError> {
        if !knowledge_dir.exists() {
            tracing::warn!(
                path = %knowledge_dir.display(),
                "Knowledge directory does not exist"
            );
            return Ok(0);
        }

        let entries = std::fs::read_dir(knowledge_dir)
            .map_err(|e| RagError::Index(format!("Failed to read directory: {}", e)))?;

        let mut paths = Vec::new();
        for entry in entries {
            let entry =
                entry.map_err(|e| RagError::Index(format!("Failed to read entry: {}", e)))?;
            let path = entry.path();
            if is_knowledge_file(&path) {
                paths.push(path);
            }
        }
        paths.sort();

        let mut total_count = 0;
        for path in paths {
            match Self::load_file(&path, vector_store, embedder).await {
                Ok(count) => {
                    tracing::info!(
                        file = %path.display(),
                        documents = count,
                        "Loaded knowledge file"
                    );
                    total_count += count;
                }
                Err(e) => {
                    tracing::error!(
                        file = %path.display(),
                        error = %e,
                        "Failed to load knowledge file"
                    );
                }
            }
        }

        tracing::info!(
            directory = %knowledge_dir.display(),
            total_documents = total_count,
            "Knowledge base loading complete"
        );

        Ok(total_count)
    }

    /// Embed and index one file
    pub async fn load_file(
        path: &Path,
        vector_store: &VectorStore,
        embedder: &dyn Embedder,
    ) -> Result<usize, RagError> {
        let knowledge = Self::read_file(path)?;
        let documents: Vec<IndexedDocument> = knowledge
            .documents
            .into_iter()
            .filter(|d| !d.content.trim().is_empty())
            .map(KnowledgeDocument::into_indexed)
            .collect();

        if documents.is_empty() {
            return Ok(0);
        }

        let texts: Vec<&str> = documents.iter().map(|d| d.content.as_str()).collect();
        let embeddings = embedder.embed_batch(&texts).await?;
        vector_store.upsert(&documents, &embeddings).await?;

        Ok(documents.len())
    }

    /// Parse a knowledge file by extension
    pub fn read_file(path: &Path) -> Result<KnowledgeFile, RagError> {
        let content = std::fs::read_to_string(path)
            .map_err(|e| RagError::Index(format!("Failed to read file: {}", e)))?;

        let extension = path.extension().and_then(|e| e.to_str()).unwrap_or("");
        match extension {
            "json" => serde_json::from_str(&content)
                .map_err(|e| RagError::Index(format!("JSON parse error: {}", e))),
            "yaml" | "yml" => serde_yaml::from_str(&content)
                .map_err(|e| RagError::Index(format!("YAML parse error: {}", e))),
            _ => Err(RagError::Index(format!(
                "Unsupported file type: {}",
                extension
            ))),
        }
    }
}

fn is_knowledge_file(path: &Path) -> bool {
    matches!(
        path.extension().and_then(|e| e.to_str()),
        Some("yaml" | "yml" | "json")
    )
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::tempdir;

    const SAMPLE_YAML: &str = r#"
version: "1.0"
documents:
  - id: palm-grove
    content: "Palm Grove: 3BHK villas in Assagao, Goa, from 4.2 Cr"
    metadata:
      type: project
      city: Goa
      images:
        facade: http://cdn.example.com/palm/facade.jpg
        interiors:
          - http://cdn.example.com/palm/living.jpg
          - http://cdn.example.com/palm/kitchen.jpg
  - id: goa-guide
    content: "North Goa micro-markets overview"
"#;

    #[test]
    fn test_read_yaml_file() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("goa.yaml");
        std::fs::write(&path, SAMPLE_YAML).unwrap();

        let file = KnowledgeLoader::read_file(&path).unwrap();
        assert_eq!(file.version.as_deref(), Some("1.0"));
        assert_eq!(file.documents.len(), 2);

        let indexed: Vec<_> = file
            .documents
            .into_iter()
            .map(KnowledgeDocument::into_indexed)
            .collect();
        assert!(indexed[0].metadata.is_project());
        assert_eq!(indexed[0].metadata.images.len(), 2);
        assert!(!indexed[1].metadata.is_project());
    }

    #[test]
    fn test_read_json_file() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("mumbai.json");
        std::fs::write(
            &path,
            r#"{"documents":[{"id":"sea-crest","content":"Sea Crest, Worli","metadata":{"type":"project"}}]}"#,
        )
        .unwrap();

        let file = KnowledgeLoader::read_file(&path).unwrap();
        assert_eq!(file.documents[0].id, "sea-crest");
    }

    #[test]
    fn test_unsupported_extension() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("notes.txt");
        std::fs::write(&path, "documents: []").unwrap();
        assert!(matches!(
            KnowledgeLoader::read_file(&path),
            Err(RagError::Index(_))
        ));
        assert!(!is_knowledge_file(&path));
    }
}
