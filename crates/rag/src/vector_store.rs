//! Vector Store using Qdrant
//!
//! Each point carries the document text under `content` and its metadata as
//! a nested `metadata` object. Collections written by LangChain-style
//! tooling (`page_content`) are read as well.

use qdrant_client::{
    qdrant::{
        point_id::PointIdOptions, value::Kind, CreateCollectionBuilder, Distance, ListValue,
        PointId, PointStruct, SearchPointsBuilder, Struct, UpsertPointsBuilder,
        Value as QdrantValue, VectorParamsBuilder,
    },
    Qdrant,
};
use serde_json::{Map, Number, Value};
use std::collections::HashMap;
use uuid::Uuid;

use realty_agent_config::RagConfig;
use realty_agent_core::{DocumentMetadata, RetrievedDocument};

use crate::RagError;

const CONTENT_KEYS: [&str; 3] = ["content", "page_content", "text"];
const METADATA_KEY: &str = "metadata";
const DOC_ID_KEY: &str = "doc_id";

/// Vector store configuration
#[derive(Debug, Clone)]
pub struct VectorStoreConfig {
    pub endpoint: String,
    pub collection: String,
    pub vector_dim: usize,
    pub distance: VectorDistance,
    pub api_key: Option<String>,
}

impl Default for VectorStoreConfig {
    fn default() -> Self {
        Self::from_settings(&RagConfig::default())
    }
}

impl VectorStoreConfig {
    pub fn from_settings(rag: &RagConfig) -> Self {
        Self {
            endpoint: rag.qdrant_endpoint.clone(),
            collection: rag.collection.clone(),
            vector_dim: rag.vector_dim,
            distance: VectorDistance::Cosine,
            api_key: Some(rag.qdrant_api_key.clone()).filter(|k| !k.is_empty()),
        }
    }
}

/// Distance metric
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum VectorDistance {
    Cosine,
    Euclidean,
    DotProduct,
}

impl From<VectorDistance> for Distance {
    fn from(d: VectorDistance) -> Self {
        match d {
            VectorDistance::Cosine => Distance::Cosine,
            VectorDistance::Euclidean => Distance::Euclid,
            VectorDistance::DotProduct => Distance::Dot,
        }
    }
}

/// A document to be written to the index
#[derive(Debug, Clone)]
pub struct IndexedDocument {
    /// Stable identifier; re-ingesting the same id overwrites the point
    pub id: String,
    pub content: String,
    pub metadata: DocumentMetadata,
}

/// Vector store client
pub struct VectorStore {
    client: Qdrant,
    config: VectorStoreConfig,
}

impl VectorStore {
    pub fn new(config: VectorStoreConfig) -> Result<Self, RagError> {
        let mut builder = Qdrant::from_url(&config.endpoint);

        if let Some(ref api_key) = config.api_key {
            builder = builder.api_key(api_key.clone());
            tracing::info!("Qdrant connection using API key authentication");
        }

        let client = builder
            .build()
            .map_err(|e| RagError::Connection(e.to_string()))?;

        Ok(Self { client, config })
    }

    pub fn collection(&self) -> &str {
        &self.config.collection
    }

    /// Create collection if not exists
    pub async fn ensure_collection(&self) -> Result<(), RagError> {
        let exists = self
            .client
            .collection_exists(&self.config.collection)
            .await
            .map_err(|e| RagError::VectorStore(e.to_string()))?;

        if !exists {
            self.client
                .create_collection(
                    CreateCollectionBuilder::new(&self.config.collection).vectors_config(
                        VectorParamsBuilder::new(
                            self.config.vector_dim as u64,
                            Distance::from(self.config.distance),
                        ),
                    ),
                )
                .await
                .map_err(|e| RagError::VectorStore(e.to_string()))?;
            tracing::info!(collection = %self.config.collection, "Created Qdrant collection");
        }

        Ok(())
    }

    /// Insert documents with embeddings
    pub async fn upsert(
        &self,
        documents: &[IndexedDocument],
        embeddings: &[Vec<f32>],
    ) -> Result<(), RagError> {
        if documents.len() != embeddings.len() {
            return Err(RagError::VectorStore(
                "Document and embedding count mismatch".to_string(),
            ));
        }

        let points: Vec<PointStruct> = documents
            .iter()
            .zip(embeddings.iter())
            .map(|(doc, emb)| PointStruct::new(point_id(&doc.id), emb.clone(), to_payload(doc)))
            .collect();

        self.client
            .upsert_points(UpsertPointsBuilder::new(&self.config.collection, points))
            .await
            .map_err(|e| RagError::VectorStore(e.to_string()))?;

        Ok(())
    }

    /// Search by vector, most similar first
    pub async fn search(
        &self,
        query_embedding: &[f32],
        top_k: usize,
    ) -> Result<Vec<RetrievedDocument>, RagError> {
        let search = SearchPointsBuilder::new(
            &self.config.collection,
            query_embedding.to_vec(),
            top_k as u64,
        )
        .with_payload(true);

        let results = self
            .client
            .search_points(search)
            .await
            .map_err(|e| RagError::Search(e.to_string()))?;

        Ok(results
            .result
            .into_iter()
            .map(|point| {
                let fallback_id = point
                    .id
                    .and_then(|pid| pid.point_id_options)
                    .map(|options| match options {
                        PointIdOptions::Uuid(u) => u,
                        PointIdOptions::Num(n) => n.to_string(),
                    });
                from_payload(point.payload, fallback_id).with_score(point.score)
            })
            .collect())
    }
}

/// Deterministic point id for a document id
fn point_id(doc_id: &str) -> PointId {
    PointId::from(Uuid::new_v5(&Uuid::NAMESPACE_OID, doc_id.as_bytes()).to_string())
}

fn to_payload(doc: &IndexedDocument) -> HashMap<String, QdrantValue> {
    let mut payload = HashMap::new();
    payload.insert("content".to_string(), doc.content.clone().into());
    payload.insert(DOC_ID_KEY.to_string(), doc.id.clone().into());
    payload.insert(METADATA_KEY.to_string(), json_to_qdrant(doc.metadata.to_value()));
    payload
}

fn from_payload(
    mut payload: HashMap<String, QdrantValue>,
    fallback_id: Option<String>,
) -> RetrievedDocument {
    let content = CONTENT_KEYS
        .iter()
        .find_map(|key| match payload.remove(*key).and_then(|v| v.kind) {
            Some(Kind::StringValue(s)) => Some(s),
            _ => None,
        })
        .unwrap_or_default();

    let id = match payload.remove(DOC_ID_KEY).and_then(|v| v.kind) {
        Some(Kind::StringValue(s)) => Some(s),
        _ => fallback_id,
    };

    let metadata = match payload.remove(METADATA_KEY) {
        Some(value) => DocumentMetadata::from_value(qdrant_to_json(value)),
        // flat payloads keep metadata at the top level
        None => DocumentMetadata::from_value(Value::Object(
            payload
                .into_iter()
                .map(|(k, v)| (k, qdrant_to_json(v)))
                .collect(),
        )),
    };

    RetrievedDocument {
        id,
        content,
        metadata,
        score: 0.0,
    }
}

fn json_to_qdrant(value: Value) -> QdrantValue {
    let kind = match value {
        Value::Null => Kind::NullValue(0),
        Value::Bool(b) => Kind::BoolValue(b),
        Value::Number(n) => match n.as_i64() {
            Some(i) => Kind::IntegerValue(i),
            None => Kind::DoubleValue(n.as_f64().unwrap_or_default()),
        },
        Value::String(s) => Kind::StringValue(s),
        Value::Array(items) => Kind::ListValue(ListValue {
            values: items.into_iter().map(json_to_qdrant).collect(),
        }),
        Value::Object(map) => Kind::StructValue(Struct {
            fields: map.into_iter().map(|(k, v)| (k, json_to_qdrant(v))).collect(),
        }),
    };
    QdrantValue { kind: Some(kind) }
}

fn qdrant_to_json(value: QdrantValue) -> Value {
    match value.kind {
        None | Some(Kind::NullValue(_)) => Value::Null,
        Some(Kind::BoolValue(b)) => Value::Bool(b),
        Some(Kind::IntegerValue(i)) => Value::Number(i.into()),
        Some(Kind::DoubleValue(d)) => Number::from_f64(d).map(Value::Number).unwrap_or(Value::Null),
        Some(Kind::StringValue(s)) => Value::String(s),
        Some(Kind::ListValue(list)) => {
            Value::Array(list.values.into_iter().map(qdrant_to_json).collect())
        }
        Some(Kind::StructValue(s)) => Value::Object(
            s.fields
                .into_iter()
                .map(|(k, v)| (k, qdrant_to_json(v)))
                .collect::<Map<String, Value>>(),
        ),
    }
}
