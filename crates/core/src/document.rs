//! Documents returned by the similarity index

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use std::collections::BTreeMap;
use std::fmt;

/// Document type whose `images` metadata is surfaced to the prompt
pub const PROJECT_DOC_TYPE: &str = "project";

/// One image entry: a single URL or a list of URLs under the same label
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum ImageSource {
    Single(String),
    Many(Vec<String>),
}

impl ImageSource {
    /// Every URL in this entry, a single URL counting as a one-element list
    pub fn urls(&self) -> impl Iterator<Item = &str> {
        let urls: &[String] = match self {
            Self::Single(url) => std::slice::from_ref(url),
            Self::Many(urls) => urls,
        };
        urls.iter().map(String::as_str)
    }

    fn from_value(value: &Value) -> Option<Self> {
        match value {
            Value::String(url) => Some(Self::Single(url.clone())),
            Value::Array(items) => Some(Self::Many(
                items
                    .iter()
                    .filter_map(|v| v.as_str().map(str::to_string))
                    .collect(),
            )),
            _ => None,
        }
    }
}

/// Metadata attached to an indexed document
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct DocumentMetadata {
    #[serde(rename = "type", default, skip_serializing_if = "Option::is_none")]
    pub doc_type: Option<String>,
    #[serde(default, skip_serializing_if = "BTreeMap::is_empty")]
    pub images: BTreeMap<String, ImageSource>,
    /// Any other keys, kept as-is
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

impl DocumentMetadata {
    pub fn project() -> Self {
        Self {
            doc_type: Some(PROJECT_DOC_TYPE.to_string()),
            ..Self::default()
        }
    }

    pub fn with_image(mut self, label: impl Into<String>, source: ImageSource) -> Self {
        self.images.insert(label.into(), source);
        self
    }

    /// Build metadata from an arbitrary JSON value.
    ///
    /// Never fails: a non-object yields empty metadata and malformed
    /// `type`/`images` entries are skipped.
    pub fn from_value(value: Value) -> Self {
        let Value::Object(mut map) = value else {
            return Self::default();
        };

        let doc_type = match map.remove("type") {
            Some(Value::String(t)) => Some(t),
            _ => None,
        };

        let mut images = BTreeMap::new();
        if let Some(Value::Object(entries)) = map.remove("images") {
            for (label, value) in entries {
                if let Some(source) = ImageSource::from_value(&value) {
                    images.insert(label, source);
                }
            }
        }

        Self {
            doc_type,
            images,
            extra: map,
        }
    }

    pub fn to_value(&self) -> Value {
        serde_json::to_value(self).unwrap_or(Value::Object(Map::new()))
    }

    pub fn is_project(&self) -> bool {
        self.doc_type.as_deref() == Some(PROJECT_DOC_TYPE)
    }
}

/// A document returned by similarity search
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RetrievedDocument {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub id: Option<String>,
    pub content: String,
    #[serde(default)]
    pub metadata: DocumentMetadata,
    #[serde(default)]
    pub score: f32,
}

impl RetrievedDocument {
    pub fn new(content: impl Into<String>, metadata: DocumentMetadata) -> Self {
        Self {
            id: None,
            content: content.into(),
            metadata,
            score: 0.0,
        }
    }

    pub fn with_id(mut self, id: impl Into<String>) -> Self {
        self.id = Some(id.into());
        self
    }

    pub fn with_score(mut self, score: f32) -> Self {
        self.score = score;
        self
    }

    /// Image references of a project document; other types have none
    pub fn image_references(&self) -> Vec<ImageReference> {
        if !self.metadata.is_project() {
            return Vec::new();
        }
        self.metadata
            .images
            .iter()
            .flat_map(|(label, source)| {
                source
                    .urls()
                    .map(str::trim)
                    .filter(|url| !url.is_empty())
                    .map(move |url| ImageReference::new(label.clone(), url))
            })
            .collect()
    }
}

/// A labelled image candidate offered to the model
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct ImageReference {
    pub label: String,
    pub url: String,
}

impl ImageReference {
    pub fn new(label: impl Into<String>, url: impl Into<String>) -> Self {
        Self {
            label: label.into(),
            url: url.into(),
        }
    }

    /// De-duplication key, `label: url`
    pub fn key(&self) -> String {
        format!("{}: {}", self.label, self.url)
    }
}

impl fmt::Display for ImageReference {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "- {}: {}", self.label, self.url)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_single_url_equals_one_element_list() {
        let single = RetrievedDocument::new(
            "A",
            DocumentMetadata::from_value(json!({
                "type": "project",
                "images": {"facade": " http://x/1.jpg "}
            })),
        );
        let list = RetrievedDocument::new(
            "A",
            DocumentMetadata::from_value(json!({
                "type": "project",
                "images": {"facade": ["http://x/1.jpg"]}
            })),
        );
        assert_eq!(single.image_references(), list.image_references());
        assert_eq!(
            single.image_references()[0].to_string(),
            "- facade: http://x/1.jpg"
        );
    }

    #[test]
    fn test_non_project_documents_have_no_images() {
        let doc = RetrievedDocument::new(
            "Locality guide",
            DocumentMetadata::from_value(json!({
                "type": "locality",
                "images": {"map": "http://x/map.png"}
            })),
        );
        assert!(doc.image_references().is_empty());
    }

    #[test]
    fn test_from_value_is_lenient() {
        let meta = DocumentMetadata::from_value(json!({
            "type": 7,
            "images": {"bad": 3, "ok": ["http://x/a.jpg", 5]},
            "city": "Mumbai"
        }));
        assert_eq!(meta.doc_type, None);
        assert_eq!(meta.images.len(), 1);
        assert_eq!(
            meta.images["ok"],
            ImageSource::Many(vec!["http://x/a.jpg".to_string()])
        );
        assert_eq!(meta.extra["city"], json!("Mumbai"));

        assert_eq!(DocumentMetadata::from_value(json!("nope")), DocumentMetadata::default());
    }

    #[test]
    fn test_metadata_value_round_trip_keeps_type() {
        let meta = DocumentMetadata::project()
            .with_image("lobby", ImageSource::Single("http://x/l.jpg".into()));
        let value = meta.to_value();
        assert_eq!(value["type"], json!("project"));
        assert_eq!(DocumentMetadata::from_value(value), meta);
    }
}
