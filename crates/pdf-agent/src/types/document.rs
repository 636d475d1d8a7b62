//! Page and chunk types with the metadata schema used for self-querying

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use uuid::Uuid;

/// Metadata attached to every page and chunk.
///
/// `source`, `title`, `author` and `document_type` form the filterable schema
/// advertised to the self-query retriever; all four are strings. `page` is
/// carried along for context but is not part of the schema.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq, Eq)]
pub struct ChunkMetadata {
    /// Path of the uploaded file in the scratch directory
    pub source: String,
    /// Zero-based page index
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub page: Option<u32>,
    /// Document title
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub title: Option<String>,
    /// Document author
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub author: Option<String>,
    /// Kind of document, e.g. CV or Report
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub document_type: Option<String>,
}

impl ChunkMetadata {
    /// Metadata for a page of `source`
    pub fn for_page(source: impl Into<String>, page: u32) -> Self {
        Self {
            source: source.into(),
            page: Some(page),
            ..Default::default()
        }
    }

    /// Look up an attribute as a JSON value (absent fields are `None`)
    pub fn get(&self, attribute: &str) -> Option<Value> {
        match attribute {
            "source" => Some(Value::String(self.source.clone())),
            "page" => self.page.map(Value::from),
            "title" => self.title.clone().map(Value::String),
            "author" => self.author.clone().map(Value::String),
            "document_type" => self.document_type.clone().map(Value::String),
            _ => None,
        }
    }

    /// Flatten into a JSON object, omitting absent fields.
    ///
    /// Vector stores reject null metadata values, so missing optional fields
    /// are left out rather than sent as `null`.
    pub fn to_json_map(&self) -> Map<String, Value> {
        let mut map = Map::new();
        for key in ["source", "page", "title", "author", "document_type"] {
            if let Some(value) = self.get(key) {
                map.insert(key.to_string(), value);
            }
        }
        map
    }

    /// Rebuild metadata from a JSON object returned by a vector store
    pub fn from_json_map(map: &Map<String, Value>) -> Self {
        let string = |key: &str| map.get(key).and_then(Value::as_str).map(str::to_string);
        Self {
            source: string("source").unwrap_or_default(),
            // Pinecone returns every number as a float
            page: map.get("page").and_then(Value::as_f64).map(|p| p as u32),
            title: string("title"),
            author: string("author"),
            document_type: string("document_type"),
        }
    }
}

/// Text of one PDF page before splitting
#[derive(Debug, Clone)]
pub struct LoadedPage {
    /// Extracted page text
    pub content: String,
    /// Page metadata
    pub metadata: ChunkMetadata,
}

/// A slice of page text ready to be embedded and stored
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DocumentChunk {
    /// Chunk ID, also used as the vector ID
    pub id: Uuid,
    /// Chunk text
    pub content: String,
    /// Metadata inherited from the page
    pub metadata: ChunkMetadata,
    /// Embedding vector (empty until embedded)
    #[serde(skip)]
    pub embedding: Vec<f32>,
}

impl DocumentChunk {
    /// Create a new chunk without an embedding
    pub fn new(content: String, metadata: ChunkMetadata) -> Self {
        Self {
            id: Uuid::new_v4(),
            content,
            metadata,
            embedding: Vec::new(),
        }
    }
}
