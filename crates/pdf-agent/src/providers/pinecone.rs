//! Pinecone vector store over the REST API
//!
//! The index must already exist. Its data-plane host is resolved once through
//! the control plane (`GET /indexes/{name}`) and cached. Chunk text travels in
//! the `text` metadata field next to the filterable attributes.

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use std::collections::HashMap;
use std::time::Duration;
use tokio::sync::OnceCell;
use uuid::Uuid;

use crate::config::VectorStoreConfig;
use crate::error::{Error, Result};
use crate::retrieval::{Filter, FilterSupport};
use crate::types::{ChunkMetadata, DocumentChunk};

use super::vector_store::{VectorSearchResult, VectorStoreProvider};

const API_VERSION: &str = "2024-07";
const TEXT_KEY: &str = "text";

/// Pinecone index client
pub struct PineconeStore {
    http: reqwest::Client,
    api_key: Option<String>,
    controller_url: String,
    index_name: String,
    namespace: Option<String>,
    upsert_batch_size: usize,
    host: OnceCell<String>,
}

#[derive(Debug, Deserialize)]
struct IndexDescription {
    host: String,
    #[serde(default)]
    dimension: Option<usize>,
}

#[derive(Debug, Serialize)]
struct UpsertRequest<'a> {
    vectors: Vec<PineconeVector<'a>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    namespace: Option<&'a str>,
}

#[derive(Debug, Serialize)]
struct PineconeVector<'a> {
    id: String,
    values: &'a [f32],
    metadata: Map<String, Value>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct UpsertResponse {
    #[serde(default)]
    upserted_count: usize,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct QueryRequest<'a> {
    vector: &'a [f32],
    top_k: usize,
    include_metadata: bool,
    include_values: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    filter: Option<Value>,
    #[serde(skip_serializing_if = "Option::is_none")]
    namespace: Option<&'a str>,
}

#[derive(Debug, Deserialize)]
struct QueryResponse {
    #[serde(default)]
    matches: Vec<QueryMatch>,
}

#[derive(Debug, Deserialize)]
struct QueryMatch {
    id: String,
    #[serde(default)]
    score: f32,
    #[serde(default)]
    metadata: Option<Map<String, Value>>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct IndexStats {
    #[serde(default)]
    total_vector_count: usize,
    #[serde(default)]
    namespaces: HashMap<String, NamespaceStats>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct NamespaceStats {
    #[serde(default)]
    vector_count: usize,
}

impl PineconeStore {
    /// Create a store for `config.index_name`. Nothing is contacted until first use.
    pub fn new(config: &VectorStoreConfig, api_key: Option<String>) -> Result<Self> {
        let mut builder = reqwest::Client::builder();
        if let Some(secs) = config.timeout_secs {
            builder = builder.timeout(Duration::from_secs(secs));
        }
        let http = builder
            .build()
            .map_err(|e| Error::Config(format!("Failed to build HTTP client: {}", e)))?;

        Ok(Self {
            http,
            api_key,
            controller_url: config.controller_url.trim_end_matches('/').to_string(),
            index_name: config.index_name.clone(),
            namespace: config.namespace.clone(),
            upsert_batch_size: config.upsert_batch_size.max(1),
            host: OnceCell::new(),
        })
    }

    fn api_key(&self) -> Result<&str> {
        self.api_key
            .as_deref()
            .ok_or_else(|| Error::Config("PINECONE_API_KEY is not set".to_string()))
    }

    async fn host(&self) -> Result<&str> {
        let host = self
            .host
            .get_or_try_init(|| async {
                let url = format!("{}/indexes/{}", self.controller_url, self.index_name);
                let response = self
                    .http
                    .get(&url)
                    .header("Api-Key", self.api_key()?)
                    .header("X-Pinecone-API-Version", API_VERSION)
                    .send()
                    .await
                    .map_err(|e| Error::vector_db(format!("Pinecone request failed: {}", e)))?;

                if !response.status().is_success() {
                    let status = response.status();
                    let body = response.text().await.unwrap_or_default();
                    return Err(Error::vector_db(format!(
                        "Index '{}' is not available ({}): {}",
                        self.index_name, status, body
                    )));
                }

                let description: IndexDescription = response.json().await.map_err(|e| {
                    Error::vector_db(format!("Failed to parse index description: {}", e))
                })?;

                tracing::info!(
                    index = %self.index_name,
                    host = %description.host,
                    dimension = ?description.dimension,
                    "Attached to Pinecone index"
                );
                Ok(data_plane_url(&description.host))
            })
            .await?;
        Ok(host.as_str())
    }

    async fn post<B, R>(&self, path: &str, body: &B) -> Result<R>
    where
        B: Serialize + ?Sized,
        R: serde::de::DeserializeOwned,
    {
        let url = format!("{}{}", self.host().await?, path);
        let response = self
            .http
            .post(&url)
            .header("Api-Key", self.api_key()?)
            .header("X-Pinecone-API-Version", API_VERSION)
            .json(body)
            .send()
            .await
            .map_err(|e| Error::vector_db(format!("Pinecone request failed: {}", e)))?;

        if !response.status().is_success() {
            let status = response.status();
            let body = response.text().await.unwrap_or_default();
            return Err(Error::vector_db(format!(
                "Pinecone {} failed ({}): {}",
                path, status, body
            )));
        }

        response
            .json()
            .await
            .map_err(|e| Error::vector_db(format!("Failed to parse Pinecone response: {}", e)))
    }
}

fn data_plane_url(host: &str) -> String {
    if host.starts_with("http://") || host.starts_with("https://") {
        host.trim_end_matches('/').to_string()
    } else {
        format!("https://{}", host.trim_end_matches('/'))
    }
}

fn chunk_metadata(chunk: &DocumentChunk) -> Map<String, Value> {
    let mut metadata = chunk.metadata.to_json_map();
    metadata.insert(TEXT_KEY.to_string(), Value::String(chunk.content.clone()));
    metadata
}

fn match_to_result(m: QueryMatch) -> VectorSearchResult {
    let metadata = m.metadata.unwrap_or_default();
    let content = metadata
        .get(TEXT_KEY)
        .and_then(Value::as_str)
        .unwrap_or_default()
        .to_string();

    // vectors written by other tools may not use UUID ids
    let id = Uuid::parse_str(&m.id)
        .unwrap_or_else(|_| Uuid::new_v5(&Uuid::NAMESPACE_OID, m.id.as_bytes()));

    VectorSearchResult {
        chunk: DocumentChunk {
            id,
            content,
            metadata: ChunkMetadata::from_json_map(&metadata),
            embedding: Vec::new(),
        },
        similarity: m.score,
    }
}

#[async_trait]
impl VectorStoreProvider for PineconeStore {
    async fn ensure_index(&self) -> Result<()> {
        self.host().await.map(|_| ())
    }

    async fn add_chunks(&self, chunks: &[DocumentChunk]) -> Result<usize> {
        let mut upserted = 0;

        for batch in chunks.chunks(self.upsert_batch_size) {
            let request = UpsertRequest {
                vectors: batch
                    .iter()
                    .map(|chunk| PineconeVector {
                        id: chunk.id.to_string(),
                        values: &chunk.embedding,
                        metadata: chunk_metadata(chunk),
                    })
                    .collect(),
                namespace: self.namespace.as_deref(),
            };

            let response: UpsertResponse = self.post("/vectors/upsert", &request).await?;
            upserted += response.upserted_count;
            tracing::debug!("Upserted {} vectors into {}", upserted, self.index_name);
        }

        Ok(upserted)
    }

    async fn search(
        &self,
        query_embedding: &[f32],
        top_k: usize,
        filter: Option<&Filter>,
    ) -> Result<Vec<VectorSearchResult>> {
        let filter = match filter.map(Filter::to_pinecone).transpose() {
            Ok(filter) => filter,
            Err(e) => {
                tracing::warn!("Dropping filter Pinecone cannot express: {}", e);
                None
            }
        };

        let request = QueryRequest {
            vector: query_embedding,
            top_k,
            include_metadata: true,
            include_values: false,
            filter,
            namespace: self.namespace.as_deref(),
        };

        let response: QueryResponse = self.post("/query", &request).await?;
        Ok(response.matches.into_iter().map(match_to_result).collect())
    }

    async fn len(&self) -> Result<usize> {
        let stats: IndexStats = self
            .post("/describe_index_stats", &serde_json::json!({}))
            .await?;

        Ok(match &self.namespace {
            Some(ns) => stats.namespaces.get(ns).map_or(0, |s| s.vector_count),
            None => stats.total_vector_count,
        })
    }

    fn filter_support(&self) -> FilterSupport {
        FilterSupport::PINECONE
    }

    fn name(&self) -> &str {
        "pinecone"
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_data_plane_url() {
        assert_eq!(
            data_plane_url("pdf-index-abc.svc.aped-1.pinecone.io"),
            "https://pdf-index-abc.svc.aped-1.pinecone.io"
        );
        assert_eq!(data_plane_url("http://localhost:5081/"), "http://localhost:5081");
    }

    #[test]
    fn test_upsert_metadata_keys() {
        let mut metadata = ChunkMetadata::for_page("uploads/cv.pdf", 1);
        metadata.title = Some("CV".to_string());
        metadata.document_type = Some("CV".to_string());
        let chunk = DocumentChunk::new("Rust engineer".to_string(), metadata);

        let value = serde_json::to_value(PineconeVector {
            id: chunk.id.to_string(),
            values: &[0.5, 0.5],
            metadata: chunk_metadata(&chunk),
        })
        .unwrap();

        assert_eq!(
            value["metadata"],
            json!({
                "source": "uploads/cv.pdf",
                "page": 1,
                "title": "CV",
                "document_type": "CV",
                "text": "Rust engineer"
            })
        );
    }

    #[test]
    fn test_query_request_shape() {
        let request = QueryRequest {
            vector: &[0.1, 0.2],
            top_k: 4,
            include_metadata: true,
            include_values: false,
            filter: Some(Filter::eq("document_type", "CV").to_pinecone().unwrap()),
            namespace: None,
        };

        let value = serde_json::to_value(request).unwrap();
        assert_eq!(value["topK"], 4);
        assert_eq!(value["includeMetadata"], true);
        assert_eq!(value["filter"], json!({"document_type": {"$eq": "CV"}}));
        assert!(value.get("namespace").is_none());
    }

    #[test]
    fn test_match_to_result() {
        let id = Uuid::new_v4();
        let m: QueryMatch = serde_json::from_value(json!({
            "id": id.to_string(),
            "score": 0.87,
            "metadata": {"source": "uploads/a.pdf", "page": 2.0, "text": "hello"}
        }))
        .unwrap();

        let result = match_to_result(m);
        assert_eq!(result.chunk.id, id);
        assert_eq!(result.chunk.content, "hello");
        assert_eq!(result.chunk.metadata.page, Some(2));
        assert!((result.similarity - 0.87).abs() < 1e-6);
    }

    #[test]
    fn test_foreign_ids_are_stable() {
        let make = || QueryMatch {
            id: "doc-1#3".to_string(),
            score: 0.5,
            metadata: None,
        };
        assert_eq!(match_to_result(make()).chunk.id, match_to_result(make()).chunk.id);
    }

    #[tokio::test]
    async fn test_missing_key_is_config_error() {
        let store = PineconeStore::new(&VectorStoreConfig::default(), None).unwrap();
        let err = store.ensure_index().await.unwrap_err();
        assert!(matches!(err, Error::Config(_)));
    }

    #[test]
    fn test_constructor_prompt_omits_unsupported_filters() {
        use crate::retrieval::{document_schema, query_constructor_prompt};

        let store = PineconeStore::new(&VectorStoreConfig::default(), None).unwrap();
        let prompt = query_constructor_prompt(
            "Uploaded Data",
            &document_schema(),
            store.filter_support(),
            "Which CVs mention Rust?",
        )
        .unwrap();

        assert!(prompt.contains("(eq | ne | gt | gte | lt | lte | in | nin)"));
        assert!(prompt.contains("(and | or)"));
        assert!(!prompt.contains("contain |"));
        assert!(!prompt.contains("| like"));
        assert!(!prompt.contains("| not"));
    }
}
