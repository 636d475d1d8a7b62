//! Vector store provider trait for storing and searching embeddings

use async_trait::async_trait;
use crate::error::Result;
use crate::retrieval::{Filter, FilterSupport};
use crate::types::DocumentChunk;

/// Search result from vector store
#[derive(Debug, Clone)]
pub struct VectorSearchResult {
    /// The matched chunk (without its embedding)
    pub chunk: DocumentChunk,
    /// Similarity score reported by the store (higher is more similar)
    pub similarity: f32,
}

/// Trait for vector storage and metadata-filtered similarity search
///
/// Implementations:
/// - `PineconeStore`: a pre-existing Pinecone index
/// - `MemoryVectorStore`: in-process cosine search
#[async_trait]
pub trait VectorStoreProvider: Send + Sync {
    /// Attach to the configured index, failing if it does not exist
    async fn ensure_index(&self) -> Result<()>;

    /// Append embedded chunks, returning how many were written
    async fn add_chunks(&self, chunks: &[DocumentChunk]) -> Result<usize>;

    /// Search for similar chunks, optionally restricted by a metadata filter
    async fn search(
        &self,
        query_embedding: &[f32],
        top_k: usize,
        filter: Option<&Filter>,
    ) -> Result<Vec<VectorSearchResult>>;

    /// Get total number of vectors stored
    async fn len(&self) -> Result<usize>;

    /// Comparators and operators `search` can apply
    fn filter_support(&self) -> FilterSupport {
        FilterSupport::FULL
    }

    /// Get provider name for logging
    fn name(&self) -> &str;
}
