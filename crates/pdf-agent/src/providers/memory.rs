//! In-process vector store
//!
//! Brute-force cosine search over a `DashMap`. Contents are lost on restart;
//! used for local runs (`backend = "memory"`) and tests.

use async_trait::async_trait;
use dashmap::DashMap;
use uuid::Uuid;

use crate::error::{Error, Result};
use crate::retrieval::Filter;
use crate::types::DocumentChunk;

use super::vector_store::{VectorSearchResult, VectorStoreProvider};

/// In-memory vector store
pub struct MemoryVectorStore {
    chunks: DashMap<Uuid, DocumentChunk>,
    dimensions: usize,
}

impl MemoryVectorStore {
    pub fn new(dimensions: usize) -> Self {
        Self {
            chunks: DashMap::new(),
            dimensions,
        }
    }
}

fn cosine_similarity(a: &[f32], b: &[f32]) -> f32 {
    let dot: f32 = a.iter().zip(b).map(|(x, y)| x * y).sum();
    let norm_a: f32 = a.iter().map(|x| x * x).sum::<f32>().sqrt();
    let norm_b: f32 = b.iter().map(|x| x * x).sum::<f32>().sqrt();

    if norm_a == 0.0 || norm_b == 0.0 {
        0.0
    } else {
        dot / (norm_a * norm_b)
    }
}

#[async_trait]
impl VectorStoreProvider for MemoryVectorStore {
    async fn ensure_index(&self) -> Result<()> {
        Ok(())
    }

    async fn add_chunks(&self, chunks: &[DocumentChunk]) -> Result<usize> {
        for chunk in chunks {
            if chunk.embedding.len() != self.dimensions {
                return Err(Error::vector_db(format!(
                    "Chunk {} has {} dimensions, index expects {}",
                    chunk.id,
                    chunk.embedding.len(),
                    self.dimensions
                )));
            }
        }

        for chunk in chunks {
            self.chunks.insert(chunk.id, chunk.clone());
        }
        Ok(chunks.len())
    }

    async fn search(
        &self,
        query_embedding: &[f32],
        top_k: usize,
        filter: Option<&Filter>,
    ) -> Result<Vec<VectorSearchResult>> {
        let mut results: Vec<VectorSearchResult> = self
            .chunks
            .iter()
            .filter(|entry| filter.map_or(true, |f| f.matches(&entry.metadata)))
            .map(|entry| {
                let mut chunk = entry.value().clone();
                let similarity = cosine_similarity(query_embedding, &chunk.embedding);
                chunk.embedding = Vec::new();
                VectorSearchResult { chunk, similarity }
            })
            .collect();

        results.sort_by(|a, b| b.similarity.total_cmp(&a.similarity));
        results.truncate(top_k);
        Ok(results)
    }

    async fn len(&self) -> Result<usize> {
        Ok(self.chunks.len())
    }

    fn name(&self) -> &str {
        "memory"
    }
}
