//! Ingestion pipeline: load a PDF, tag it, split it into chunks

use std::path::Path;

use crate::error::Result;
use crate::types::DocumentChunk;

use super::parser::PdfLoader;
use super::splitter::RecursiveCharacterSplitter;

/// Caller-supplied metadata that overrides what the PDF declares
#[derive(Debug, Clone, Default)]
pub struct MetadataOverrides {
    pub title: Option<String>,
    pub author: Option<String>,
    pub document_type: Option<String>,
}

/// Load + split pipeline
pub struct IngestPipeline {
    splitter: RecursiveCharacterSplitter,
}

impl IngestPipeline {
    /// Create a new ingestion pipeline
    pub fn new(chunk_size: usize, chunk_overlap: usize) -> Self {
        Self {
            splitter: RecursiveCharacterSplitter::new(chunk_size, chunk_overlap),
        }
    }

    /// Load the PDF at `path` and split it into chunks
    pub fn chunk_file(
        &self,
        path: impl AsRef<Path>,
        overrides: &MetadataOverrides,
    ) -> Result<Vec<DocumentChunk>> {
        let mut pages = PdfLoader::load(path)?;

        for page in pages.iter_mut() {
            if let Some(title) = &overrides.title {
                page.metadata.title = Some(title.clone());
            }
            if let Some(author) = &overrides.author {
                page.metadata.author = Some(author.clone());
            }
            if let Some(document_type) = &overrides.document_type {
                page.metadata.document_type = Some(document_type.clone());
            }
        }

        Ok(self.splitter.split_pages(&pages))
    }
}

impl Default for IngestPipeline {
    fn default() -> Self {
        Self::new(500, 200)
    }
}
