//! Application state for the PDF agent server

use parking_lot::RwLock;
use std::path::Path;
use std::sync::Arc;

use crate::agent::{ReactAgent, ToolRegistry};
use crate::config::{AgentConfig, VectorStoreBackend};
use crate::error::{Error, Result};
use crate::ingestion::{IngestPipeline, MetadataOverrides};
use crate::providers::{
    ChatModel, DuckDuckGoSearch, EmbeddingProvider, GeminiChat, GeminiClient, GeminiEmbedder,
    MemoryVectorStore, PineconeStore, VectorStoreProvider, WebSearchProvider,
};
use crate::retrieval::SelfQueryRetriever;
use crate::tools::{PdfQaTool, WebSearchTool};

pub use crate::tools::RetrieverSlot;

/// Shared application state
#[derive(Clone)]
pub struct AppState {
    inner: Arc<AppStateInner>,
}

struct AppStateInner {
    /// Configuration
    config: AgentConfig,
    /// Embedding provider (documents and queries)
    embedder: Arc<dyn EmbeddingProvider>,
    /// Chat model shared by the agent, the QA chain and the query constructor
    llm: Arc<dyn ChatModel>,
    /// Vector store holding uploaded chunks
    vector_store: Arc<dyn VectorStoreProvider>,
    /// Retriever handle, empty until initialization succeeds
    retriever: RetrieverSlot,
    /// Agent answering `/ask`
    agent: ReactAgent,
    /// PDF load + split pipeline
    pipeline: IngestPipeline,
}

impl AppState {
    /// Build state from configuration, constructing the configured providers.
    ///
    /// Does not contact any provider; call [`AppState::initialize_retriever`]
    /// to attach to the index.
    pub fn from_config(config: AgentConfig) -> Result<Self> {
        tracing::info!(
            "Initializing application state (vector store: {:?}, index: {})",
            config.vector_store.backend,
            config.vector_store.index_name
        );

        let gemini = Arc::new(GeminiClient::new(
            &config.llm,
            config.credentials.google_api_key.clone(),
        )?);
        let embedder: Arc<dyn EmbeddingProvider> =
            Arc::new(GeminiEmbedder::new(gemini.clone(), &config.embeddings));
        let llm: Arc<dyn ChatModel> = Arc::new(GeminiChat::new(gemini, &config.llm));

        let vector_store: Arc<dyn VectorStoreProvider> = match config.vector_store.backend {
            VectorStoreBackend::Pinecone => Arc::new(PineconeStore::new(
                &config.vector_store,
                config.credentials.pinecone_api_key.clone(),
            )?),
            VectorStoreBackend::Memory => {
                tracing::warn!("Using in-memory vector store; indexed chunks are lost on restart");
                Arc::new(MemoryVectorStore::new(embedder.dimensions()))
            }
        };

        let web_search: Arc<dyn WebSearchProvider> =
            Arc::new(DuckDuckGoSearch::new(&config.web_search)?);

        Ok(Self::new(config, embedder, llm, vector_store, web_search))
    }

    /// Build state from explicit providers
    pub fn new(
        config: AgentConfig,
        embedder: Arc<dyn EmbeddingProvider>,
        llm: Arc<dyn ChatModel>,
        vector_store: Arc<dyn VectorStoreProvider>,
        web_search: Arc<dyn WebSearchProvider>,
    ) -> Self {
        let retriever: RetrieverSlot = Arc::new(RwLock::new(None));

        // PDF_QA first, WebSearch second
        let tools = ToolRegistry::new()
            .with(Arc::new(PdfQaTool::new(retriever.clone(), llm.clone())))
            .with(Arc::new(WebSearchTool::new(
                web_search,
                config.web_search.max_results,
            )));
        let agent = ReactAgent::new("pdf_agent", llm.clone(), tools)
            .with_max_iterations(config.agent.max_iterations);

        let pipeline =
            IngestPipeline::new(config.chunking.chunk_size, config.chunking.chunk_overlap);

        Self {
            inner: Arc::new(AppStateInner {
                config,
                embedder,
                llm,
                vector_store,
                retriever,
                agent,
                pipeline,
            }),
        }
    }

    /// Attach to the existing index and install a fresh self-query retriever.
    ///
    /// On failure the previous retriever (if any) stays in place.
    pub async fn initialize_retriever(&self) -> Result<()> {
        self.inner.vector_store.ensure_index().await?;

        let retriever = SelfQueryRetriever::new(
            self.inner.llm.clone(),
            self.inner.embedder.clone(),
            self.inner.vector_store.clone(),
            self.inner.config.vector_store.top_k,
        );
        *self.inner.retriever.write() = Some(Arc::new(retriever));

        tracing::info!(
            "Retriever initialized on {} index '{}'",
            self.inner.vector_store.name(),
            self.inner.config.vector_store.index_name
        );
        Ok(())
    }

    /// Check if state is ready to answer questions
    pub fn is_ready(&self) -> bool {
        self.inner.retriever.read().is_some()
    }

    /// Load, split, embed and append the PDF at `path`.
    ///
    /// Returns the number of chunks stored. Chunks are appended; nothing is
    /// rolled back if a later upsert batch fails.
    pub async fn index_pdf(&self, path: &Path, overrides: MetadataOverrides) -> Result<usize> {
        let state = self.clone();
        let path_buf = path.to_path_buf();
        let mut chunks = tokio::task::spawn_blocking(move || {
            state.inner.pipeline.chunk_file(&path_buf, &overrides)
        })
        .await
        .map_err(|e| Error::internal(format!("PDF processing task failed: {}", e)))??;

        if chunks.is_empty() {
            tracing::warn!("No text extracted from {}; nothing indexed", path.display());
            return Ok(0);
        }

        let texts: Vec<String> = chunks.iter().map(|c| c.content.clone()).collect();
        let embeddings = self.inner.embedder.embed_batch(&texts).await?;
        if embeddings.len() != chunks.len() {
            return Err(Error::embedding(format!(
                "Expected {} embeddings, got {}",
                chunks.len(),
                embeddings.len()
            )));
        }
        for (chunk, embedding) in chunks.iter_mut().zip(embeddings) {
            chunk.embedding = embedding;
        }

        let stored = self.inner.vector_store.add_chunks(&chunks).await?;
        tracing::info!(
            "Indexed {} chunks from {} into {}",
            stored,
            path.display(),
            self.inner.vector_store.name()
        );
        Ok(stored)
    }

    /// Answer a question with the agent.
    ///
    /// Refuses before touching the agent when no retriever is attached.
    pub async fn ask(&self, query: &str) -> Result<String> {
        if !self.is_ready() {
            return Err(Error::RetrieverNotInitialized);
        }

        let outcome = self.inner.agent.run(query).await?;
        tracing::info!("Answered after {} tool calls", outcome.steps.len());
        Ok(outcome.output)
    }

    /// Get configuration
    pub fn config(&self) -> &AgentConfig {
        &self.inner.config
    }
}
