//! Configuration for the PDF agent service and the supervisor demo

use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

use crate::error::{Error, Result};

/// Main configuration
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct AgentConfig {
    /// Server configuration
    #[serde(default)]
    pub server: ServerConfig,
    /// Chunking configuration
    #[serde(default)]
    pub chunking: ChunkingConfig,
    /// Embedding configuration
    #[serde(default)]
    pub embeddings: EmbeddingConfig,
    /// Chat model configuration
    #[serde(default)]
    pub llm: LlmConfig,
    /// Vector store configuration
    #[serde(default)]
    pub vector_store: VectorStoreConfig,
    /// Web search configuration
    #[serde(default)]
    pub web_search: WebSearchConfig,
    /// Agent loop configuration
    #[serde(default)]
    pub agent: AgentLoopConfig,
    /// Supervisor demo configuration
    #[serde(default)]
    pub supervisor: SupervisorConfig,
    /// Provider credentials, read from the environment only
    #[serde(skip)]
    pub credentials: Credentials,
}

impl AgentConfig {
    /// Parse configuration from a TOML document
    pub fn from_toml_str(raw: &str) -> Result<Self> {
        toml::from_str(raw).map_err(|e| Error::Config(format!("Invalid config: {}", e)))
    }

    /// Load configuration from a TOML file
    pub fn from_file(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let raw = std::fs::read_to_string(path).map_err(|e| {
            Error::Config(format!("Failed to read config {}: {}", path.display(), e))
        })?;
        Self::from_toml_str(&raw)
    }

    /// Load configuration the way the binaries do.
    ///
    /// Reads `.env` into the process environment (missing file is fine), starts
    /// from the TOML file named by `PDF_AGENT_CONFIG` or from defaults, then
    /// applies environment overrides. Missing API keys are not an error here;
    /// the first provider call that needs them fails instead.
    pub fn load() -> Result<Self> {
        if let Err(e) = dotenv::dotenv() {
            tracing::debug!("No .env file loaded: {}", e);
        }

        let mut config = match std::env::var("PDF_AGENT_CONFIG") {
            Ok(path) => Self::from_file(path)?,
            Err(_) => Self::default(),
        };
        config.apply_env(|key| std::env::var(key).ok())?;
        Ok(config)
    }

    /// Apply environment overrides using the given lookup
    pub fn apply_env<F>(&mut self, lookup: F) -> Result<()>
    where
        F: Fn(&str) -> Option<String>,
    {
        if let Some(host) = lookup("PDF_AGENT_HOST") {
            self.server.host = host;
        }
        if let Some(port) = lookup("PDF_AGENT_PORT") {
            self.server.port = port
                .parse()
                .map_err(|_| Error::Config(format!("Invalid PDF_AGENT_PORT: {}", port)))?;
        }
        if let Some(dir) = lookup("PDF_AGENT_UPLOAD_DIR") {
            self.server.upload_dir = PathBuf::from(dir);
        }
        if let Some(index) = lookup("PINECONE_INDEX_NAME") {
            self.vector_store.index_name = index;
        }

        self.credentials.google_api_key = lookup("GOOGLE_API_KEY").filter(|k| !k.is_empty());
        self.credentials.pinecone_api_key = lookup("PINECONE_API_KEY").filter(|k| !k.is_empty());

        if self.credentials.google_api_key.is_none() {
            tracing::warn!("GOOGLE_API_KEY is not set; embedding and chat calls will fail");
        }
        if self.vector_store.backend == VectorStoreBackend::Pinecone
            && self.credentials.pinecone_api_key.is_none()
        {
            tracing::warn!("PINECONE_API_KEY is not set; vector store calls will fail");
        }

        Ok(())
    }
}

/// Provider API keys
#[derive(Debug, Clone, Default)]
pub struct Credentials {
    /// Google Generative Language API key (embeddings + chat)
    pub google_api_key: Option<String>,
    /// Pinecone API key
    pub pinecone_api_key: Option<String>,
}

/// Server configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ServerConfig {
    /// Host address
    pub host: String,
    /// Port number
    pub port: u16,
    /// Maximum upload size in bytes (default: 100MB)
    pub max_upload_size: usize,
    /// Scratch directory for uploaded files (never cleaned up)
    pub upload_dir: PathBuf,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            host: "0.0.0.0".to_string(),
            port: 8000,
            max_upload_size: 100 * 1024 * 1024, // 100MB
            upload_dir: PathBuf::from("uploads"),
        }
    }
}

/// Text chunking configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ChunkingConfig {
    /// Maximum chunk size in characters
    pub chunk_size: usize,
    /// Overlap between neighbouring chunks in characters
    pub chunk_overlap: usize,
}

impl Default for ChunkingConfig {
    fn default() -> Self {
        Self {
            chunk_size: 500,
            chunk_overlap: 200,
        }
    }
}

/// Embedding configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct EmbeddingConfig {
    /// Embedding model name
    pub model: String,
    /// Embedding dimensions
    pub dimensions: usize,
    /// Texts per batch request
    pub batch_size: usize,
}

impl Default for EmbeddingConfig {
    fn default() -> Self {
        Self {
            model: "models/embedding-001".to_string(),
            dimensions: 768,
            batch_size: 100,
        }
    }
}

/// Chat model configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct LlmConfig {
    /// Generative Language API base URL
    pub base_url: String,
    /// Chat model name
    pub model: String,
    /// Sampling temperature
    pub temperature: f32,
    /// Maximum output tokens per completion
    pub max_output_tokens: u32,
    /// Request timeout in seconds (unset: wait indefinitely)
    pub timeout_secs: Option<u64>,
}

impl Default for LlmConfig {
    fn default() -> Self {
        Self {
            base_url: "https://generativelanguage.googleapis.com/v1beta".to_string(),
            model: "gemini-2.0-flash".to_string(),
            temperature: 0.3,
            max_output_tokens: 250,
            timeout_secs: None,
        }
    }
}

/// Vector store backend selection
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum VectorStoreBackend {
    /// Pinecone serverless/pod index
    #[default]
    Pinecone,
    /// In-process store, lost on restart
    Memory,
}

/// Vector store configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct VectorStoreConfig {
    /// Backend provider
    pub backend: VectorStoreBackend,
    /// Name of the pre-existing index
    pub index_name: String,
    /// Namespace within the index (unset: default namespace)
    pub namespace: Option<String>,
    /// Pinecone control plane URL
    pub controller_url: String,
    /// Chunks returned per retrieval
    pub top_k: usize,
    /// Vectors per upsert request
    pub upsert_batch_size: usize,
    /// Request timeout in seconds (unset: wait indefinitely)
    pub timeout_secs: Option<u64>,
}

impl Default for VectorStoreConfig {
    fn default() -> Self {
        Self {
            backend: VectorStoreBackend::Pinecone,
            index_name: "pdf-index".to_string(),
            namespace: None,
            controller_url: "https://api.pinecone.io".to_string(),
            top_k: 4,
            upsert_batch_size: 100,
            timeout_secs: None,
        }
    }
}

/// Web search configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct WebSearchConfig {
    /// DuckDuckGo HTML endpoint
    pub endpoint: String,
    /// Results included in a tool observation
    pub max_results: usize,
}

impl Default for WebSearchConfig {
    fn default() -> Self {
        Self {
            endpoint: "https://html.duckduckgo.com/html/".to_string(),
            max_results: 4,
        }
    }
}

/// ReAct loop configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct AgentLoopConfig {
    /// Maximum thought/action rounds before giving up
    pub max_iterations: usize,
}

impl Default for AgentLoopConfig {
    fn default() -> Self {
        Self { max_iterations: 15 }
    }
}

/// Supervisor demo configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct SupervisorConfig {
    /// Chat model shared by the supervisor and its agents
    pub model: String,
}

impl Default for SupervisorConfig {
    fn default() -> Self {
        Self {
            model: "gemini-1.5-flash".to_string(),
        }
    }
}
