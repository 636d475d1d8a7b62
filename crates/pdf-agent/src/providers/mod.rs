//! Provider abstractions for embeddings, chat models, vector storage and web search
//!
//! Every external collaborator sits behind a trait so the service can run
//! against the hosted backends (Gemini, Pinecone, DuckDuckGo) or against
//! in-process stand-ins.

pub mod duckduckgo;
pub mod embedding;
pub mod gemini;
pub mod llm;
pub mod memory;
pub mod pinecone;
pub mod vector_store;
pub mod web_search;

pub use duckduckgo::DuckDuckGoSearch;
pub use embedding::EmbeddingProvider;
pub use gemini::{GeminiChat, GeminiClient, GeminiEmbedder};
pub use llm::{ChatMessage, ChatModel, ChatRequest, Role};
pub use memory::MemoryVectorStore;
pub use pinecone::PineconeStore;
pub use vector_store::{VectorSearchResult, VectorStoreProvider};
pub use web_search::{SearchHit, WebSearchProvider};
