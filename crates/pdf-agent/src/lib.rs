//! pdf-agent: PDF question answering with an agent that can fall back to web search
//!
//! The crate wires third-party collaborators (Gemini embeddings and chat,
//! a Pinecone index, DuckDuckGo search) behind provider traits and composes
//! them into two programs:
//!
//! - an HTTP service that indexes uploaded PDFs and answers questions through
//!   a ReAct agent holding a retrieval tool and a web search tool;
//! - a supervisor demo that routes a query to one of two tool-using agents.

pub mod agent;
pub mod config;
pub mod error;
pub mod generation;
pub mod ingestion;
pub mod providers;
pub mod retrieval;
pub mod server;
pub mod supervisor;
pub mod tools;
pub mod types;

pub use config::AgentConfig;
pub use error::{Error, Result};
pub use types::{
    document::{ChunkMetadata, DocumentChunk},
    query::AskRequest,
    response::{AskResponse, UploadResponse},
};
