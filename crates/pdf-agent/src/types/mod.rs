//! Core types for the PDF agent

pub mod document;
pub mod query;
pub mod response;

pub use document::{ChunkMetadata, DocumentChunk, LoadedPage};
pub use query::AskRequest;
pub use response::{AskResponse, MessageResponse, UploadResponse};
