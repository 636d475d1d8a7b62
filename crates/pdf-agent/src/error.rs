//! Error types for the PDF agent

use axum::{
    extract::{multipart::MultipartRejection, rejection::JsonRejection},
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde_json::json;
use thiserror::Error;

/// Result type alias for agent operations
pub type Result<T> = std::result::Result<T, Error>;

/// Message returned by `/ask` while no retriever is attached
pub const RETRIEVER_NOT_INITIALIZED: &str = "Retriever is not initialized. Upload a document first.";

/// PDF agent errors
#[derive(Debug, Error)]
pub enum Error {
    /// Configuration error
    #[error("Configuration error: {0}")]
    Config(String),

    /// PDF loading error
    #[error("Failed to load PDF '{filename}': {message}")]
    Pdf { filename: String, message: String },

    /// Embedding error
    #[error("Embedding generation failed: {0}")]
    Embedding(String),

    /// Vector database error
    #[error("Vector database error: {0}")]
    VectorDb(String),

    /// Chat model error
    #[error("LLM error: {0}")]
    Llm(String),

    /// Web search error
    #[error("Web search failed: {0}")]
    WebSearch(String),

    /// A tool rejected its input or failed
    #[error("Tool '{tool}' failed: {message}")]
    Tool { tool: String, message: String },

    /// Agent output could not be parsed or the loop failed
    #[error("Agent error: {0}")]
    Agent(String),

    /// Supervisor could not pick an agent
    #[error("Routing error: {0}")]
    Routing(String),

    /// Structured query filter could not be parsed or translated
    #[error("Filter error: {0}")]
    Filter(String),

    /// Request body was rejected before reaching a handler
    #[error("{message}")]
    Rejected { status: StatusCode, message: String },

    /// `/ask` was called before the retriever was attached
    #[error("{}", RETRIEVER_NOT_INITIALIZED)]
    RetrieverNotInitialized,

    /// IO error
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// JSON error
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    /// Internal error
    #[error("Internal error: {0}")]
    Internal(String),
}

impl Error {
    /// Create a PDF loading error
    pub fn pdf(filename: impl Into<String>, message: impl Into<String>) -> Self {
        Self::Pdf {
            filename: filename.into(),
            message: message.into(),
        }
    }

    /// Create a tool error
    pub fn tool(tool: impl Into<String>, message: impl Into<String>) -> Self {
        Self::Tool {
            tool: tool.into(),
            message: message.into(),
        }
    }

    /// Create an embedding error
    pub fn embedding(message: impl Into<String>) -> Self {
        Self::Embedding(message.into())
    }

    /// Create a vector db error
    pub fn vector_db(message: impl Into<String>) -> Self {
        Self::VectorDb(message.into())
    }

    /// Create an LLM error
    pub fn llm(message: impl Into<String>) -> Self {
        Self::Llm(message.into())
    }

    /// Create an internal error
    pub fn internal(message: impl Into<String>) -> Self {
        Self::Internal(message.into())
    }

    /// HTTP status reported to callers.
    ///
    /// The missing-retriever precondition and rejected request bodies are
    /// client errors; every other failure collapses into a server error
    /// carrying its message.
    pub fn status_code(&self) -> StatusCode {
        match self {
            Error::RetrieverNotInitialized => StatusCode::BAD_REQUEST,
            Error::Rejected { status, .. } => *status,
            _ => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }
}

impl From<JsonRejection> for Error {
    fn from(rejection: JsonRejection) -> Self {
        Self::Rejected {
            status: rejection.status(),
            message: rejection.body_text(),
        }
    }
}

impl From<MultipartRejection> for Error {
    fn from(rejection: MultipartRejection) -> Self {
        Self::Rejected {
            status: rejection.status(),
            message: rejection.body_text(),
        }
    }
}

impl IntoResponse for Error {
    fn into_response(self) -> Response {
        let status = self.status_code();
        if status.is_server_error() {
            tracing::error!("Request failed: {}", self);
        }

        let body = Json(json!({ "detail": self.to_string() }));
        (status, body).into_response()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_not_initialized_is_client_error() {
        let err = Error::RetrieverNotInitialized;
        assert_eq!(err.status_code(), StatusCode::BAD_REQUEST);
        assert_eq!(err.to_string(), RETRIEVER_NOT_INITIALIZED);
    }

    #[test]
    fn test_everything_else_is_server_error() {
        let errors = [
            Error::pdf("broken.pdf", "not a PDF"),
            Error::embedding("quota"),
            Error::vector_db("index missing"),
            Error::llm("timeout"),
            Error::tool("WebSearch", "blocked"),
            Error::Agent("unparseable".to_string()),
        ];
        for err in errors {
            assert_eq!(err.status_code(), StatusCode::INTERNAL_SERVER_ERROR);
            assert!(!err.to_string().is_empty());
        }
    }

    #[test]
    fn test_pdf_error_names_file() {
        let err = Error::pdf("cv.pdf", "Invalid file header");
        assert_eq!(err.to_string(), "Failed to load PDF 'cv.pdf': Invalid file header");
    }
}
