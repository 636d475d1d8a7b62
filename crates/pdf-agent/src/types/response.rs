//! Response types

use serde::{Deserialize, Serialize};

/// Body returned by `POST /upload-pdf`
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct UploadResponse {
    /// Human-readable confirmation naming the file
    pub message: String,
}

impl UploadResponse {
    /// Confirmation for an indexed file
    pub fn indexed(filename: &str) -> Self {
        Self {
            message: format!("File '{}' uploaded and indexed successfully.", filename),
        }
    }
}

/// Body returned by `POST /ask`
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AskResponse {
    /// Final answer produced by the agent
    pub answer: String,
}

/// Generic `{"message": ...}` body
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MessageResponse {
    pub message: String,
}

impl MessageResponse {
    pub fn new(message: impl Into<String>) -> Self {
        Self {
            message: message.into(),
        }
    }
}
