//! Chat model trait and message types

use async_trait::async_trait;
use serde::{Deserialize, Serialize};

use crate::error::Result;

/// Speaker of a chat message
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Role {
    System,
    User,
    Assistant,
}

/// A single chat message
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ChatMessage {
    pub role: Role,
    pub content: String,
}

impl ChatMessage {
    pub fn system(content: impl Into<String>) -> Self {
        Self {
            role: Role::System,
            content: content.into(),
        }
    }

    pub fn user(content: impl Into<String>) -> Self {
        Self {
            role: Role::User,
            content: content.into(),
        }
    }

    pub fn assistant(content: impl Into<String>) -> Self {
        Self {
            role: Role::Assistant,
            content: content.into(),
        }
    }
}

/// A completion request
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ChatRequest {
    /// Conversation, oldest first
    pub messages: Vec<ChatMessage>,
    /// Sequences that end generation early
    pub stop: Vec<String>,
}

impl ChatRequest {
    pub fn new(messages: Vec<ChatMessage>) -> Self {
        Self {
            messages,
            stop: Vec::new(),
        }
    }

    /// Single user-turn request
    pub fn prompt(text: impl Into<String>) -> Self {
        Self::new(vec![ChatMessage::user(text)])
    }

    pub fn with_stop(mut self, stop: impl IntoIterator<Item = impl Into<String>>) -> Self {
        self.stop = stop.into_iter().map(Into::into).collect();
        self
    }
}

/// Trait for chat-completion LLMs
///
/// Sampling settings (temperature, output token limit) are fixed when the
/// model is constructed.
///
/// Implementations:
/// - `GeminiChat`: Google Generative Language API (gemini-2.0-flash, gemini-1.5-flash)
#[async_trait]
pub trait ChatModel: Send + Sync {
    /// Generate the next assistant message
    async fn complete(&self, request: ChatRequest) -> Result<String>;

    /// Get provider name for logging
    fn name(&self) -> &str;

    /// Get the model being used
    fn model(&self) -> &str;
}
