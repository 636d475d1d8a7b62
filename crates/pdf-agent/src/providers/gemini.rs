//! Gemini chat and embedding providers via the Generative Language API
//!
//! Authenticates with an API key (`x-goog-api-key`). Chat goes through
//! `generateContent`, embeddings through `embedContent` for queries and
//! `batchEmbedContents` for documents.

use async_trait::async_trait;
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use std::time::Duration;

use crate::config::{EmbeddingConfig, LlmConfig};
use crate::error::{Error, Result};

use super::embedding::EmbeddingProvider;
use super::llm::{ChatModel, ChatRequest, Role};

/// Shared HTTP client for the Generative Language API
pub struct GeminiClient {
    http: reqwest::Client,
    base_url: String,
    api_key: Option<String>,
}

impl GeminiClient {
    /// Create a client from LLM config and an optional API key.
    ///
    /// A missing key is accepted here so the server can start; every call
    /// made without one fails with a configuration error.
    pub fn new(config: &LlmConfig, api_key: Option<String>) -> Result<Self> {
        let mut builder = reqwest::Client::builder();
        if let Some(secs) = config.timeout_secs {
            builder = builder.timeout(Duration::from_secs(secs));
        }
        let http = builder
            .build()
            .map_err(|e| Error::Config(format!("Failed to build HTTP client: {}", e)))?;

        Ok(Self {
            http,
            base_url: config.base_url.trim_end_matches('/').to_string(),
            api_key,
        })
    }

    /// `{base_url}/{model}:{method}`, accepting model names with or without `models/`
    fn endpoint(&self, model: &str, method: &str) -> String {
        format!("{}/{}:{}", self.base_url, qualified_model(model), method)
    }

    async fn post<B, R, E>(&self, url: &str, body: &B, to_error: E) -> Result<R>
    where
        B: Serialize + ?Sized,
        R: DeserializeOwned,
        E: Fn(String) -> Error,
    {
        let api_key = self
            .api_key
            .as_deref()
            .ok_or_else(|| Error::Config("GOOGLE_API_KEY is not set".to_string()))?;

        let response = self
            .http
            .post(url)
            .header("x-goog-api-key", api_key)
            .json(body)
            .send()
            .await
            .map_err(|e| to_error(format!("Gemini request failed: {}", e)))?;

        if !response.status().is_success() {
            let status = response.status();
            let body = response.text().await.unwrap_or_default();
            return Err(to_error(format!("Gemini call failed ({}): {}", status, body)));
        }

        response
            .json()
            .await
            .map_err(|e| to_error(format!("Failed to parse Gemini response: {}", e)))
    }
}

fn qualified_model(model: &str) -> String {
    if model.starts_with("models/") {
        model.to_string()
    } else {
        format!("models/{}", model)
    }
}

// ---- generateContent wire types ----

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct GenerateRequest {
    contents: Vec<Content>,
    #[serde(skip_serializing_if = "Option::is_none")]
    system_instruction: Option<Content>,
    generation_config: GenerationConfig,
}

#[derive(Debug, Serialize, Deserialize)]
struct Content {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    role: Option<String>,
    #[serde(default)]
    parts: Vec<Part>,
}

#[derive(Debug, Serialize, Deserialize)]
struct Part {
    #[serde(default)]
    text: String,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct GenerationConfig {
    temperature: f32,
    max_output_tokens: u32,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    stop_sequences: Vec<String>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct GenerateResponse {
    #[serde(default)]
    candidates: Vec<Candidate>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct Candidate {
    content: Option<Content>,
    finish_reason: Option<String>,
}

/// Gemini chat model with fixed sampling settings
pub struct GeminiChat {
    client: Arc<GeminiClient>,
    model: String,
    temperature: f32,
    max_output_tokens: u32,
}

impl GeminiChat {
    /// Create a chat model using `config.model`
    pub fn new(client: Arc<GeminiClient>, config: &LlmConfig) -> Self {
        Self {
            client,
            model: config.model.clone(),
            temperature: config.temperature,
            max_output_tokens: config.max_output_tokens,
        }
    }

    /// Use a different model with the same client and sampling settings
    pub fn with_model(mut self, model: impl Into<String>) -> Self {
        self.model = model.into();
        self
    }

    fn build_request(&self, request: ChatRequest) -> GenerateRequest {
        let mut system = Vec::new();
        let mut contents = Vec::new();

        for message in request.messages {
            match message.role {
                Role::System => system.push(message.content),
                Role::User | Role::Assistant => {
                    let role = if message.role == Role::User { "user" } else { "model" };
                    contents.push(Content {
                        role: Some(role.to_string()),
                        parts: vec![Part {
                            text: message.content,
                        }],
                    });
                }
            }
        }

        // generateContent rejects a request with no turns
        if contents.is_empty() {
            contents.push(Content {
                role: Some("user".to_string()),
                parts: vec![Part {
                    text: system.join("\n\n"),
                }],
            });
            system.clear();
        }

        GenerateRequest {
            contents,
            system_instruction: (!system.is_empty()).then(|| Content {
                role: None,
                parts: vec![Part {
                    text: system.join("\n\n"),
                }],
            }),
            generation_config: GenerationConfig {
                temperature: self.temperature,
                max_output_tokens: self.max_output_tokens,
                stop_sequences: request.stop,
            },
        }
    }
}

fn response_text(response: GenerateResponse) -> Result<String> {
    let candidate = response
        .candidates
        .into_iter()
        .next()
        .ok_or_else(|| Error::llm("No candidates in Gemini response"))?;

    match candidate.content {
        Some(content) if !content.parts.is_empty() => Ok(content
            .parts
            .into_iter()
            .map(|p| p.text)
            .collect::<Vec<_>>()
            .concat()),
        _ => Err(Error::llm(format!(
            "Gemini returned no text (finish reason: {})",
            candidate.finish_reason.as_deref().unwrap_or("unknown")
        ))),
    }
}

#[async_trait]
impl ChatModel for GeminiChat {
    async fn complete(&self, request: ChatRequest) -> Result<String> {
        let body = self.build_request(request);
        let url = self.client.endpoint(&self.model, "generateContent");

        tracing::debug!(model = %self.model, turns = body.contents.len(), "Calling Gemini");
        let response: GenerateResponse = self.client.post(&url, &body, Error::Llm).await?;
        response_text(response)
    }

    fn name(&self) -> &str {
        "gemini"
    }

    fn model(&self) -> &str {
        &self.model
    }
}

// ---- embedContent wire types ----

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct EmbedRequest {
    model: String,
    content: Content,
    task_type: &'static str,
}

#[derive(Debug, Serialize)]
struct BatchEmbedRequest {
    requests: Vec<EmbedRequest>,
}

#[derive(Debug, Deserialize)]
struct EmbedResponse {
    embedding: EmbeddingValues,
}

#[derive(Debug, Deserialize)]
struct BatchEmbedResponse {
    #[serde(default)]
    embeddings: Vec<EmbeddingValues>,
}

#[derive(Debug, Deserialize)]
struct EmbeddingValues {
    values: Vec<f32>,
}

/// Gemini embedding provider (embedding-001, 768 dimensions)
pub struct GeminiEmbedder {
    client: Arc<GeminiClient>,
    model: String,
    dimensions: usize,
    batch_size: usize,
}

impl GeminiEmbedder {
    pub fn new(client: Arc<GeminiClient>, config: &EmbeddingConfig) -> Self {
        Self {
            client,
            model: qualified_model(&config.model),
            dimensions: config.dimensions,
            batch_size: config.batch_size.max(1),
        }
    }

    fn embed_request(&self, text: &str, task_type: &'static str) -> EmbedRequest {
        EmbedRequest {
            model: self.model.clone(),
            content: Content {
                role: None,
                parts: vec![Part {
                    text: text.to_string(),
                }],
            },
            task_type,
        }
    }
}

#[async_trait]
impl EmbeddingProvider for GeminiEmbedder {
    async fn embed(&self, text: &str) -> Result<Vec<f32>> {
        let body = self.embed_request(text, "RETRIEVAL_QUERY");
        let url = self.client.endpoint(&self.model, "embedContent");
        let response: EmbedResponse = self.client.post(&url, &body, Error::Embedding).await?;
        Ok(response.embedding.values)
    }

    async fn embed_batch(&self, texts: &[String]) -> Result<Vec<Vec<f32>>> {
        let url = self.client.endpoint(&self.model, "batchEmbedContents");
        let mut embeddings = Vec::with_capacity(texts.len());

        for batch in texts.chunks(self.batch_size) {
            let body = BatchEmbedRequest {
                requests: batch
                    .iter()
                    .map(|text| self.embed_request(text, "RETRIEVAL_DOCUMENT"))
                    .collect(),
            };

            let response: BatchEmbedResponse =
                self.client.post(&url, &body, Error::Embedding).await?;
            if response.embeddings.len() != batch.len() {
                return Err(Error::embedding(format!(
                    "Expected {} embeddings, got {}",
                    batch.len(),
                    response.embeddings.len()
                )));
            }
            embeddings.extend(response.embeddings.into_iter().map(|e| e.values));
        }

        tracing::debug!("Embedded {} documents with {}", embeddings.len(), self.model);
        Ok(embeddings)
    }

    fn dimensions(&self) -> usize {
        self.dimensions
    }

    fn name(&self) -> &str {
        "gemini"
    }
}
