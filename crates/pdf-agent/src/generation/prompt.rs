//! Prompt templates for question answering over retrieved chunks

use crate::types::DocumentChunk;

/// System prompt for the retrieval QA chain. `{context}` is replaced with
/// the retrieved chunk texts.
pub const QA_SYSTEM_PROMPT: &str = "You're an assistant for Question Answering tasks. \
Use the retrieved context or online tools to answer the question. \
If you don't know the answer, use the search_tool for web searching. \
Answer in 3 sentences max.\n\n{context}";

/// Prompt builder for retrieval QA
pub struct PromptBuilder;

impl PromptBuilder {
    /// Stuff chunk texts into one context block, separated by blank lines
    pub fn build_context(chunks: &[DocumentChunk]) -> String {
        chunks
            .iter()
            .map(|chunk| chunk.content.as_str())
            .collect::<Vec<_>>()
            .join("\n\n")
    }

    /// Fill the QA system prompt with `context`
    pub fn build_system_prompt(context: &str) -> String {
        QA_SYSTEM_PROMPT.replace("{context}", context)
    }
}
