//! Retrieval QA chain: retrieve, stuff, answer

use std::sync::Arc;

use crate::error::Result;
use crate::providers::{ChatMessage, ChatModel, ChatRequest};
use crate::retrieval::SelfQueryRetriever;
use crate::types::DocumentChunk;

use super::prompt::PromptBuilder;

/// Answer produced by the chain with the chunks it was grounded on
#[derive(Debug, Clone)]
pub struct ChainAnswer {
    pub answer: String,
    pub context: Vec<DocumentChunk>,
}

/// Retrieval-augmented QA over the self-query retriever
pub struct RetrievalChain {
    retriever: Arc<SelfQueryRetriever>,
    llm: Arc<dyn ChatModel>,
}

impl RetrievalChain {
    pub fn new(retriever: Arc<SelfQueryRetriever>, llm: Arc<dyn ChatModel>) -> Self {
        Self { retriever, llm }
    }

    /// Run the chain for one question
    pub async fn invoke(&self, input: &str) -> Result<ChainAnswer> {
        let context = self.retriever.retrieve(input).await?;
        let system = PromptBuilder::build_system_prompt(&PromptBuilder::build_context(&context));

        let answer = self
            .llm
            .complete(ChatRequest::new(vec![
                ChatMessage::system(system),
                ChatMessage::user(input),
            ]))
            .await?;

        Ok(ChainAnswer { answer, context })
    }
}
