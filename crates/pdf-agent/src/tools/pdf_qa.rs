//! Question answering over uploaded PDFs

use async_trait::async_trait;
use parking_lot::RwLock;
use std::sync::Arc;

use crate::agent::Tool;
use crate::error::{Error, Result};
use crate::generation::RetrievalChain;
use crate::providers::ChatModel;
use crate::retrieval::SelfQueryRetriever;

/// Shared, swappable retriever handle. Empty until initialization succeeds.
pub type RetrieverSlot = Arc<RwLock<Option<Arc<SelfQueryRetriever>>>>;

/// `PDF_QA`: retrieval chain over the current retriever
pub struct PdfQaTool {
    retriever: RetrieverSlot,
    llm: Arc<dyn ChatModel>,
}

impl PdfQaTool {
    pub fn new(retriever: RetrieverSlot, llm: Arc<dyn ChatModel>) -> Self {
        Self { retriever, llm }
    }
}

#[async_trait]
impl Tool for PdfQaTool {
    fn name(&self) -> &str {
        "PDF_QA"
    }

    fn description(&self) -> &str {
        "Answer questions based on uploaded PDFs."
    }

    async fn invoke(&self, input: &str) -> Result<String> {
        // clone out so the lock is not held across awaits
        let retriever = self
            .retriever
            .read()
            .clone()
            .ok_or(Error::RetrieverNotInitialized)?;

        let chain = RetrievalChain::new(retriever, self.llm.clone());
        let result = chain.invoke(input).await?;
        tracing::debug!("PDF_QA answered from {} chunks", result.context.len());
        Ok(result.answer)
    }
}
