//! Live web search tool

use async_trait::async_trait;
use std::sync::Arc;

use crate::agent::Tool;
use crate::error::Result;
use crate::providers::{SearchHit, WebSearchProvider};

/// `WebSearch`: ranked snippets from the web search provider
pub struct WebSearchTool {
    provider: Arc<dyn WebSearchProvider>,
    max_results: usize,
}

impl WebSearchTool {
    pub fn new(provider: Arc<dyn WebSearchProvider>, max_results: usize) -> Self {
        Self {
            provider,
            max_results,
        }
    }
}

#[async_trait]
impl Tool for WebSearchTool {
    fn name(&self) -> &str {
        "WebSearch"
    }

    fn description(&self) -> &str {
        "Search the web for real-time information."
    }

    async fn invoke(&self, input: &str) -> Result<String> {
        let hits = self.provider.search(input, self.max_results).await?;
        Ok(SearchHit::format_all(&hits))
    }
}
