//! Canned web search for the research agent

use async_trait::async_trait;

use crate::agent::Tool;
use crate::error::Result;

/// The only result the canned search ever returns
pub const MOCK_SEARCH_RESULT: &str = "hq of fnn company in 2024: Facebook (Meta), 1000 employees";

/// `web_search(query)`; ignores the query
pub struct MockWebSearchTool;

#[async_trait]
impl Tool for MockWebSearchTool {
    fn name(&self) -> &str {
        "web_search"
    }

    fn description(&self) -> &str {
        "Search the web for information"
    }

    async fn invoke(&self, _input: &str) -> Result<String> {
        Ok(MOCK_SEARCH_RESULT.to_string())
    }
}
