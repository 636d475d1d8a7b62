//! Web search provider trait

use async_trait::async_trait;
use serde::{Deserialize, Serialize};

use crate::error::Result;

/// One ranked search result
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SearchHit {
    pub title: String,
    pub link: String,
    pub snippet: String,
}

impl SearchHit {
    /// Render hits the way the agent sees them:
    /// `[snippet: ..., title: ..., link: ...], [...]`
    pub fn format_all(hits: &[SearchHit]) -> String {
        if hits.is_empty() {
            return "No good DuckDuckGo Search Result was found".to_string();
        }

        hits.iter()
            .map(|hit| {
                format!(
                    "[snippet: {}, title: {}, link: {}]",
                    hit.snippet, hit.title, hit.link
                )
            })
            .collect::<Vec<_>>()
            .join(", ")
    }
}

/// Trait for live web search returning ranked snippets
///
/// Implementations:
/// - `DuckDuckGoSearch`: DuckDuckGo HTML endpoint
#[async_trait]
pub trait WebSearchProvider: Send + Sync {
    /// Run a search and return at most `max_results` hits, best first
    async fn search(&self, query: &str, max_results: usize) -> Result<Vec<SearchHit>>;

    /// Get provider name for logging
    fn name(&self) -> &str;
}
