//! DuckDuckGo web search via the HTML endpoint

use async_trait::async_trait;
use reqwest::Url;
use scraper::{ElementRef, Html, Selector};

use crate::config::WebSearchConfig;
use crate::error::{Error, Result};

use super::web_search::{SearchHit, WebSearchProvider};

const USER_AGENT: &str = "Mozilla/5.0 (X11; Linux x86_64; rv:128.0) Gecko/20100101 Firefox/128.0";

/// DuckDuckGo search provider
pub struct DuckDuckGoSearch {
    http: reqwest::Client,
    endpoint: String,
}

impl DuckDuckGoSearch {
    pub fn new(config: &WebSearchConfig) -> Result<Self> {
        let http = reqwest::Client::builder()
            .user_agent(USER_AGENT)
            .build()
            .map_err(|e| Error::Config(format!("Failed to build HTTP client: {}", e)))?;

        Ok(Self {
            http,
            endpoint: config.endpoint.clone(),
        })
    }
}

fn selector(css: &str) -> Result<Selector> {
    Selector::parse(css).map_err(|e| Error::WebSearch(format!("Invalid selector '{}': {}", css, e)))
}

fn element_text(element: ElementRef<'_>) -> String {
    element
        .text()
        .collect::<String>()
        .split_whitespace()
        .collect::<Vec<_>>()
        .join(" ")
}

/// Resolve DuckDuckGo's `/l/?uddg=<target>` redirect links to the target URL
fn resolve_link(href: &str) -> String {
    let absolute = if href.starts_with("//") {
        format!("https:{}", href)
    } else if href.starts_with('/') {
        format!("https://duckduckgo.com{}", href)
    } else {
        href.to_string()
    };

    Url::parse(&absolute)
        .ok()
        .and_then(|url| {
            url.query_pairs()
                .find(|(key, _)| key == "uddg")
                .map(|(_, target)| target.into_owned())
        })
        .unwrap_or(absolute)
}

/// Extract organic results from a results page, skipping ads
pub fn parse_results(html: &str, max_results: usize) -> Result<Vec<SearchHit>> {
    let document = Html::parse_document(html);
    let result_sel = selector("div.result")?;
    let title_sel = selector("a.result__a")?;
    let snippet_sel = selector(".result__snippet")?;

    let mut hits = Vec::new();
    for result in document.select(&result_sel) {
        if hits.len() >= max_results {
            break;
        }
        if result.value().classes().any(|c| c == "result--ad") {
            continue;
        }

        let Some(anchor) = result.select(&title_sel).next() else {
            continue;
        };
        let link = anchor.value().attr("href").map(resolve_link).unwrap_or_default();
        let snippet = result
            .select(&snippet_sel)
            .next()
            .map(element_text)
            .unwrap_or_default();

        hits.push(SearchHit {
            title: element_text(anchor),
            link,
            snippet,
        });
    }

    Ok(hits)
}

#[async_trait]
impl WebSearchProvider for DuckDuckGoSearch {
    async fn search(&self, query: &str, max_results: usize) -> Result<Vec<SearchHit>> {
        let response = self
            .http
            .get(&self.endpoint)
            .query(&[("q", query)])
            .send()
            .await
            .map_err(|e| Error::WebSearch(format!("DuckDuckGo request failed: {}", e)))?;

        if !response.status().is_success() {
            return Err(Error::WebSearch(format!(
                "DuckDuckGo returned {}",
                response.status()
            )));
        }

        let html = response
            .text()
            .await
            .map_err(|e| Error::WebSearch(format!("Failed to read DuckDuckGo response: {}", e)))?;

        let hits = parse_results(&html, max_results)?;
        tracing::debug!(query, hits = hits.len(), "DuckDuckGo search complete");
        Ok(hits)
    }

    fn name(&self) -> &str {
        "duckduckgo"
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const PAGE: &str = r#"
        <html><body>
          <div class="result results_links result--ad">
            <a class="result__a" href="https://ads.example.com">Sponsored</a>
            <a class="result__snippet">Buy now</a>
          </div>
          <div class="result results_links">
            <h2><a class="result__a" href="//duckduckgo.com/l/?uddg=https%3A%2F%2Fwww.rust-lang.org%2F&amp;rut=abc">Rust   Programming Language</a></h2>
            <a class="result__snippet">A language empowering <b>everyone</b>.</a>
          </div>
          <div class="result results_links">
            <h2><a class="result__a" href="https://doc.rust-lang.org/book/">The Book</a></h2>
            <a class="result__snippet">Learn Rust.</a>
          </div>
          <div class="result results_links">
            <h2><a class="result__a" href="https://crates.io/">crates.io</a></h2>
          </div>
        </body></html>
    "#;

    #[test]
    fn test_parse_skips_ads_and_resolves_redirects() {
        let hits = parse_results(PAGE, 4).unwrap();

        assert_eq!(hits.len(), 3);
        assert_eq!(hits[0].title, "Rust Programming Language");
        assert_eq!(hits[0].link, "https://www.rust-lang.org/");
        assert_eq!(hits[0].snippet, "A language empowering everyone.");
        assert_eq!(hits[2].snippet, "");
    }

    #[test]
    fn test_parse_respects_limit() {
        let hits = parse_results(PAGE, 1).unwrap();
        assert_eq!(hits.len(), 1);
        assert_eq!(hits[0].link, "https://www.rust-lang.org/");
    }

    #[test]
    fn test_empty_page() {
        assert!(parse_results("<html></html>", 4).unwrap().is_empty());
    }
}
