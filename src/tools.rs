//! # Tools Module
//!
//! This module implements the two lookup backends (DuckDuckGo web search and
//! Wikipedia summaries) and the router that picks between them. It
//! demonstrates several important Rust and async patterns:
//! - Trait objects for substitutable collaborators
//! - Async/await for non-blocking I/O
//! - Structured error handling with thiserror
//! - Serde for JSON deserialization

use async_trait::async_trait;
use serde::Deserialize;
use std::collections::HashMap;
use std::time::Duration;
use thiserror::Error;
use tracing::{debug, info, warn};

// =============================================================================
// CUSTOM ERROR TYPE
// =============================================================================
/// # Rust Concept: Custom Error Types with thiserror
///
/// thiserror is a derive macro that makes creating custom error types easy.
/// Each variant represents a different kind of error that can occur.
/// The #[error("...")] attribute defines the error message.
///
/// Backends return this as a typed Result - the router matches on it rather
/// than catching a blanket fault.
#[derive(Error, Debug)]
pub enum SearchError {
    #[error("Failed to perform lookup: {0}")]
    LookupFailed(String),

    #[error("Rate limited by search provider, please wait")]
    RateLimited,

    #[error("No results found for query: {0}")]
    NoResults(String),

    #[error("Network error: {0}")]
    NetworkError(#[from] reqwest::Error),
}

// =============================================================================
// SEARCH TOOL TRAIT
// =============================================================================
/// One lookup backend: a query string in, a result text out.
///
/// Both concrete backends implement this, and so do the fakes in the workflow
/// tests - the router never knows which it is holding.
#[async_trait]
pub trait SearchTool: Send + Sync {
    async fn run(&self, query: &str) -> Result<String, SearchError>;
}

// =============================================================================
// WEB SEARCH BACKEND (DuckDuckGo)
// =============================================================================
/// Web search via DuckDuckGo's HTML endpoint.
///
/// Note: We use HTML scraping because DuckDuckGo doesn't have a free web
/// search API. Result links carry the target URL in an encoded `uddg`
/// redirect parameter, which is what the parser pulls out.
pub struct WebSearchTool {
    client: reqwest::Client,
    max_results: usize,
}

impl WebSearchTool {
    /// Create a new WebSearchTool with the specified max results.
    pub fn new(max_results: usize) -> Result<Self, SearchError> {
        let client = reqwest::Client::builder()
            .timeout(Duration::from_secs(30))
            .user_agent("Mozilla/5.0 (X11; Linux x86_64) AppleWebKit/537.36 (KHTML, like Gecko) Chrome/120.0.0.0 Safari/537.36")
            .build()?;

        Ok(Self {
            client,
            max_results,
        })
    }

    async fn fetch(&self, query: &str) -> Result<String, SearchError> {
        let url = format!(
            "https://html.duckduckgo.com/html/?q={}",
            urlencoding::encode(query)
        );

        debug!(url = %url, "Fetching search results");

        let response = self.client.get(&url).send().await?;

        if !response.status().is_success() {
            if response.status() == reqwest::StatusCode::TOO_MANY_REQUESTS {
                return Err(SearchError::RateLimited);
            }
            return Err(SearchError::LookupFailed(format!(
                "HTTP {}",
                response.status()
            )));
        }

        Ok(response.text().await?)
    }
}

#[async_trait]
impl SearchTool for WebSearchTool {
    async fn run(&self, query: &str) -> Result<String, SearchError> {
        info!(query = %query, "Performing web search");

        // Be polite to the HTML endpoint between sequential queries
        tokio::time::sleep(Duration::from_millis(500)).await;

        let body = self.fetch(query).await?;
        let urls = parse_result_urls(&body, self.max_results);

        if urls.is_empty() {
            warn!(query = %query, "No search results found");
            return Err(SearchError::NoResults(query.to_string()));
        }

        info!(query = %query, count = urls.len(), "Search completed");

        let formatted: String = urls
            .iter()
            .enumerate()
            .map(|(i, url)| {
                format!(
                    "{}. {} ({})",
                    i + 1,
                    extract_domain(url).unwrap_or_else(|| "Result".to_string()),
                    url
                )
            })
            .collect::<Vec<_>>()
            .join("\n");

        Ok(formatted)
    }
}

/// Pull result URLs out of the DuckDuckGo HTML page.
///
/// Result links look like `...uddg=https%3A%2F%2Fexample.com%2Fpage&...`;
/// the target URL is percent-encoded in the `uddg` parameter.
fn parse_result_urls(html: &str, max_results: usize) -> Vec<String> {
    let mut urls = Vec::new();
    let mut seen = std::collections::HashSet::new();

    for segment in html.split("uddg=").skip(1) {
        if urls.len() >= max_results {
            break;
        }

        if let Some(end) = segment.find(|c| c == '&' || c == '"' || c == '\'') {
            if let Ok(decoded) = urlencoding::decode(&segment[..end]) {
                let url = decoded.to_string();
                if url.starts_with("http")
                    && !url.contains("duckduckgo.com")
                    && seen.insert(url.clone())
                {
                    urls.push(url);
                }
            }
        }
    }

    urls
}

/// Extract the domain name from a URL.
fn extract_domain(url: &str) -> Option<String> {
    url.split("//")
        .nth(1)?
        .split('/')
        .next()
        .map(|s| s.to_string())
}

// =============================================================================
// ENCYCLOPEDIA BACKEND (Wikipedia)
// =============================================================================
/// How much of a Wikipedia intro extract to keep, in characters.
const WIKI_EXCERPT_CHARS: usize = 500;

/// Encyclopedia lookup via the MediaWiki API.
///
/// One GET resolves the top search hit and returns its plain-text intro
/// extract, which is then capped to a short excerpt.
pub struct WikiSummaryTool {
    client: reqwest::Client,
    api_url: String,
}

impl WikiSummaryTool {
    pub fn new() -> Result<Self, SearchError> {
        let client = reqwest::Client::builder()
            .timeout(Duration::from_secs(30))
            .user_agent(concat!("research-scout/", env!("CARGO_PKG_VERSION")))
            .build()?;

        Ok(Self {
            client,
            api_url: "https://en.wikipedia.org/w/api.php".to_string(),
        })
    }
}

#[async_trait]
impl SearchTool for WikiSummaryTool {
    async fn run(&self, query: &str) -> Result<String, SearchError> {
        info!(query = %query, "Performing encyclopedia lookup");

        let response = self
            .client
            .get(&self.api_url)
            .query(&[
                ("action", "query"),
                ("format", "json"),
                ("generator", "search"),
                ("gsrsearch", query),
                ("gsrlimit", "1"),
                ("prop", "extracts"),
                ("exintro", "1"),
                ("explaintext", "1"),
            ])
            .send()
            .await?;

        if !response.status().is_success() {
            return Err(SearchError::LookupFailed(format!(
                "HTTP {}",
                response.status()
            )));
        }

        let body: WikiQueryResponse = response.json().await?;

        let page = body
            .query
            .map(|q| q.pages)
            .unwrap_or_default()
            .into_values()
            .next()
            .ok_or_else(|| SearchError::NoResults(query.to_string()))?;

        let excerpt = truncate_chars(page.extract.trim(), WIKI_EXCERPT_CHARS);
        if excerpt.is_empty() {
            return Err(SearchError::NoResults(query.to_string()));
        }

        debug!(title = %page.title, chars = excerpt.len(), "Wikipedia extract received");

        Ok(format!("{}: {}", page.title, excerpt))
    }
}

/// Wire format of a MediaWiki extracts query (only the fields we read).
#[derive(Debug, Deserialize)]
struct WikiQueryResponse {
    query: Option<WikiQuery>,
}

#[derive(Debug, Deserialize)]
struct WikiQuery {
    #[serde(default)]
    pages: HashMap<String, WikiPage>,
}

#[derive(Debug, Deserialize)]
struct WikiPage {
    title: String,
    #[serde(default)]
    extract: String,
}

/// Truncate to at most `max_chars` characters without splitting a char.
fn truncate_chars(text: &str, max_chars: usize) -> String {
    text.chars().take(max_chars).collect()
}

// =============================================================================
// TOOL ROUTER
// =============================================================================
/// Marks which lookup path produced a log entry.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BackendTag {
    Web,
    Wiki,
    Error,
}

impl BackendTag {
    /// The literal tag embedded in log entries.
    pub fn label(&self) -> &'static str {
        match self {
            Self::Web => "[WEB]",
            Self::Wiki => "[WIKI]",
            Self::Error => "[ERR]",
        }
    }
}

/// The result of one routed lookup: the text plus which path produced it.
#[derive(Debug, Clone)]
pub struct LookupOutcome {
    pub text: String,
    pub tag: BackendTag,
}

/// Text returned in place of a result when a backend fails.
pub const LOOKUP_FAILED: &str = "lookup_failed";

/// Routes each query to one of the two backends by a keyword check.
///
/// Both backends are constructed once at startup and owned here - there are
/// no process-wide shared tool instances. Routing is a static, lowercased
/// substring test: "history" or "define" anywhere in the query selects the
/// encyclopedia path, everything else goes to web search. Substring means
/// substring - "prehistory" routes to the encyclopedia too.
pub struct ToolRouter {
    web: Box<dyn SearchTool>,
    wiki: Box<dyn SearchTool>,
}

impl ToolRouter {
    pub fn new(web: Box<dyn SearchTool>, wiki: Box<dyn SearchTool>) -> Self {
        Self { web, wiki }
    }

    /// Build the router with the real DuckDuckGo and Wikipedia backends.
    pub fn with_default_backends(max_results: usize) -> Result<Self, SearchError> {
        Ok(Self::new(
            Box::new(WebSearchTool::new(max_results)?),
            Box::new(WikiSummaryTool::new()?),
        ))
    }

    fn wants_encyclopedia(query: &str) -> bool {
        let lowered = query.to_lowercase();
        lowered.contains("history") || lowered.contains("define")
    }

    /// Run one lookup.
    ///
    /// A backend failure never propagates: it degrades to the literal
    /// [`LOOKUP_FAILED`] text tagged [`BackendTag::Error`], so one bad query
    /// never aborts the run.
    pub async fn lookup(&self, query: &str) -> LookupOutcome {
        let (backend, tag) = if Self::wants_encyclopedia(query) {
            (&self.wiki, BackendTag::Wiki)
        } else {
            (&self.web, BackendTag::Web)
        };

        match backend.run(query).await {
            Ok(text) => LookupOutcome { text, tag },
            Err(err) => {
                warn!(query = %query, error = %err, "Tool failure, continuing");
                LookupOutcome {
                    text: LOOKUP_FAILED.to_string(),
                    tag: BackendTag::Error,
                }
            }
        }
    }
}
