//! Encyclopedia lookups through the MediaWiki action API.
//!
//! A lookup is one search request for the top `k` titles followed by one
//! intro-extract request per title. Pages without an extract are skipped.
//! The result reads
//!
//! ```text
//! Page: <title>
//! Summary: <intro>
//!
//! Page: <title>
//! Summary: <intro>
//! ```
//!
//! cut to `doc_content_chars_max` characters.

use std::time::Duration;

use async_trait::async_trait;
use reqwest::Client;
use serde::Deserialize;
use tracing::debug;

use sage_core::config::SearchConfig;

use crate::capability::SearchService;
use crate::error::ChatError;

const SERVICE: &str = "search";

/// Returned when the search finds nothing usable.
pub const NO_RESULT: &str = "No good Wikipedia Search Result was found";

#[derive(Debug, Deserialize)]
struct SearchResponse {
    #[serde(default)]
    query: Option<SearchQuery>,
}

#[derive(Debug, Deserialize)]
struct SearchQuery {
    #[serde(default)]
    search: Vec<SearchHit>,
}

#[derive(Debug, Deserialize)]
struct SearchHit {
    title: String,
}

#[derive(Debug, Deserialize)]
struct ExtractResponse {
    #[serde(default)]
    query: Option<ExtractQuery>,
}

#[derive(Debug, Deserialize)]
struct ExtractQuery {
    #[serde(default)]
    pages: Vec<ExtractPage>,
}

#[derive(Debug, Deserialize)]
struct ExtractPage {
    title: String,
    #[serde(default)]
    extract: Option<String>,
    #[serde(default)]
    missing: bool,
}

/// MediaWiki search-and-summarize client.
#[derive(Debug, Clone)]
pub struct WikipediaClient {
    http: Client,
    endpoint: String,
    top_k_results: usize,
    max_query_chars: usize,
    doc_content_chars_max: usize,
}

impl WikipediaClient {
    pub fn new(config: &SearchConfig) -> Self {
        let http = Client::builder()
            .timeout(Duration::from_secs(config.request_timeout_secs))
            .user_agent(concat!("sage/", env!("CARGO_PKG_VERSION")))
            .build()
            .unwrap_or_else(|_| Client::new());

        Self {
            http,
            endpoint: config.endpoint(),
            top_k_results: config.top_k_results,
            max_query_chars: config.max_query_chars,
            doc_content_chars_max: config.doc_content_chars_max,
        }
    }

    pub fn endpoint(&self) -> &str {
        &self.endpoint
    }

    async fn get_json<T: serde::de::DeserializeOwned>(
        &self,
        params: &[(&str, &str)],
    ) -> Result<T, ChatError> {
        let response = self
            .http
            .get(&self.endpoint)
            .query(params)
            .send()
            .await
            .map_err(|e| ChatError::external(SERVICE, format!("request failed: {}", e)))?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(ChatError::external(
                SERVICE,
                format!("API error {}: {}", status, body.trim()),
            ));
        }

        response
            .json::<T>()
            .await
            .map_err(|e| ChatError::external(SERVICE, format!("malformed response: {}", e)))
    }

    async fn search_titles(&self, query: &str) -> Result<Vec<String>, ChatError> {
        let limit = self.top_k_results.to_string();
        let response: SearchResponse = self
            .get_json(&[
                ("action", "query"),
                ("list", "search"),
                ("srsearch", query),
                ("srlimit", limit.as_str()),
                ("format", "json"),
                ("formatversion", "2"),
            ])
            .await?;
        Ok(titles_from(response))
    }

    async fn page_extract(&self, title: &str) -> Result<Option<(String, String)>, ChatError> {
        let response: ExtractResponse = self
            .get_json(&[
                ("action", "query"),
                ("prop", "extracts"),
                ("exintro", "1"),
                ("explaintext", "1"),
                ("redirects", "1"),
                ("titles", title),
                ("format", "json"),
                ("formatversion", "2"),
            ])
            .await?;
        Ok(extract_from(response))
    }
}

fn titles_from(response: SearchResponse) -> Vec<String> {
    response
        .query
        .map(|q| q.search.into_iter().map(|hit| hit.title).collect())
        .unwrap_or_default()
}

fn extract_from(response: ExtractResponse) -> Option<(String, String)> {
    response
        .query?
        .pages
        .into_iter()
        .filter(|page| !page.missing)
        .find_map(|page| {
            let extract = page.extract?;
            let extract = extract.trim();
            (!extract.is_empty()).then(|| (page.title, extract.to_string()))
        })
}

/// Keep at most `max` characters, never splitting a code point.
fn truncate_chars(text: &str, max: usize) -> &str {
    match text.char_indices().nth(max) {
        Some((idx, _)) => &text[..idx],
        None => text,
    }
}

/// Render page summaries in the lookup output format.
fn format_summaries(pages: &[(String, String)], max_chars: usize) -> String {
    if pages.is_empty() {
        return NO_RESULT.to_string();
    }
    let joined = pages
        .iter()
        .map(|(title, summary)| format!("Page: {}\nSummary: {}", title, summary))
        .collect::<Vec<_>>()
        .join("\n\n");
    truncate_chars(&joined, max_chars).to_string()
}

#[async_trait]
impl SearchService for WikipediaClient {
    async fn search(&self, query: &str) -> Result<String, ChatError> {
        let query = truncate_chars(query, self.max_query_chars);
        debug!(query_len = query.len(), "Searching encyclopedia");

        let titles = self.search_titles(query).await?;
        let mut pages = Vec::with_capacity(titles.len());
        for title in titles.iter().take(self.top_k_results) {
            if let Some(page) = self.page_extract(title).await? {
                pages.push(page);
            }
        }

        debug!(hits = titles.len(), summarized = pages.len(), "Encyclopedia lookup done");
        Ok(format_summaries(&pages, self.doc_content_chars_max))
    }
}
