//! Content-search collaborator backing side answers and portfolio previews.

use std::time::Duration;

use anyhow::{anyhow, Context, Result};
use async_trait::async_trait;
use leadflow_core::extract::normalize;
use reqwest::Client;
use serde::{Deserialize, Serialize};

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct SearchHit {
    pub text: String,
    pub source_url: String,
    #[serde(default)]
    pub title: Option<String>,
}

impl SearchHit {
    pub fn new(text: impl Into<String>, source_url: impl Into<String>) -> Self {
        Self { text: text.into(), source_url: source_url.into(), title: None }
    }

    pub fn with_title(mut self, title: impl Into<String>) -> Self {
        self.title = Some(title.into());
        self
    }
}

#[async_trait]
pub trait ContentSearch: Send + Sync {
    async fn search(&self, query: &str, k: usize) -> Result<Vec<SearchHit>>;
}

#[derive(Clone, Debug, Default)]
pub struct NoopContentSearch;

#[async_trait]
impl ContentSearch for NoopContentSearch {
    async fn search(&self, _query: &str, _k: usize) -> Result<Vec<SearchHit>> {
        Ok(Vec::new())
    }
}

const QUERY_STOPWORDS: &[&str] = &[
    "the", "and", "you", "your", "are", "for", "can", "what", "how", "does", "with", "about",
    "have", "this", "that", "there", "any", "our", "from",
];

/// Keyword-overlap scorer over a fixed document set.
#[derive(Clone, Debug, Default)]
pub struct StaticContentSearch {
    documents: Vec<SearchHit>,
}

impl StaticContentSearch {
    pub fn new(documents: Vec<SearchHit>) -> Self {
        Self { documents }
    }

    fn score(document: &SearchHit, query_terms: &[String]) -> usize {
        let haystack = normalize(&format!(
            "{} {}",
            document.title.as_deref().unwrap_or_default(),
            document.text
        ));
        let words: Vec<&str> = haystack.split_whitespace().collect();
        query_terms.iter().filter(|term| words.contains(&term.as_str())).count()
    }
}

#[async_trait]
impl ContentSearch for StaticContentSearch {
    async fn search(&self, query: &str, k: usize) -> Result<Vec<SearchHit>> {
        let normalized = normalize(query);
        let query_terms: Vec<String> = normalized
            .split_whitespace()
            .filter(|term| term.len() >= 3 && !QUERY_STOPWORDS.contains(term))
            .map(str::to_string)
            .collect();
        if query_terms.is_empty() {
            return Ok(Vec::new());
        }

        let mut scored: Vec<(usize, usize, &SearchHit)> = self
            .documents
            .iter()
            .enumerate()
            .map(|(index, document)| (Self::score(document, &query_terms), index, document))
            .filter(|(score, _, _)| *score > 0)
            .collect();
        scored.sort_by(|a, b| b.0.cmp(&a.0).then(a.1.cmp(&b.1)));

        Ok(scored.into_iter().take(k).map(|(_, _, document)| document.clone()).collect())
    }
}

/// Posts `{query, top_k}` to `{base_url}/search` and expects `{hits: [...]}`.
pub struct HttpContentSearch {
    client: Client,
    base_url: String,
}

impl HttpContentSearch {
    pub fn new(base_url: &str, timeout: Duration) -> Result<Self> {
        let client = Client::builder()
            .timeout(timeout)
            .build()
            .context("failed to build content search http client")?;
        Ok(Self { client, base_url: base_url.trim_end_matches('/').to_string() })
    }
}

#[derive(Serialize)]
struct SearchRequest<'a> {
    query: &'a str,
    top_k: usize,
}

#[derive(Deserialize)]
struct SearchResponse {
    #[serde(default)]
    hits: Vec<SearchHit>,
}

#[async_trait]
impl ContentSearch for HttpContentSearch {
    async fn search(&self, query: &str, k: usize) -> Result<Vec<SearchHit>> {
        let response = self
            .client
            .post(format!("{}/search", self.base_url))
            .json(&SearchRequest { query, top_k: k })
            .send()
            .await
            .context("content search request failed")?;

        let status = response.status();
        if !status.is_success() {
            return Err(anyhow!("content search returned {status}"));
        }

        let parsed: SearchResponse =
            response.json().await.context("failed to parse content search response")?;
        Ok(parsed.hits.into_iter().take(k).collect())
    }
}

#[cfg(test)]
mod tests {
    use super::{ContentSearch, NoopContentSearch, SearchHit, StaticContentSearch};

    fn corpus() -> StaticContentSearch {
        StaticContentSearch::new(vec![
            SearchHit::new(
                "Our design process starts with a site visit, then concept, 3D renders and build.",
                "https://example.test/process",
            )
            .with_title("Design process"),
            SearchHit::new(
                "Renovation timeline is usually 8 to 12 weeks depending on scope.",
                "https://example.test/faq",
            )
            .with_title("FAQ"),
            SearchHit::new(
                "Visit our office at 12 Jalan Ampang, Kuala Lumpur.",
                "https://example.test/contact",
            ),
        ])
    }

    #[tokio::test]
    async fn best_overlap_ranks_first() {
        let hits = corpus().search("how long is the renovation timeline?", 2).await.expect("search");

        assert_eq!(hits.len(), 1);
        assert_eq!(hits[0].source_url, "https://example.test/faq");
    }

    #[tokio::test]
    async fn ties_keep_document_order_and_k_is_respected() {
        let hits = corpus().search("design renovation office", 2).await.expect("search");

        let urls: Vec<&str> = hits.iter().map(|hit| hit.source_url.as_str()).collect();
        assert_eq!(urls, vec!["https://example.test/process", "https://example.test/faq"]);
    }

    #[tokio::test]
    async fn stopword_only_queries_find_nothing() {
        assert!(corpus().search("what are you", 3).await.expect("search").is_empty());
        assert!(NoopContentSearch.search("anything", 3).await.expect("search").is_empty());
    }
}
