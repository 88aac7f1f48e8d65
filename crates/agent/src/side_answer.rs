//! Short answers sourced from the content-search collaborator.
//!
//! Every lookup runs under a timeout. Search failures and timeouts are logged
//! and turned into `None`, so callers always have a canned path.

use std::sync::Arc;
use std::time::Duration;

use leadflow_core::config::{DialogueConfig, SearchConfig};
use tracing::warn;

use crate::search::{ContentSearch, SearchHit};

const PORTFOLIO_QUERY: &str = "portfolio projects interior design examples";
const PORTFOLIO_PREVIEW_ITEMS: usize = 3;
const PORTFOLIO_TITLE_MAX_CHARS: usize = 60;

const OFFICE_QUERIES: [&str; 3] = [
    "office address location contact",
    "where located address",
    "office location address contact information",
];
const OFFICE_SNIPPET_MAX_CHARS: usize = 300;
const ADDRESS_INDICATORS: &[&str] = &[
    "address",
    "located",
    "office",
    "visit",
    "jalan",
    "road",
    "kuala lumpur",
    "kl",
    "malaysia",
    "contact",
    "ampang",
];

#[derive(Clone)]
pub struct SideAnswerer {
    search: Arc<dyn ContentSearch>,
    top_k: usize,
    max_chars: usize,
    timeout: Duration,
}

impl SideAnswerer {
    pub fn new(
        search: Arc<dyn ContentSearch>,
        top_k: usize,
        max_chars: usize,
        timeout: Duration,
    ) -> Self {
        Self { search, top_k: top_k.max(1), max_chars, timeout }
    }

    pub fn from_config(
        search: Arc<dyn ContentSearch>,
        search_config: &SearchConfig,
        dialogue: &DialogueConfig,
    ) -> Self {
        Self::new(
            search,
            search_config.top_k,
            dialogue.side_answer_max_chars,
            Duration::from_millis(search_config.timeout_ms),
        )
    }

    /// One sentence-sized answer with its source, from the best hit.
    pub async fn one_liner(&self, question: &str) -> Option<String> {
        let hit = self.lookup(question, self.top_k).await.into_iter().next()?;
        let text = truncate_at_word(&collapse_whitespace(&hit.text), self.max_chars);
        if text.is_empty() {
            return None;
        }
        Some(with_source(text, &hit.source_url))
    }

    /// First hit across the office queries that reads like an address.
    pub async fn office_address(&self) -> Option<String> {
        for query in OFFICE_QUERIES {
            let hits = self.lookup(query, PORTFOLIO_PREVIEW_ITEMS).await;
            let found = hits.into_iter().find(|hit| {
                let lowered = hit.text.to_lowercase();
                ADDRESS_INDICATORS.iter().any(|indicator| lowered.contains(indicator))
            });
            if let Some(hit) = found {
                let snippet =
                    truncate_at_word(&collapse_whitespace(&hit.text), OFFICE_SNIPPET_MAX_CHARS);
                return Some(with_source(snippet, &hit.source_url));
            }
        }
        None
    }

    /// "Examples: a (url); b (url)" built from portfolio hits.
    pub async fn portfolio_preview(&self) -> Option<String> {
        let items: Vec<String> = self
            .lookup(PORTFOLIO_QUERY, PORTFOLIO_PREVIEW_ITEMS)
            .await
            .iter()
            .filter_map(|hit| {
                let title = hit.title.as_deref().map(str::trim).filter(|t| !t.is_empty());
                let title = match title {
                    Some(title) => title.to_string(),
                    None => truncate_at_word(
                        &collapse_whitespace(&hit.text),
                        PORTFOLIO_TITLE_MAX_CHARS,
                    ),
                };
                (!title.is_empty()).then(|| format!("{title} ({})", hit.source_url))
            })
            .collect();

        (!items.is_empty()).then(|| format!("Examples: {}", items.join("; ")))
    }

    async fn lookup(&self, query: &str, k: usize) -> Vec<SearchHit> {
        match tokio::time::timeout(self.timeout, self.search.search(query, k)).await {
            Ok(Ok(hits)) => hits,
            Ok(Err(error)) => {
                warn!(
                    event_name = "collaborator.search.failed",
                    error = %error,
                    "content search failed; continuing without a side answer"
                );
                Vec::new()
            }
            Err(_) => {
                warn!(
                    event_name = "collaborator.search.timeout",
                    timeout_ms = self.timeout.as_millis() as u64,
                    "content search timed out; continuing without a side answer"
                );
                Vec::new()
            }
        }
    }
}

fn collapse_whitespace(text: &str) -> String {
    text.split_whitespace().collect::<Vec<&str>>().join(" ")
}

fn with_source(text: String, source_url: &str) -> String {
    if source_url.trim().is_empty() {
        text
    } else {
        format!("{text} (Source: {})", source_url.trim())
    }
}

/// Cuts to at most `max_chars` characters at the last word boundary and marks
/// the cut with "...".
pub(crate) fn truncate_at_word(text: &str, max_chars: usize) -> String {
    let text = text.trim();
    if text.chars().count() <= max_chars {
        return text.to_string();
    }

    let cut: String = text.chars().take(max_chars).collect();
    let kept = match cut.rfind(' ') {
        Some(index) if index > 0 => &cut[..index],
        _ => cut.as_str(),
    };
    format!("{}...", kept.trim_end_matches([',', ';', ':', ' ']))
}
