//! Selects exactly one tab from the ordered tab collection.
//!
//! URL keyword matches take precedence over title matches: a URL is a
//! structurally stable signal, while a title may be localized or
//! rewritten as the page runs. When several URLs match, the first in
//! collection order wins and the full match list is surfaced so the
//! caller can report the ambiguity.

use crate::config::TabTarget;
use crate::error::ScopeError;
use async_trait::async_trait;

/// One open tab as listed at startup. URLs are collected eagerly;
/// titles are fetched lazily through [`TitleSource`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TabSummary {
    pub index: usize,
    pub url: String,
}

/// Lazy per-tab title retrieval. A fetch that fails skips that tab
/// instead of failing the resolution.
#[async_trait]
pub trait TitleSource: Send + Sync {
    async fn title(&self, index: usize) -> Result<String, ScopeError>;
}

/// Outcome of tab resolution.
#[derive(Debug, Clone)]
pub struct TabMatch {
    pub index: usize,
    /// Every URL match when the keyword was ambiguous; empty otherwise.
    pub ambiguous: Vec<TabSummary>,
}

pub async fn resolve_tab(
    tabs: &[TabSummary],
    target: &TabTarget,
    titles: &dyn TitleSource,
) -> Result<TabMatch, ScopeError> {
    match target {
        TabTarget::Index(index) => {
            if *index < tabs.len() {
                Ok(TabMatch {
                    index: *index,
                    ambiguous: Vec::new(),
                })
            } else {
                Err(ScopeError::TabNotFound(format!(
                    "index {} out of range ({} tabs open)",
                    index,
                    tabs.len()
                )))
            }
        }
        TabTarget::Keyword(keyword) => resolve_keyword(tabs, keyword, titles).await,
    }
}

async fn resolve_keyword(
    tabs: &[TabSummary],
    keyword: &str,
    titles: &dyn TitleSource,
) -> Result<TabMatch, ScopeError> {
    let needle = keyword.to_lowercase();

    let url_matches: Vec<&TabSummary> = tabs
        .iter()
        .filter(|t| t.url.to_lowercase().contains(&needle))
        .collect();

    if url_matches.len() == 1 {
        return Ok(TabMatch {
            index: url_matches[0].index,
            ambiguous: Vec::new(),
        });
    }
    if !url_matches.is_empty() {
        let first_index = url_matches[0].index;
        tracing::warn!(
            "keyword {:?} matched {} tabs by URL; using the first [{}]",
            keyword,
            url_matches.len(),
            first_index
        );
        return Ok(TabMatch {
            index: first_index,
            ambiguous: url_matches.into_iter().cloned().collect(),
        });
    }

    // No URL hit: fall back to titles, scanned in collection order.
    for tab in tabs {
        match titles.title(tab.index).await {
            Ok(title) => {
                if title.to_lowercase().contains(&needle) {
                    return Ok(TabMatch {
                        index: tab.index,
                        ambiguous: Vec::new(),
                    });
                }
            }
            Err(e) => {
                tracing::debug!("skipping title of tab [{}]: {}", tab.index, e);
            }
        }
    }

    Err(ScopeError::TabNotFound(format!(
        "no tab URL or title contains {:?}",
        keyword
    )))
}
