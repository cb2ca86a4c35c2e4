//! Staged substring matcher over the catalog corpus.
//!
//! Matching is plain case-insensitive substring containment against a
//! document's title or content. Phrasing variance is handled by falling
//! back through progressively looser keyword sets rather than by scoring.
//!
//! # Matching Stages
//!
//! 1. **Primary**: the primary keyword.
//! 2. **Fallback**: any supplementary word keyword (only when the primary
//!    stage found nothing and supplementary keywords exist).
//! 3. **Original query**: the raw query text (only when still empty and
//!    the query was recognized as natural language).
//!
//! The first stage with matches wins. Its matches are ordered by
//! `created_at` descending (stable on corpus order) and truncated to the
//! limit.

use serde::Serialize;

use crate::keywords;
use crate::models::{Document, KeywordSet};
use crate::store::Store;

/// Which matching stage produced a result set.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum MatchStage {
    Primary,
    Fallback,
    OriginalQuery,
    /// No stage matched, or the corpus was empty.
    NoMatch,
}

impl MatchStage {
    pub fn as_str(&self) -> &'static str {
        match self {
            MatchStage::Primary => "primary",
            MatchStage::Fallback => "fallback",
            MatchStage::OriginalQuery => "original_query",
            MatchStage::NoMatch => "no_match",
        }
    }
}

/// Ranked documents plus the extraction and stage that produced them.
#[derive(Debug, Clone, Serialize)]
pub struct RankedResults {
    pub keywords: KeywordSet,
    pub stage: MatchStage,
    pub documents: Vec<Document>,
}

/// Rank `corpus` against `query`, returning at most `limit` documents.
pub fn rank_documents(query: &str, corpus: &[Document], limit: usize) -> Vec<Document> {
    rank_with_explanation(query, corpus, limit).documents
}

/// Like [`rank_documents`], but also reports the keyword set and stage.
pub fn rank_with_explanation(query: &str, corpus: &[Document], limit: usize) -> RankedResults {
    let keywords = keywords::extract(query);

    if corpus.is_empty() {
        return RankedResults {
            keywords,
            stage: MatchStage::NoMatch,
            documents: Vec::new(),
        };
    }

    let haystacks: Vec<(String, String)> = corpus
        .iter()
        .map(|d| (d.title.to_lowercase(), d.content.to_lowercase()))
        .collect();

    let mut stage = MatchStage::Primary;
    let mut selected = select(corpus, &haystacks, &keywords.keywords[..1]);

    if selected.is_empty() && keywords.keywords.len() > 1 {
        stage = MatchStage::Fallback;
        selected = select(corpus, &haystacks, keywords.supplementary());
    }

    if selected.is_empty() && keywords.is_natural_language {
        stage = MatchStage::OriginalQuery;
        selected = select(corpus, &haystacks, &[query.to_string()]);
    }

    if selected.is_empty() {
        stage = MatchStage::NoMatch;
    }

    selected.sort_by(|a, b| b.created_at.cmp(&a.created_at));
    selected.truncate(limit);

    tracing::debug!(
        query,
        primary = keywords.primary(),
        stage = stage.as_str(),
        matched = selected.len(),
        "ranked corpus"
    );

    RankedResults {
        documents: selected.into_iter().cloned().collect(),
        keywords,
        stage,
    }
}

/// Documents whose lowercased title or content contains any of `terms`,
/// in corpus order.
fn select<'a>(corpus: &'a [Document], haystacks: &[(String, String)], terms: &[String]) -> Vec<&'a Document> {
    let needles: Vec<String> = terms.iter().map(|t| t.to_lowercase()).collect();
    corpus
        .iter()
        .zip(haystacks)
        .filter(|(_, (title, content))| {
            needles
                .iter()
                .any(|n| title.contains(n.as_str()) || content.contains(n.as_str()))
        })
        .map(|(doc, _)| doc)
        .collect()
}

/// Read the corpus from `store` and rank it against `query`.
///
/// Corpus read failures are logged and reported as an empty result so
/// the chat flow can still answer ("nothing found") instead of failing.
pub async fn search_store<S: Store + ?Sized>(store: &S, query: &str, limit: usize) -> RankedResults {
    match store.list_documents().await {
        Ok(corpus) => rank_with_explanation(query, &corpus, limit),
        Err(e) => {
            tracing::warn!(error = %e, query, "corpus read failed; treating as no results");
            RankedResults {
                keywords: keywords::extract(query),
                stage: MatchStage::NoMatch,
                documents: Vec::new(),
            }
        }
    }
}
