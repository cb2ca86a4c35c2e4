//! `lyr search`: run the staged matcher and print ranked documents.
//!
//! With `--explain` the extracted keywords and the matching stage that
//! produced the results are printed first, which is the quickest way to
//! see why a question did or did not find a track.

use anyhow::Result;

use lyric_rag_core::citation::rank_score;
use lyric_rag_core::search::search_store;

use crate::backend;
use crate::config::Config;

const SNIPPET_CHARS: usize = 160;

pub async fn run_search(
    config: &Config,
    query: &str,
    limit: Option<usize>,
    explain: bool,
) -> Result<()> {
    let query = query.trim();
    if query.is_empty() {
        anyhow::bail!("query must not be empty");
    }

    let store = backend::open_store(config).await?;
    let limit = limit.unwrap_or(config.retrieval.limit).max(1);
    let ranked = search_store(store.as_ref(), query, limit).await;

    if explain {
        println!("keywords: {:?}", ranked.keywords.keywords);
        println!("natural language: {}", ranked.keywords.is_natural_language);
        println!("stage: {}", ranked.stage.as_str());
        println!();
    }

    if ranked.documents.is_empty() {
        println!("No results.");
        return Ok(());
    }

    for (i, doc) in ranked.documents.iter().enumerate() {
        println!("{}. [{:.2}] {}", i + 1, rank_score(i), doc.title);
        if let Some(album) = doc.metadata.as_ref().and_then(|m| m.album.as_deref()) {
            println!("    album: {}", album);
        }
        println!("    id: {}", doc.id);
        println!("    {}", snippet(&doc.content));
        println!();
    }

    Ok(())
}

/// First line-collapsed `SNIPPET_CHARS` characters of `content`.
fn snippet(content: &str) -> String {
    let flat = content.split_whitespace().collect::<Vec<_>>().join(" ");
    if flat.chars().count() > SNIPPET_CHARS {
        let cut: String = flat.chars().take(SNIPPET_CHARS).collect();
        format!("{}...", cut)
    } else {
        flat
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_snippet_collapses_lines() {
        assert_eq!(snippet("Warning shots\n  fired"), "Warning shots fired");
        let long = "word ".repeat(100);
        assert!(snippet(&long).ends_with("..."));
    }
}
