//! Catalog seeding from a JSON file or a directory of lyric files.
//!
//! Two input shapes are accepted:
//!
//! - A JSON array of `{ "title", "content", "metadata"? }` objects, inserted
//!   in array order.
//! - A directory walked recursively for `*.md` and `*.txt` files, sorted by
//!   path. Each file becomes one document: the title and track number come
//!   from the file name (`05_full_disclosure.md` → track 5, "Full
//!   Disclosure"), the album from the parent directory, and category,
//!   project, and URL prefix from `[seed]` in the config.
//!
//! Entries with an empty title or content are skipped and counted.
//! Insertion order matters: the matcher prefers later-inserted documents.

use anyhow::{bail, Context, Result};
use std::path::{Path, PathBuf};
use walkdir::WalkDir;

use lyric_rag_core::models::{DocumentMetadata, NewDocument};
use lyric_rag_core::store::Store;

use crate::backend;
use crate::config::{Config, SeedConfig, StorageBackend};

const SEED_EXTENSIONS: &[&str] = &["md", "txt"];

/// Outcome of a seeding run.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct SeedReport {
    /// Documents removed by `--reset` before inserting.
    pub cleared: usize,
    pub inserted: usize,
    pub skipped: usize,
}

/// Read catalog entries from `path` without touching any store.
pub fn load_catalog(path: &Path, seed: &SeedConfig) -> Result<Vec<NewDocument>> {
    if path.is_dir() {
        load_directory(path, seed)
    } else {
        let text = std::fs::read_to_string(path)
            .with_context(|| format!("Failed to read catalog: {}", path.display()))?;
        serde_json::from_str(&text)
            .with_context(|| format!("Invalid catalog JSON: {}", path.display()))
    }
}

fn load_directory(root: &Path, seed: &SeedConfig) -> Result<Vec<NewDocument>> {
    let mut files: Vec<PathBuf> = WalkDir::new(root)
        .into_iter()
        .filter_map(|e| e.ok())
        .filter(|e| e.file_type().is_file())
        .map(|e| e.into_path())
        .filter(|p| {
            p.extension()
                .and_then(|ext| ext.to_str())
                .is_some_and(|ext| SEED_EXTENSIONS.contains(&ext.to_ascii_lowercase().as_str()))
        })
        .collect();
    files.sort();

    let mut docs = Vec::with_capacity(files.len());
    for file in files {
        let content = std::fs::read_to_string(&file)
            .with_context(|| format!("Failed to read {}", file.display()))?;
        let stem = file
            .file_stem()
            .and_then(|s| s.to_str())
            .unwrap_or_default();
        let (track_number, title) = title_from_file_stem(stem);

        let album = file
            .parent()
            .filter(|p| *p != root)
            .and_then(|p| p.file_name())
            .and_then(|n| n.to_str())
            .map(|n| title_from_file_stem(n).1);

        let url = seed.base_url.as_ref().map(|base| {
            let rel = file.strip_prefix(root).unwrap_or(&file);
            format!(
                "{}/{}",
                base.trim_end_matches('/'),
                rel.to_string_lossy().replace('\\', "/")
            )
        });

        let metadata = DocumentMetadata {
            track: Some(title.clone()).filter(|t| !t.is_empty()),
            album,
            url,
            category: seed.category.clone(),
            project: seed.project.clone(),
            track_number,
            ..Default::default()
        };

        docs.push(NewDocument::new(title, content.trim()).with_metadata(metadata));
    }

    Ok(docs)
}

/// Split a numbered file stem into track number and display title.
///
/// `05_full_disclosure` → `(Some(5), "Full Disclosure")`,
/// `warning-shots` → `(None, "Warning Shots")`.
pub fn title_from_file_stem(stem: &str) -> (Option<u32>, String) {
    let digits: String = stem.chars().take_while(|c| c.is_ascii_digit()).collect();
    let (track_number, rest) = match digits.parse::<u32>() {
        Ok(n) if stem.len() > digits.len() => (Some(n), &stem[digits.len()..]),
        _ => (None, stem),
    };

    let title = rest
        .split(['_', '-', ' '])
        .filter(|w| !w.is_empty())
        .map(capitalize)
        .collect::<Vec<_>>()
        .join(" ");

    (track_number, title)
}

fn capitalize(word: &str) -> String {
    let mut chars = word.chars();
    match chars.next() {
        Some(first) => first.to_uppercase().chain(chars).collect(),
        None => String::new(),
    }
}

/// Insert `docs` into `store`, optionally clearing the corpus first.
pub async fn seed_store<S: Store + ?Sized>(
    store: &S,
    docs: Vec<NewDocument>,
    reset: bool,
) -> Result<SeedReport> {
    let mut report = SeedReport::default();

    if reset {
        report.cleared = store.count_documents().await?;
        store.clear_documents().await?;
    }

    for doc in docs {
        if doc.title.trim().is_empty() || doc.content.trim().is_empty() {
            tracing::debug!(title = %doc.title, "skipping empty catalog entry");
            report.skipped += 1;
            continue;
        }
        store.insert_document(doc).await?;
        report.inserted += 1;
    }

    tracing::info!(
        inserted = report.inserted,
        skipped = report.skipped,
        cleared = report.cleared,
        "catalog seeded"
    );
    Ok(report)
}

/// `lyr seed <path> [--reset]`.
pub async fn run_seed(config: &Config, path: &Path, reset: bool) -> Result<()> {
    if config.storage.backend == StorageBackend::Memory {
        bail!("the memory backend does not persist between runs; set storage.seed_path instead");
    }

    let docs = load_catalog(path, &config.seed)?;
    let store = backend::connect_store(config).await?;
    let report = seed_store(store.as_ref(), docs, reset).await?;

    println!("Seeded catalog from {}", path.display());
    if reset {
        println!("  cleared:  {}", report.cleared);
    }
    println!("  inserted: {}", report.inserted);
    println!("  skipped:  {}", report.skipped);
    println!("  total:    {}", store.count_documents().await?);

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use lyric_rag_core::store::memory::InMemoryStore;
    use tempfile::TempDir;

    #[test]
    fn test_title_from_numbered_stem() {
        assert_eq!(
            title_from_file_stem("05_full_disclosure"),
            (Some(5), "Full Disclosure".to_string())
        );
        assert_eq!(
            title_from_file_stem("warning-shots"),
            (None, "Warning Shots".to_string())
        );
        assert_eq!(title_from_file_stem("1999"), (None, "1999".to_string()));
    }

    #[test]
    fn test_load_json_catalog() {
        let tmp = TempDir::new().unwrap();
        let path = tmp.path().join("catalog.json");
        std::fs::write(
            &path,
            r#"[
                {"title": "Warning Shots", "content": "No retreat", "metadata": {"album": "Full Disclosure"}},
                {"title": "Ashes", "content": "Rising"}
            ]"#,
        )
        .unwrap();

        let docs = load_catalog(&path, &SeedConfig::default()).unwrap();
        assert_eq!(docs.len(), 2);
        assert_eq!(
            docs[0].metadata.as_ref().unwrap().album.as_deref(),
            Some("Full Disclosure")
        );
        assert!(docs[1].metadata.is_none());
    }

    #[test]
    fn test_load_directory_catalog() {
        let tmp = TempDir::new().unwrap();
        let album = tmp.path().join("full_disclosure");
        std::fs::create_dir_all(&album).unwrap();
        std::fs::write(album.join("02_warning_shots.md"), "Warning shots fired\n").unwrap();
        std::fs::write(album.join("01_intro.txt"), "Lights down").unwrap();
        std::fs::write(album.join("cover.png"), "not text").unwrap();

        let seed = SeedConfig {
            category: Some("lyrics".to_string()),
            project: None,
            base_url: Some("https://example.com/catalog/".to_string()),
        };
        let docs = load_catalog(tmp.path(), &seed).unwrap();
        assert_eq!(docs.len(), 2);
        assert_eq!(docs[0].title, "Intro");
        assert_eq!(docs[1].title, "Warning Shots");
        assert_eq!(docs[1].content, "Warning shots fired");

        let meta = docs[1].metadata.as_ref().unwrap();
        assert_eq!(meta.track_number, Some(2));
        assert_eq!(meta.album.as_deref(), Some("Full Disclosure"));
        assert_eq!(meta.category.as_deref(), Some("lyrics"));
        assert_eq!(
            meta.url.as_deref(),
            Some("https://example.com/catalog/full_disclosure/02_warning_shots.md")
        );
    }

    #[tokio::test]
    async fn test_seed_skips_empty_and_resets() {
        let store = InMemoryStore::new();
        store
            .insert_document(NewDocument::new("Old", "stale"))
            .await
            .unwrap();

        let docs = vec![
            NewDocument::new("Warning Shots", "No retreat"),
            NewDocument::new("", "orphan content"),
            NewDocument::new("Blank", "   "),
        ];
        let report = seed_store(&store, docs, true).await.unwrap();
        assert_eq!(
            report,
            SeedReport {
                cleared: 1,
                inserted: 1,
                skipped: 2
            }
        );
        assert_eq!(store.count_documents().await.unwrap(), 1);
    }
}
