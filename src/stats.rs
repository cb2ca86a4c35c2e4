//! Corpus and chat history overview for `lyr stats`.

use anyhow::Result;

use crate::backend;
use crate::config::{Config, StorageBackend};

pub async fn run_stats(config: &Config) -> Result<()> {
    let store = backend::open_store(config).await?;
    let documents = store.count_documents().await?;
    let messages = store.count_messages().await?;
    let newest = store.list_documents().await?.into_iter().next();

    println!("Lyric RAG Catalog Stats");
    println!("=======================");
    println!();
    match config.storage.backend {
        StorageBackend::Sqlite => {
            let size = std::fs::metadata(&config.db.path)
                .map(|m| m.len())
                .unwrap_or(0);
            println!("  Backend:     sqlite ({})", config.db.path.display());
            println!("  Size:        {}", format_bytes(size));
        }
        StorageBackend::Memory => println!("  Backend:     memory"),
    }
    println!();
    println!("  Documents:   {}", documents);
    if let Some(doc) = newest {
        println!("  Newest:      {} ({})", doc.title, doc.created_at.format("%Y-%m-%d %H:%M:%S"));
    }
    println!("  Messages:    {}", messages);
    println!();

    Ok(())
}

/// Format a byte count as a human-readable string (B, KB, MB, GB).
fn format_bytes(bytes: u64) -> String {
    const KB: u64 = 1024;
    const MB: u64 = 1024 * KB;
    const GB: u64 = 1024 * MB;

    if bytes >= GB {
        format!("{:.1} GB", bytes as f64 / GB as f64)
    } else if bytes >= MB {
        format!("{:.1} MB", bytes as f64 / MB as f64)
    } else if bytes >= KB {
        format!("{:.1} KB", bytes as f64 / KB as f64)
    } else {
        format!("{} B", bytes)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_format_bytes() {
        assert_eq!(format_bytes(0), "0 B");
        assert_eq!(format_bytes(2048), "2.0 KB");
        assert_eq!(format_bytes(3 * 1024 * 1024), "3.0 MB");
    }
}
