//! Storage backend selection.
//!
//! The backend is an explicit config value (`[storage] backend`), never
//! inferred from the environment. Both backends are handed out as
//! `Arc<dyn Store>` so the CLI and server are backend-agnostic.

use anyhow::Result;
use std::sync::Arc;

use lyric_rag_core::store::memory::InMemoryStore;
use lyric_rag_core::store::Store;

use crate::config::{Config, StorageBackend};
use crate::sqlite_store::SqliteStore;
use crate::{db, migrate, seed};

/// Open the configured backend with its schema in place.
pub async fn connect_store(config: &Config) -> Result<Arc<dyn Store>> {
    match config.storage.backend {
        StorageBackend::Memory => Ok(Arc::new(InMemoryStore::new())),
        StorageBackend::Sqlite => {
            let pool = db::connect(&config.db).await?;
            migrate::apply(&pool).await?;
            Ok(Arc::new(SqliteStore::new(pool)))
        }
    }
}

/// Open the configured backend and, if it is empty and
/// `storage.seed_path` is set, load that catalog into it.
pub async fn open_store(config: &Config) -> Result<Arc<dyn Store>> {
    let store = connect_store(config).await?;

    if let Some(path) = &config.storage.seed_path {
        if store.count_documents().await? == 0 {
            let docs = seed::load_catalog(path, &config.seed)?;
            let report = seed::seed_store(store.as_ref(), docs, false).await?;
            tracing::info!(
                path = %path.display(),
                inserted = report.inserted,
                "seeded empty store at startup"
            );
        }
    }

    Ok(store)
}
