//! SQLite connection pool for the catalog database.

use anyhow::{Context, Result};
use sqlx::sqlite::{SqliteConnectOptions, SqliteJournalMode, SqlitePool, SqlitePoolOptions};
use std::time::Duration;

use crate::config::DbConfig;

const MAX_CONNECTIONS: u32 = 5;

/// Seeding holds a write lock while the server keeps answering chats.
const BUSY_TIMEOUT: Duration = Duration::from_secs(5);

/// Open (creating if needed) the catalog database at `[db].path`.
///
/// Missing parent directories are created. The database runs in WAL mode
/// so chat reads are not blocked by an in-progress seed.
pub async fn connect(db: &DbConfig) -> Result<SqlitePool> {
    if let Some(parent) = db.path.parent() {
        if !parent.as_os_str().is_empty() {
            std::fs::create_dir_all(parent).with_context(|| {
                format!("Failed to create database directory: {}", parent.display())
            })?;
        }
    }

    let options = SqliteConnectOptions::new()
        .filename(&db.path)
        .create_if_missing(true)
        .journal_mode(SqliteJournalMode::Wal)
        .busy_timeout(BUSY_TIMEOUT);

    let pool = SqlitePoolOptions::new()
        .max_connections(MAX_CONNECTIONS)
        .connect_with(options)
        .await
        .with_context(|| format!("Failed to open catalog database: {}", db.path.display()))?;

    Ok(pool)
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[tokio::test]
    async fn test_connect_creates_nested_directories_in_wal_mode() {
        let tmp = TempDir::new().unwrap();
        let db = DbConfig {
            path: tmp.path().join("data").join("catalog").join("lyr.sqlite"),
        };

        let pool = connect(&db).await.unwrap();
        assert!(db.path.exists());

        let mode: String = sqlx::query_scalar("PRAGMA journal_mode")
            .fetch_one(&pool)
            .await
            .unwrap();
        assert_eq!(mode, "wal");
    }

    #[tokio::test]
    async fn test_connect_reports_unusable_path() {
        let tmp = TempDir::new().unwrap();
        let blocker = tmp.path().join("not-a-dir");
        std::fs::write(&blocker, "").unwrap();
        let db = DbConfig {
            path: blocker.join("lyr.sqlite"),
        };

        let err = connect(&db).await.unwrap_err();
        assert!(err.to_string().contains("Failed to create database directory"));
    }
}
