//! SQLite-backed [`Store`] implementation.
//!
//! Timestamps are stored as integer microseconds since the Unix epoch.
//! Metadata and citations are stored as JSON text. Inserts take
//! `max(now, latest + 1µs)` so `created_at` is strictly increasing per
//! table even when several rows land in the same clock tick.

use anyhow::{anyhow, Context, Result};
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use sqlx::sqlite::SqliteRow;
use sqlx::{Row, SqlitePool};

use lyric_rag_core::models::{
    Citation, Document, DocumentMetadata, Message, NewDocument, NewMessage, Role,
};
use lyric_rag_core::store::Store;

/// SQLite implementation of the [`Store`] trait.
///
/// Wraps a [`SqlitePool`]; the schema must already exist (see
/// [`crate::migrate::apply`]).
pub struct SqliteStore {
    pool: SqlitePool,
}

impl SqliteStore {
    pub fn new(pool: SqlitePool) -> Self {
        Self { pool }
    }

    pub fn pool(&self) -> &SqlitePool {
        &self.pool
    }
}

fn from_micros(us: i64) -> Result<DateTime<Utc>> {
    DateTime::from_timestamp_micros(us).ok_or_else(|| anyhow!("invalid timestamp: {}", us))
}

fn document_from_row(row: &SqliteRow) -> Result<Document> {
    let metadata_json: Option<String> = row.get("metadata_json");
    let metadata = match metadata_json {
        Some(json) => Some(
            serde_json::from_str::<DocumentMetadata>(&json)
                .context("corrupt document metadata")?,
        ),
        None => None,
    };

    Ok(Document {
        id: row.get("id"),
        title: row.get("title"),
        content: row.get("content"),
        metadata,
        created_at: from_micros(row.get("created_at"))?,
    })
}

fn message_from_row(row: &SqliteRow) -> Result<Message> {
    let role: String = row.get("role");
    let role = Role::parse(&role).ok_or_else(|| anyhow!("unknown message role: {}", role))?;

    let citations_json: Option<String> = row.get("citations_json");
    let citations = match citations_json {
        Some(json) => Some(
            serde_json::from_str::<Vec<Citation>>(&json).context("corrupt message citations")?,
        ),
        None => None,
    };

    Ok(Message {
        id: row.get("id"),
        role,
        content: row.get("content"),
        citations,
        created_at: from_micros(row.get("created_at"))?,
    })
}

#[async_trait]
impl Store for SqliteStore {
    async fn insert_document(&self, doc: NewDocument) -> Result<Document> {
        let metadata_json = doc.metadata.as_ref().map(serde_json::to_string).transpose()?;

        let row = sqlx::query(
            r#"
            INSERT INTO documents (title, content, metadata_json, created_at)
            VALUES (?, ?, ?, MAX(?, COALESCE((SELECT MAX(created_at) FROM documents), 0) + 1))
            RETURNING id, created_at
            "#,
        )
        .bind(&doc.title)
        .bind(&doc.content)
        .bind(&metadata_json)
        .bind(Utc::now().timestamp_micros())
        .fetch_one(&self.pool)
        .await?;

        Ok(Document {
            id: row.get("id"),
            title: doc.title,
            content: doc.content,
            metadata: doc.metadata,
            created_at: from_micros(row.get("created_at"))?,
        })
    }

    async fn list_documents(&self) -> Result<Vec<Document>> {
        let rows = sqlx::query(
            "SELECT id, title, content, metadata_json, created_at FROM documents ORDER BY created_at DESC, id DESC",
        )
        .fetch_all(&self.pool)
        .await?;

        rows.iter().map(document_from_row).collect()
    }

    async fn get_document(&self, id: i64) -> Result<Option<Document>> {
        let row = sqlx::query(
            "SELECT id, title, content, metadata_json, created_at FROM documents WHERE id = ?",
        )
        .bind(id)
        .fetch_optional(&self.pool)
        .await?;

        row.as_ref().map(document_from_row).transpose()
    }

    async fn clear_documents(&self) -> Result<()> {
        sqlx::query("DELETE FROM documents")
            .execute(&self.pool)
            .await?;
        Ok(())
    }

    async fn count_documents(&self) -> Result<usize> {
        let count: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM documents")
            .fetch_one(&self.pool)
            .await?;
        Ok(count as usize)
    }

    async fn insert_message(&self, msg: NewMessage) -> Result<Message> {
        let citations_json = msg.citations.as_ref().map(serde_json::to_string).transpose()?;

        let row = sqlx::query(
            r#"
            INSERT INTO messages (role, content, citations_json, created_at)
            VALUES (?, ?, ?, MAX(?, COALESCE((SELECT MAX(created_at) FROM messages), 0) + 1))
            RETURNING id, created_at
            "#,
        )
        .bind(msg.role.as_str())
        .bind(&msg.content)
        .bind(&citations_json)
        .bind(Utc::now().timestamp_micros())
        .fetch_one(&self.pool)
        .await?;

        Ok(Message {
            id: row.get("id"),
            role: msg.role,
            content: msg.content,
            citations: msg.citations,
            created_at: from_micros(row.get("created_at"))?,
        })
    }

    async fn recent_messages(&self, limit: usize) -> Result<Vec<Message>> {
        let rows = sqlx::query(
            "SELECT id, role, content, citations_json, created_at FROM messages ORDER BY created_at DESC, id DESC LIMIT ?",
        )
        .bind(limit as i64)
        .fetch_all(&self.pool)
        .await?;

        rows.iter().map(message_from_row).collect()
    }

    async fn count_messages(&self) -> Result<usize> {
        let count: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM messages")
            .fetch_one(&self.pool)
            .await?;
        Ok(count as usize)
    }

    async fn clear_messages(&self) -> Result<()> {
        sqlx::query("DELETE FROM messages")
            .execute(&self.pool)
            .await?;
        Ok(())
    }
}
