//! Storage abstraction for Lyric RAG.
//!
//! The [`Store`] trait defines every storage operation the retrieval and
//! chat pipeline needs, so the matcher is written once and runs against
//! any backend (SQLite in the app crate, [`memory::InMemoryStore`] here).
//!
//! Implementations must be `Send + Sync` to work with async runtimes and
//! must tolerate concurrent readers. The core never writes documents;
//! only ingestion does.

pub mod memory;

use anyhow::Result;
use async_trait::async_trait;

use crate::models::{Document, Message, NewDocument, NewMessage};

/// Abstract storage backend for the catalog corpus and chat history.
///
/// All operations are async (via `async-trait`) so that database-backed
/// implementations can await I/O. In-memory implementations return
/// immediately-ready futures.
///
/// # Operations
///
/// | Method | Purpose |
/// |--------|---------|
/// | [`insert_document`](Store::insert_document) | Append a document, assigning id and timestamp |
/// | [`list_documents`](Store::list_documents) | Full corpus snapshot, most recent first |
/// | [`get_document`](Store::get_document) | Keyed lookup |
/// | [`clear_documents`](Store::clear_documents) | Corpus reset before re-seeding |
/// | [`count_documents`](Store::count_documents) | Corpus size |
/// | [`insert_message`](Store::insert_message) | Append to chat history |
/// | [`recent_messages`](Store::recent_messages) | Latest chat messages |
/// | [`count_messages`](Store::count_messages) | Chat history size |
/// | [`clear_messages`](Store::clear_messages) | Wipe chat history |
#[async_trait]
pub trait Store: Send + Sync {
    /// Insert a document. The store assigns the id and `created_at`.
    async fn insert_document(&self, doc: NewDocument) -> Result<Document>;

    /// Return every document, ordered by `created_at` descending.
    async fn list_documents(&self) -> Result<Vec<Document>>;

    /// Retrieve a single document by id.
    async fn get_document(&self, id: i64) -> Result<Option<Document>>;

    /// Delete every document.
    async fn clear_documents(&self) -> Result<()>;

    /// Number of documents in the corpus.
    async fn count_documents(&self) -> Result<usize>;

    /// Append a chat message.
    async fn insert_message(&self, msg: NewMessage) -> Result<Message>;

    /// Return up to `limit` messages, most recent first.
    async fn recent_messages(&self, limit: usize) -> Result<Vec<Message>>;

    /// Number of stored chat messages.
    async fn count_messages(&self) -> Result<usize>;

    /// Delete every chat message.
    async fn clear_messages(&self) -> Result<()>;
}
