//! In-memory [`Store`] implementation for tests and ephemeral servers.
//!
//! Uses `Vec`s behind `std::sync::RwLock`. Ids count up from 1 and are
//! never reused, even after [`Store::clear_documents`]. Insertion
//! timestamps are forced to be strictly increasing so most-recent-first
//! ordering stays well defined for inserts within the same clock tick.

use std::sync::RwLock;

use anyhow::{anyhow, Result};
use async_trait::async_trait;
use chrono::{DateTime, Duration, Utc};

use crate::models::{Document, Message, NewDocument, NewMessage};

use super::Store;

struct Table<T> {
    rows: Vec<T>,
    next_id: i64,
    last_created: Option<DateTime<Utc>>,
}

impl<T> Table<T> {
    fn new() -> Self {
        Self {
            rows: Vec::new(),
            next_id: 1,
            last_created: None,
        }
    }

    /// Allocate the next id and a timestamp later than any issued before.
    fn allocate(&mut self) -> (i64, DateTime<Utc>) {
        let id = self.next_id;
        self.next_id += 1;

        let mut now = Utc::now();
        if let Some(last) = self.last_created {
            if now <= last {
                now = last + Duration::microseconds(1);
            }
        }
        self.last_created = Some(now);
        (id, now)
    }
}

/// In-memory store for tests and the `memory` storage backend.
pub struct InMemoryStore {
    documents: RwLock<Table<Document>>,
    messages: RwLock<Table<Message>>,
}

impl InMemoryStore {
    pub fn new() -> Self {
        Self {
            documents: RwLock::new(Table::new()),
            messages: RwLock::new(Table::new()),
        }
    }
}

impl Default for InMemoryStore {
    fn default() -> Self {
        Self::new()
    }
}

fn poisoned(what: &str) -> anyhow::Error {
    anyhow!("in-memory {} table lock poisoned", what)
}

#[async_trait]
impl Store for InMemoryStore {
    async fn insert_document(&self, doc: NewDocument) -> Result<Document> {
        let mut table = self.documents.write().map_err(|_| poisoned("documents"))?;
        let (id, created_at) = table.allocate();
        let stored = Document {
            id,
            title: doc.title,
            content: doc.content,
            metadata: doc.metadata,
            created_at,
        };
        table.rows.push(stored.clone());
        Ok(stored)
    }

    async fn list_documents(&self) -> Result<Vec<Document>> {
        let table = self.documents.read().map_err(|_| poisoned("documents"))?;
        let mut docs = table.rows.clone();
        docs.sort_by(|a, b| b.created_at.cmp(&a.created_at));
        Ok(docs)
    }

    async fn get_document(&self, id: i64) -> Result<Option<Document>> {
        let table = self.documents.read().map_err(|_| poisoned("documents"))?;
        Ok(table.rows.iter().find(|d| d.id == id).cloned())
    }

    async fn clear_documents(&self) -> Result<()> {
        let mut table = self.documents.write().map_err(|_| poisoned("documents"))?;
        table.rows.clear();
        Ok(())
    }

    async fn count_documents(&self) -> Result<usize> {
        let table = self.documents.read().map_err(|_| poisoned("documents"))?;
        Ok(table.rows.len())
    }

    async fn insert_message(&self, msg: NewMessage) -> Result<Message> {
        let mut table = self.messages.write().map_err(|_| poisoned("messages"))?;
        let (id, created_at) = table.allocate();
        let stored = Message {
            id,
            role: msg.role,
            content: msg.content,
            citations: msg.citations,
            created_at,
        };
        table.rows.push(stored.clone());
        Ok(stored)
    }

    async fn recent_messages(&self, limit: usize) -> Result<Vec<Message>> {
        let table = self.messages.read().map_err(|_| poisoned("messages"))?;
        Ok(table.rows.iter().rev().take(limit).cloned().collect())
    }

    async fn count_messages(&self) -> Result<usize> {
        let table = self.messages.read().map_err(|_| poisoned("messages"))?;
        Ok(table.rows.len())
    }

    async fn clear_messages(&self) -> Result<()> {
        let mut table = self.messages.write().map_err(|_| poisoned("messages"))?;
        table.rows.clear();
        Ok(())
    }
}
