//! Document retrieval by ID.
//!
//! Used by both the `lyr get` CLI command and `GET /api/documents/{id}`.

use anyhow::Result;
use std::fmt;

use lyric_rag_core::models::Document;
use lyric_rag_core::store::Store;

use crate::backend;
use crate::config::Config;

/// No document exists with the requested id. The server maps this to 404.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct DocumentNotFound(pub i64);

impl fmt::Display for DocumentNotFound {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "document not found: {}", self.0)
    }
}

impl std::error::Error for DocumentNotFound {}

/// Fetch a document, failing with [`DocumentNotFound`] when absent.
pub async fn get_document<S: Store + ?Sized>(store: &S, id: i64) -> Result<Document> {
    match store.get_document(id).await? {
        Some(doc) => Ok(doc),
        None => Err(DocumentNotFound(id).into()),
    }
}

pub async fn run_get(config: &Config, id: i64) -> Result<()> {
    let store = backend::open_store(config).await?;
    let doc = get_document(store.as_ref(), id).await?;

    println!("--- Document ---");
    println!("id:         {}", doc.id);
    println!("title:      {}", doc.title);
    println!("created_at: {}", doc.created_at.to_rfc3339());
    if let Some(meta) = &doc.metadata {
        println!("metadata:   {}", serde_json::to_string(meta)?);
    }
    println!();

    println!("--- Content ---");
    println!("{}", doc.content);

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use lyric_rag_core::models::NewDocument;
    use lyric_rag_core::store::memory::InMemoryStore;

    #[tokio::test]
    async fn test_missing_document_is_typed() {
        let store = InMemoryStore::new();
        store
            .insert_document(NewDocument::new("Ashes", "Rising from the ashes"))
            .await
            .unwrap();

        assert_eq!(get_document(&store, 1).await.unwrap().title, "Ashes");

        let err = get_document(&store, 7).await.unwrap_err();
        assert_eq!(err.downcast_ref::<DocumentNotFound>(), Some(&DocumentNotFound(7)));
        assert_eq!(err.to_string(), "document not found: 7");
    }
}
