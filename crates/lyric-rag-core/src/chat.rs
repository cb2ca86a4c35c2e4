//! Question-answering pipeline: search, cite, synthesize, record.
//!
//! This is the shared entry point behind `lyr ask` and `POST /api/chat`.
//! Retrieval failures never surface here (see
//! [`search_store`](crate::search::search_store)); only an empty query or
//! a synthesizer failure produce an error.

use anyhow::{bail, Result};
use serde::Serialize;

use crate::citation::format_citations;
use crate::models::{Citation, NewMessage};
use crate::search::{search_store, MatchStage};
use crate::store::Store;
use crate::synth::Synthesizer;

/// Per-request pipeline settings.
#[derive(Debug, Clone)]
pub struct ChatOptions {
    /// Maximum documents retrieved and cited.
    pub limit: usize,
    /// Record the question and answer in the store's message log.
    pub persist: bool,
}

impl Default for ChatOptions {
    fn default() -> Self {
        Self {
            limit: 6,
            persist: true,
        }
    }
}

/// Answer plus citations, matching the chat endpoint's response body.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ChatResponse {
    pub answer: String,
    pub citations: Vec<Citation>,
}

/// Answer `query` from the corpus in `store`.
pub async fn answer<S: Store + ?Sized>(
    store: &S,
    synthesizer: &dyn Synthesizer,
    query: &str,
    options: &ChatOptions,
) -> Result<ChatResponse> {
    let query = query.trim();
    if query.is_empty() {
        bail!("query must not be empty");
    }

    let ranked = search_store(store, query, options.limit).await;
    if ranked.stage == MatchStage::NoMatch {
        tracing::info!(query, "no catalog documents matched");
    }

    let citations = format_citations(&ranked.documents);
    let answer = synthesizer.synthesize(query, &ranked.documents).await?;

    if options.persist {
        record_exchange(store, query, &answer, &citations).await;
    }

    Ok(ChatResponse { answer, citations })
}

/// Best-effort write of the exchange to the message log.
async fn record_exchange<S: Store + ?Sized>(store: &S, query: &str, answer: &str, citations: &[Citation]) {
    if let Err(e) = store.insert_message(NewMessage::user(query)).await {
        tracing::warn!(error = %e, "failed to record user message");
        return;
    }
    if let Err(e) = store
        .insert_message(NewMessage::assistant(answer, citations.to_vec()))
        .await
    {
        tracing::warn!(error = %e, "failed to record assistant message");
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::{NewDocument, Role};
    use crate::store::memory::InMemoryStore;
    use crate::synth::{TemplateSynthesizer, NO_RESULTS_MESSAGE};

    async fn seeded_store() -> InMemoryStore {
        let store = InMemoryStore::new();
        store
            .insert_document(NewDocument::new(
                "Warning Shots",
                "Warning shots fired, no retreat, no surrender. A song about resilience.",
            ))
            .await
            .unwrap();
        store
            .insert_document(NewDocument::new(
                "Full Disclosure",
                "Full disclosure, no composure when I enter the room",
            ))
            .await
            .unwrap();
        store
    }

    #[tokio::test]
    async fn test_answer_with_citation() {
        let store = seeded_store().await;
        let synth = TemplateSynthesizer::new();
        let response = answer(
            &store,
            &synth,
            "What is Warning Shots about?",
            &ChatOptions::default(),
        )
        .await
        .unwrap();

        assert_eq!(response.citations.len(), 1);
        assert_eq!(response.citations[0].id, 1);
        assert_eq!(response.citations[0].title, "Warning Shots");
        assert_eq!(response.citations[0].score, 0.85);
        assert!(response.answer.contains("[1]"));
    }

    #[tokio::test]
    async fn test_no_results_answer() {
        let store = seeded_store().await;
        let synth = TemplateSynthesizer::new();
        let response = answer(&store, &synth, "asdkjasdlkj", &ChatOptions::default())
            .await
            .unwrap();
        assert!(response.citations.is_empty());
        assert_eq!(response.answer, NO_RESULTS_MESSAGE);
    }

    #[tokio::test]
    async fn test_empty_query_rejected() {
        let store = seeded_store().await;
        let synth = TemplateSynthesizer::new();
        let err = answer(&store, &synth, "   ", &ChatOptions::default())
            .await
            .unwrap_err();
        assert!(err.to_string().contains("must not be empty"));
    }

    #[tokio::test]
    async fn test_exchange_is_persisted() {
        let store = seeded_store().await;
        let synth = TemplateSynthesizer::new();
        answer(&store, &synth, "Swordfish", &ChatOptions::default())
            .await
            .unwrap();

        let messages = store.recent_messages(10).await.unwrap();
        assert_eq!(messages.len(), 2);
        assert_eq!(messages[0].role, Role::Assistant);
        assert_eq!(messages[0].citations.as_deref(), Some(&[][..]));
        assert_eq!(messages[1].role, Role::User);
        assert_eq!(messages[1].content, "Swordfish");
    }

    #[tokio::test]
    async fn test_persist_disabled() {
        let store = seeded_store().await;
        let synth = TemplateSynthesizer::new();
        let options = ChatOptions {
            limit: 6,
            persist: false,
        };
        answer(&store, &synth, "full disclosure", &options).await.unwrap();
        assert!(store.recent_messages(10).await.unwrap().is_empty());
    }
}
