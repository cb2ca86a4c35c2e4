//! `lyr ask` and `lyr history`: the chat pipeline from the command line.

use anyhow::Result;

use lyric_rag_core::chat::{self, ChatOptions};
use lyric_rag_core::models::Role;

use crate::backend;
use crate::config::Config;
use crate::synthesis::create_synthesizer;

/// Pipeline options derived from config.
pub fn chat_options(config: &Config) -> ChatOptions {
    ChatOptions {
        limit: config.retrieval.limit,
        persist: config.chat.persist_messages,
    }
}

pub async fn run_ask(config: &Config, question: &str, json: bool) -> Result<()> {
    let store = backend::open_store(config).await?;
    let synthesizer = create_synthesizer(&config.synthesis)?;
    tracing::debug!(synthesizer = synthesizer.name(), "answering question");

    let response = chat::answer(
        store.as_ref(),
        synthesizer.as_ref(),
        question,
        &chat_options(config),
    )
    .await?;

    if json {
        println!("{}", serde_json::to_string_pretty(&response)?);
        return Ok(());
    }

    println!("{}", response.answer);
    if !response.citations.is_empty() {
        println!();
        println!("Sources:");
        for (i, c) in response.citations.iter().enumerate() {
            println!("  [{}] {} (id {}, score {:.2})", i + 1, c.title, c.id, c.score);
        }
    }

    Ok(())
}

pub async fn run_history(config: &Config, limit: Option<usize>, clear: bool) -> Result<()> {
    let store = backend::open_store(config).await?;

    if clear {
        store.clear_messages().await?;
        println!("Chat history cleared.");
        return Ok(());
    }

    let limit = limit.unwrap_or(config.chat.history_limit);
    let mut messages = store.recent_messages(limit).await?;
    if messages.is_empty() {
        println!("No messages.");
        return Ok(());
    }

    // Oldest first reads like a transcript.
    messages.reverse();
    for msg in &messages {
        let who = match msg.role {
            Role::User => "you",
            Role::Assistant => "assistant",
        };
        println!(
            "[{}] {}: {}",
            msg.created_at.format("%Y-%m-%d %H:%M:%S"),
            who,
            msg.content
        );
        if let Some(citations) = msg.citations.as_ref().filter(|c| !c.is_empty()) {
            let titles: Vec<&str> = citations.iter().map(|c| c.title.as_str()).collect();
            println!("    sources: {}", titles.join(", "));
        }
    }

    Ok(())
}
