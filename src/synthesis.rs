//! Synthesizer construction and the model-backed implementation.
//!
//! [`create_synthesizer`] picks an implementation from `[synthesis]`:
//!
//! - **`template`** (default): [`TemplateSynthesizer`] from the core crate.
//!   Deterministic, offline, never fails.
//! - **`openai`**: [`ChatCompletionSynthesizer`], which sends the ranked
//!   documents as numbered context to any OpenAI-compatible
//!   `POST {base_url}/chat/completions` endpoint.
//!
//! # Retry Strategy
//!
//! HTTP 429 and 5xx responses and network errors are retried with
//! exponential backoff (1s, 2s, 4s, ...) up to `max_retries` times.
//! Other 4xx responses fail immediately.
//!
//! When retrieval found nothing the model is not called; the canned
//! no-results answer is returned instead so the model cannot answer from
//! outside the catalog.

use anyhow::{anyhow, bail, Result};
use async_trait::async_trait;
use std::time::Duration;

use lyric_rag_core::models::Document;
use lyric_rag_core::synth::{Synthesizer, TemplateSynthesizer, NO_RESULTS_MESSAGE};

use crate::config::SynthesisConfig;

/// Characters of each document included in the prompt context.
pub const MAX_CONTEXT_CHARS: usize = 1800;

const SYSTEM_PROMPT: &str =
    "You are a helpful, precise assistant for a music library of lyrics and commentary.";

/// Build the configured synthesizer.
///
/// # Errors
///
/// Returns an error for an unknown provider, a missing model, or an
/// unset API key environment variable.
pub fn create_synthesizer(config: &SynthesisConfig) -> Result<Box<dyn Synthesizer>> {
    match config.provider.as_str() {
        "template" => Ok(Box::new(match config.theme_seed {
            Some(seed) => TemplateSynthesizer::with_theme_seed(seed),
            None => TemplateSynthesizer::new(),
        })),
        "openai" => Ok(Box::new(ChatCompletionSynthesizer::new(config)?)),
        other => bail!("Unknown synthesis provider: '{}'", other),
    }
}

/// Synthesizer backed by an OpenAI-compatible chat completions API.
pub struct ChatCompletionSynthesizer {
    client: reqwest::Client,
    endpoint: String,
    model: String,
    api_key: String,
    max_retries: u32,
}

impl ChatCompletionSynthesizer {
    pub fn new(config: &SynthesisConfig) -> Result<Self> {
        let model = config
            .model
            .clone()
            .ok_or_else(|| anyhow!("synthesis.model required for the openai provider"))?;

        let api_key = std::env::var(&config.api_key_env)
            .map_err(|_| anyhow!("{} environment variable not set", config.api_key_env))?;

        let client = reqwest::Client::builder()
            .timeout(Duration::from_secs(config.timeout_secs))
            .build()?;

        Ok(Self {
            client,
            endpoint: format!("{}/chat/completions", config.base_url.trim_end_matches('/')),
            model,
            api_key,
            max_retries: config.max_retries,
        })
    }
}

/// Numbered context block plus instructions, as sent in the user turn.
pub fn build_prompt(query: &str, documents: &[Document]) -> String {
    let contexts = documents
        .iter()
        .enumerate()
        .map(|(i, doc)| {
            let text: String = doc.content.chars().take(MAX_CONTEXT_CHARS).collect();
            format!("[{}] {}\n{}", i + 1, doc.title, text)
        })
        .collect::<Vec<_>>()
        .join("\n\n");

    format!(
        "Answer using only the provided context, with citations like [1], [2]. \
         If the answer is not in the context, say so.\n\n\
         Question: {}\n\nContext:\n{}",
        query, contexts
    )
}

/// Extract `choices[0].message.content` from a chat completions response.
fn parse_completion(json: &serde_json::Value) -> Result<String> {
    json.get("choices")
        .and_then(|c| c.get(0))
        .and_then(|c| c.get("message"))
        .and_then(|m| m.get("content"))
        .and_then(|c| c.as_str())
        .map(|s| s.trim().to_string())
        .ok_or_else(|| anyhow!("Invalid chat completion response: missing message content"))
}

#[async_trait]
impl Synthesizer for ChatCompletionSynthesizer {
    fn name(&self) -> &str {
        "openai"
    }

    async fn synthesize(&self, query: &str, documents: &[Document]) -> Result<String> {
        if documents.is_empty() {
            return Ok(NO_RESULTS_MESSAGE.to_string());
        }

        let body = serde_json::json!({
            "model": self.model,
            "messages": [
                { "role": "system", "content": SYSTEM_PROMPT },
                { "role": "user", "content": build_prompt(query, documents) },
            ],
        });

        let mut last_err = None;

        for attempt in 0..=self.max_retries {
            if attempt > 0 {
                // Exponential backoff: 1s, 2s, 4s, 8s, ...
                let delay = Duration::from_secs(1 << (attempt - 1).min(5));
                tracing::debug!(attempt, ?delay, "retrying chat completion");
                tokio::time::sleep(delay).await;
            }

            let resp = self
                .client
                .post(&self.endpoint)
                .bearer_auth(&self.api_key)
                .json(&body)
                .send()
                .await;

            match resp {
                Ok(response) => {
                    let status = response.status();

                    if status.is_success() {
                        let json: serde_json::Value = response.json().await?;
                        return parse_completion(&json);
                    }

                    if status.as_u16() == 429 || status.is_server_error() {
                        let body_text = response.text().await.unwrap_or_default();
                        last_err = Some(anyhow!("Chat completion error {}: {}", status, body_text));
                        continue;
                    }

                    let body_text = response.text().await.unwrap_or_default();
                    bail!("Chat completion error {}: {}", status, body_text);
                }
                Err(e) => {
                    last_err = Some(e.into());
                    continue;
                }
            }
        }

        Err(last_err.unwrap_or_else(|| anyhow!("Chat completion failed after retries")))
    }
}
