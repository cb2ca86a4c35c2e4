//! Core data models used throughout Lyric RAG.
//!
//! These types represent the catalog documents, derived citations, and
//! chat history records that flow through the retrieval pipeline. JSON
//! field names are camelCase to match the chat client's wire shapes.

use std::collections::BTreeMap;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Optional descriptive fields attached to a catalog document.
///
/// Ingestion sources populate different subsets, so every field is
/// optional. Unrecognized keys are preserved in `extra`.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DocumentMetadata {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub track: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub album: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub url: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub category: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub project: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub track_number: Option<u32>,
    #[serde(flatten)]
    pub extra: BTreeMap<String, serde_json::Value>,
}

/// A lyric or commentary document stored in the corpus.
///
/// Documents are immutable once inserted; the corpus can only be
/// appended to or cleared wholesale.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Document {
    /// Store-assigned identifier, unique within the corpus.
    pub id: i64,
    pub title: String,
    /// Body text searched by the matcher.
    pub content: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub metadata: Option<DocumentMetadata>,
    /// Insertion time; the only ordering key used by the matcher.
    pub created_at: DateTime<Utc>,
}

/// A document awaiting insertion. The store assigns `id` and `created_at`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct NewDocument {
    pub title: String,
    pub content: String,
    #[serde(default)]
    pub metadata: Option<DocumentMetadata>,
}

impl NewDocument {
    pub fn new(title: impl Into<String>, content: impl Into<String>) -> Self {
        Self {
            title: title.into(),
            content: content.into(),
            metadata: None,
        }
    }

    pub fn with_metadata(mut self, metadata: DocumentMetadata) -> Self {
        self.metadata = Some(metadata);
        self
    }
}

/// A reference from a synthesized answer back to a source document.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Citation {
    /// Source [`Document::id`].
    pub id: i64,
    pub title: String,
    /// Rank-derived display score; not a relevance probability.
    pub score: f64,
}

/// Output of keyword extraction for a single query.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct KeywordSet {
    /// Primary term first, then supplementary word-level terms.
    pub keywords: Vec<String>,
    /// True when a pattern, quoted string, or capitalization heuristic applied.
    pub is_natural_language: bool,
}

impl KeywordSet {
    /// The primary keyword. Extraction always yields at least one term.
    pub fn primary(&self) -> &str {
        self.keywords.first().map(String::as_str).unwrap_or_default()
    }

    /// Word-level terms used by the fallback pass.
    pub fn supplementary(&self) -> &[String] {
        self.keywords.get(1..).unwrap_or_default()
    }
}

/// Author of a chat message.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Role {
    User,
    Assistant,
}

impl Role {
    pub fn as_str(&self) -> &'static str {
        match self {
            Role::User => "user",
            Role::Assistant => "assistant",
        }
    }

    pub fn parse(s: &str) -> Option<Self> {
        match s {
            "user" => Some(Role::User),
            "assistant" => Some(Role::Assistant),
            _ => None,
        }
    }
}

/// A persisted chat history entry.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Message {
    pub id: i64,
    pub role: Role,
    pub content: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub citations: Option<Vec<Citation>>,
    pub created_at: DateTime<Utc>,
}

/// A chat message awaiting insertion.
#[derive(Debug, Clone, PartialEq)]
pub struct NewMessage {
    pub role: Role,
    pub content: String,
    pub citations: Option<Vec<Citation>>,
}

impl NewMessage {
    pub fn user(content: impl Into<String>) -> Self {
        Self {
            role: Role::User,
            content: content.into(),
            citations: None,
        }
    }

    pub fn assistant(content: impl Into<String>, citations: Vec<Citation>) -> Self {
        Self {
            role: Role::Assistant,
            content: content.into(),
            citations: Some(citations),
        }
    }
}
