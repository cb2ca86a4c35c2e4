//! # Lyric RAG Core
//!
//! Shared, runtime-agnostic logic for Lyric RAG: catalog data models,
//! query keyword extraction, the store abstraction, the staged matcher,
//! citation formatting, and answer synthesis.
//!
//! This crate contains no tokio, sqlx, filesystem I/O, or other
//! native-only dependencies. Storage backends and model-backed
//! synthesizers live in the `lyric-rag` app crate.
//!
//! ## Pipeline
//!
//! ```text
//! query ─▶ keywords::extract ─▶ search::rank_documents ─▶ citation::format_citations
//!                                        │
//!                                        └──────────────▶ synth::Synthesizer ─▶ answer
//! ```

pub mod chat;
pub mod citation;
pub mod keywords;
pub mod models;
pub mod search;
pub mod store;
pub mod synth;
