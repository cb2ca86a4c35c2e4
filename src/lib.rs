//! # Lyric RAG
//!
//! A retrieval-augmented chat assistant for a catalog of song lyrics and
//! commentary. Questions are reduced to keywords, matched against the
//! catalog with a staged substring search, and answered with numbered
//! citations back to the source documents.
//!
//! ## Architecture
//!
//! ```text
//! ┌────────────┐     ┌─────────────────────┐     ┌────────────────┐
//! │  lyr seed  │────▶│        Store        │◀────│    lyr ask     │
//! │ JSON / dir │     │ SQLite or in-memory │     │ POST /api/chat │
//! └────────────┘     └──────────┬──────────┘     └───────┬────────┘
//!                               │ corpus                 │ query
//!                               ▼                        ▼
//!                   keywords ─▶ staged matcher ─▶ citations ─▶ synthesizer
//! ```
//!
//! The retrieval core (keywords, matcher, citations, template synthesizer,
//! chat pipeline) lives in `lyric-rag-core`; this crate adds the SQLite
//! store, configuration, seeding, the model-backed synthesizer, the CLI
//! and the HTTP server.
//!
//! ## Modules
//!
//! | Module | Purpose |
//! |--------|---------|
//! | [`config`] | TOML configuration parsing |
//! | [`db`] | Database connection |
//! | [`migrate`] | Schema creation |
//! | [`sqlite_store`] | SQLite `Store` implementation |
//! | [`backend`] | Backend selection from config |
//! | [`seed`] | Catalog loading |
//! | [`synthesis`] | Synthesizer selection, chat completions client |
//! | [`search`] | `lyr search` |
//! | [`ask`] | `lyr ask`, `lyr history` |
//! | [`get`] | Document lookup |
//! | [`stats`] | `lyr stats` |
//! | [`server`] | HTTP chat server |

pub mod ask;
pub mod backend;
pub mod config;
pub mod db;
pub mod get;
pub mod migrate;
pub mod search;
pub mod seed;
pub mod server;
pub mod sqlite_store;
pub mod stats;
pub mod synthesis;
