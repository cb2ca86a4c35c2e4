//! HTTP chat server.
//!
//! Exposes the chat pipeline and catalog lookups as a small JSON API for
//! the browser chat client.
//!
//! # Endpoints
//!
//! | Method | Path | Description |
//! |--------|------|-------------|
//! | `POST`   | `/api/chat` | `{ "query" }` → `{ "answer", "citations" }` |
//! | `GET`    | `/api/documents/{id}` | Full document |
//! | `GET`    | `/api/messages?limit=N` | Recent chat messages, newest first |
//! | `DELETE` | `/api/messages` | Clear chat history |
//! | `GET`    | `/health` | Status, version, document count |
//!
//! # Error Contract
//!
//! ```json
//! { "error": "query must not be empty" }
//! ```
//!
//! `400` for an empty query or malformed body, `404` for an unknown
//! document, `500` for anything else.
//!
//! # CORS
//!
//! All origins, methods, and headers are permitted so the chat client can
//! be served from a different origin.

use axum::{
    extract::{rejection::JsonRejection, Path, Query, State},
    http::StatusCode,
    response::{IntoResponse, Response},
    routing::{get, post},
    Json, Router,
};
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use tower_http::cors::{Any, CorsLayer};
use tower_http::trace::TraceLayer;

use lyric_rag_core::chat::{self, ChatOptions, ChatResponse};
use lyric_rag_core::models::{Document, Message};
use lyric_rag_core::store::Store;
use lyric_rag_core::synth::Synthesizer;

use crate::ask::chat_options;
use crate::backend;
use crate::config::Config;
use crate::get::{self as lookup, DocumentNotFound};
use crate::synthesis::create_synthesizer;

/// Shared state passed to all route handlers via Axum's `State` extractor.
#[derive(Clone)]
pub struct AppState {
    pub store: Arc<dyn Store>,
    pub synthesizer: Arc<dyn Synthesizer>,
    pub options: ChatOptions,
    pub history_limit: usize,
}

impl AppState {
    pub fn new(config: &Config, store: Arc<dyn Store>, synthesizer: Arc<dyn Synthesizer>) -> Self {
        Self {
            store,
            synthesizer,
            options: chat_options(config),
            history_limit: config.chat.history_limit,
        }
    }
}

/// Build the router with every route and the CORS and trace layers.
pub fn router(state: AppState) -> Router {
    let cors = CorsLayer::new()
        .allow_origin(Any)
        .allow_methods(Any)
        .allow_headers(Any);

    Router::new()
        .route("/api/chat", post(handle_chat))
        .route("/api/documents/{id}", get(handle_get_document))
        .route(
            "/api/messages",
            get(handle_list_messages).delete(handle_clear_messages),
        )
        .route("/health", get(handle_health))
        .layer(TraceLayer::new_for_http())
        .layer(cors)
        .with_state(state)
}

/// Starts the HTTP server on `[server].bind` and runs until terminated.
pub async fn run_server(config: &Config) -> anyhow::Result<()> {
    let store = backend::open_store(config).await?;
    let synthesizer: Arc<dyn Synthesizer> = Arc::from(create_synthesizer(&config.synthesis)?);

    let documents = store.count_documents().await?;
    tracing::info!(
        backend = ?config.storage.backend,
        synthesizer = synthesizer.name(),
        documents,
        "starting server"
    );

    let app = router(AppState::new(config, store, synthesizer));

    let listener = tokio::net::TcpListener::bind(&config.server.bind).await?;
    println!("Lyric RAG server listening on http://{}", listener.local_addr()?);
    axum::serve(listener, app).await?;

    Ok(())
}

// ============ Error Handling ============

#[derive(Debug)]
pub struct AppError {
    status: StatusCode,
    message: String,
}

#[derive(Serialize)]
struct ErrorBody {
    error: String,
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        (self.status, Json(ErrorBody { error: self.message })).into_response()
    }
}

fn bad_request(message: impl Into<String>) -> AppError {
    AppError {
        status: StatusCode::BAD_REQUEST,
        message: message.into(),
    }
}

fn not_found(message: impl Into<String>) -> AppError {
    AppError {
        status: StatusCode::NOT_FOUND,
        message: message.into(),
    }
}

fn internal(err: anyhow::Error) -> AppError {
    tracing::error!(error = %err, "request failed");
    AppError {
        status: StatusCode::INTERNAL_SERVER_ERROR,
        message: err.to_string(),
    }
}

// ============ Handlers ============

#[derive(Debug, Deserialize)]
struct ChatRequest {
    #[serde(default, alias = "message")]
    query: String,
}

async fn handle_chat(
    State(state): State<AppState>,
    body: Result<Json<ChatRequest>, JsonRejection>,
) -> Result<Json<ChatResponse>, AppError> {
    let Json(req) = body.map_err(|e| bad_request(e.body_text()))?;

    if req.query.trim().is_empty() {
        return Err(bad_request("query must not be empty"));
    }

    let response = chat::answer(
        state.store.as_ref(),
        state.synthesizer.as_ref(),
        &req.query,
        &state.options,
    )
    .await
    .map_err(internal)?;

    Ok(Json(response))
}

async fn handle_get_document(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> Result<Json<Document>, AppError> {
    let id: i64 = id
        .parse()
        .map_err(|_| bad_request(format!("invalid document id: {}", id)))?;

    match lookup::get_document(state.store.as_ref(), id).await {
        Ok(doc) => Ok(Json(doc)),
        Err(err) if err.is::<DocumentNotFound>() => Err(not_found(err.to_string())),
        Err(err) => Err(internal(err)),
    }
}

#[derive(Debug, Deserialize)]
struct MessagesQuery {
    limit: Option<usize>,
}

async fn handle_list_messages(
    State(state): State<AppState>,
    Query(params): Query<MessagesQuery>,
) -> Result<Json<Vec<Message>>, AppError> {
    let limit = params.limit.unwrap_or(state.history_limit);
    let messages = state.store.recent_messages(limit).await.map_err(internal)?;
    Ok(Json(messages))
}

async fn handle_clear_messages(State(state): State<AppState>) -> Result<StatusCode, AppError> {
    state.store.clear_messages().await.map_err(internal)?;
    Ok(StatusCode::NO_CONTENT)
}

#[derive(Serialize)]
struct HealthResponse {
    status: &'static str,
    version: &'static str,
    documents: usize,
}

async fn handle_health(State(state): State<AppState>) -> Result<Json<HealthResponse>, AppError> {
    let documents = state.store.count_documents().await.map_err(internal)?;
    Ok(Json(HealthResponse {
        status: "ok",
        version: env!("CARGO_PKG_VERSION"),
        documents,
    }))
}
