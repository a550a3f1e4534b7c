//! Query endpoint HTTP server.
//!
//! Accepts a query plus the concatenated document text, wraps both in the
//! fixed instruction prompt, invokes the configured [`LlmProvider`] once and
//! returns the generated text verbatim. Whether that text is well-formed JSON
//! is the caller's concern.
//!
//! # Endpoints
//!
//! | Method | Path | Description |
//! |--------|------|-------------|
//! | `POST` | `/api/query` | `{query, documents}` → `{text}` |
//! | `GET`  | `/health` | Health check (returns version) |
//!
//! # Error Contract
//!
//! ```json
//! { "error": "Query and documents are required" }
//! ```
//!
//! `400` when `query` or `documents` is absent, empty, or the body is not
//! JSON; `500` when the model invocation fails. The upstream failure reason is
//! logged, never returned.
//!
//! # CORS
//!
//! All origins, methods, and headers are permitted so browser-based clients
//! can call the endpoint directly.

use axum::{
    extract::{rejection::JsonRejection, State},
    http::StatusCode,
    response::{IntoResponse, Response},
    routing::{get, post},
    Json, Router,
};
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use tower_http::cors::{Any, CorsLayer};
use tracing::{error, info, warn};

use crate::config::Config;
use crate::llm::{create_provider, LlmProvider};
use crate::prompt::{build_user_prompt, SYSTEM_PROMPT};

/// Message returned with every `500`.
pub const INVOCATION_FAILED: &str = "Failed to process query";
/// Message returned when a required field is missing.
pub const FIELDS_REQUIRED: &str = "Query and documents are required";

/// Shared application state passed to all route handlers via Axum's `State` extractor.
#[derive(Clone)]
struct AppState {
    provider: Arc<dyn LlmProvider>,
    /// Output-token budget for each completion.
    max_tokens: u32,
}

/// Starts the query endpoint with the provider named in `[llm]`.
///
/// Binds to `[server].bind` and runs until the process is terminated.
pub async fn run_server(config: &Config) -> anyhow::Result<()> {
    let provider: Arc<dyn LlmProvider> = Arc::from(create_provider(&config.llm)?);
    run_server_with_provider(config, provider).await
}

/// Starts the query endpoint with an explicit provider.
///
/// Used by tests and by binaries that bring their own [`LlmProvider`].
pub async fn run_server_with_provider(
    config: &Config,
    provider: Arc<dyn LlmProvider>,
) -> anyhow::Result<()> {
    let bind_addr = config.server.bind.clone();
    if !config.llm.is_enabled() {
        warn!("llm provider is disabled; every query will fail with 500");
    }
    let app = router(provider, config.llm.max_tokens);

    let listener = tokio::net::TcpListener::bind(&bind_addr).await?;
    info!(addr = %bind_addr, provider = %config.llm.provider, "query endpoint listening");
    println!("Query endpoint listening on http://{}", bind_addr);

    axum::serve(listener, app).await?;

    Ok(())
}

/// Build the router without binding a socket.
pub fn router(provider: Arc<dyn LlmProvider>, max_tokens: u32) -> Router {
    let cors = CorsLayer::new()
        .allow_origin(Any)
        .allow_methods(Any)
        .allow_headers(Any);

    Router::new()
        .route("/api/query", post(handle_query))
        .route("/health", get(handle_health))
        .layer(cors)
        .with_state(AppState {
            provider,
            max_tokens,
        })
}

// ============ Error response ============

#[derive(Serialize)]
struct ErrorBody {
    error: String,
}

/// Internal error type that converts into an Axum HTTP response.
struct AppError {
    status: StatusCode,
    message: String,
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        (
            self.status,
            Json(ErrorBody {
                error: self.message,
            }),
        )
            .into_response()
    }
}

fn bad_request(message: impl Into<String>) -> AppError {
    AppError {
        status: StatusCode::BAD_REQUEST,
        message: message.into(),
    }
}

fn internal(message: impl Into<String>) -> AppError {
    AppError {
        status: StatusCode::INTERNAL_SERVER_ERROR,
        message: message.into(),
    }
}

// ============ GET /health ============

#[derive(Serialize)]
struct HealthResponse {
    status: String,
    version: String,
}

async fn handle_health() -> Json<HealthResponse> {
    Json(HealthResponse {
        status: "ok".to_string(),
        version: env!("CARGO_PKG_VERSION").to_string(),
    })
}

// ============ POST /api/query ============

#[derive(Deserialize)]
struct QueryBody {
    #[serde(default)]
    query: Option<String>,
    #[serde(default)]
    documents: Option<String>,
}

#[derive(Serialize)]
struct QueryResponse {
    text: String,
}

fn non_empty(field: Option<String>) -> Option<String> {
    field.filter(|s| !s.is_empty())
}

/// Handler for `POST /api/query`.
///
/// Content is never judged: any non-empty query and document block is passed
/// through to the model.
async fn handle_query(
    State(state): State<AppState>,
    body: Result<Json<QueryBody>, JsonRejection>,
) -> Result<Json<QueryResponse>, AppError> {
    let Json(body) = body.map_err(|e| bad_request(format!("Invalid request body: {}", e)))?;

    let (Some(query), Some(documents)) = (non_empty(body.query), non_empty(body.documents))
    else {
        return Err(bad_request(FIELDS_REQUIRED));
    };

    info!(
        query_chars = query.len(),
        document_chars = documents.len(),
        "query received"
    );

    let user_prompt = build_user_prompt(&query, &documents);
    let text = state
        .provider
        .generate(SYSTEM_PROMPT, &user_prompt, state.max_tokens)
        .await
        .map_err(|e| {
            error!(
                error = %format!("{:#}", e),
                model = state.provider.model_name(),
                "llm invocation failed"
            );
            internal(INVOCATION_FAILED)
        })?;

    Ok(Json(QueryResponse { text }))
}
