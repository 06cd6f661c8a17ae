//! HTTP surface: JSON over axum.
//!
//! `GET /health`, `POST /api/completion`, `POST /api/hover`,
//! `POST /api/definition`. "Nothing found" is always a 200 with an empty
//! payload; only a body that is not JSON, a dead worker or a panic is a 500.

use std::any::Any;
use std::sync::Arc;

use axum::body::Bytes;
use axum::extract::State;
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::routing::{get, post};
use axum::{Json, Router};
use serde::{Deserialize, Serialize};
use thiserror::Error;
use tower_http::catch_panic::CatchPanicLayer;
use tower_http::cors::CorsLayer;
use tracing::{error, info};

use crate::config::ServerConfig;
use crate::lsp::service::CodeIntel;
use crate::lsp::{DefinitionLocation, HoverResult, Symbol};

/// Failures the caller gets to see.
#[derive(Debug, Error)]
pub enum InternalFault {
    #[error("malformed request body: {0}")]
    BadBody(#[from] serde_json::Error),

    #[error("analysis task failed: {0}")]
    Worker(#[from] tokio::task::JoinError),

    #[error("request handler panicked: {0}")]
    Panic(String),
}

#[derive(Debug, Serialize)]
struct ErrorBody {
    error: String,
}

fn error_response(message: String) -> Response {
    (
        StatusCode::INTERNAL_SERVER_ERROR,
        Json(ErrorBody { error: message }),
    )
        .into_response()
}

impl IntoResponse for InternalFault {
    fn into_response(self) -> Response {
        error!(error = %self, "request failed");
        error_response(self.to_string())
    }
}

/// Body shared by the three query endpoints. Every field is optional.
#[derive(Debug, Default, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct QueryRequest {
    #[serde(alias = "code")]
    pub source_text: String,
    pub line: i64,
    pub character: i64,
}

impl QueryRequest {
    fn parse(body: &[u8]) -> Result<Self, InternalFault> {
        Ok(serde_json::from_slice(body)?)
    }
}

#[derive(Debug, Serialize)]
pub struct CompletionResponse {
    pub completions: Vec<Symbol>,
}

#[derive(Debug, Serialize)]
pub struct HoverResponse {
    pub hover: Option<HoverResult>,
}

#[derive(Debug, Serialize)]
pub struct DefinitionResponse {
    pub definitions: Vec<DefinitionLocation>,
}

#[derive(Debug, Serialize)]
struct Health {
    status: &'static str,
}

type AppState = Arc<CodeIntel>;

/// Run a query on the blocking pool. Parsing every request is CPU work.
async fn run<T, F>(intel: AppState, body: Bytes, query: F) -> Result<T, InternalFault>
where
    T: Send + 'static,
    F: FnOnce(&CodeIntel, QueryRequest) -> T + Send + 'static,
{
    let req = QueryRequest::parse(&body)?;
    Ok(tokio::task::spawn_blocking(move || query(&intel, req)).await?)
}

async fn health() -> Json<Health> {
    Json(Health { status: "ok" })
}

async fn completion(
    State(intel): State<AppState>,
    body: Bytes,
) -> Result<Json<CompletionResponse>, InternalFault> {
    let completions = run(intel, body, |intel, req| {
        intel.completion(&req.source_text, req.line, req.character)
    })
    .await?;
    Ok(Json(CompletionResponse { completions }))
}

async fn hover(
    State(intel): State<AppState>,
    body: Bytes,
) -> Result<Json<HoverResponse>, InternalFault> {
    let hover = run(intel, body, |intel, req| {
        intel.hover(&req.source_text, req.line, req.character)
    })
    .await?;
    Ok(Json(HoverResponse { hover }))
}

async fn definition(
    State(intel): State<AppState>,
    body: Bytes,
) -> Result<Json<DefinitionResponse>, InternalFault> {
    let definitions = run(intel, body, |intel, req| {
        intel.definition(&req.source_text, req.line, req.character)
    })
    .await?;
    Ok(Json(DefinitionResponse { definitions }))
}

fn handle_panic(payload: Box<dyn Any + Send + 'static>) -> Response {
    let detail = if let Some(s) = payload.downcast_ref::<String>() {
        s.clone()
    } else if let Some(s) = payload.downcast_ref::<&str>() {
        (*s).to_string()
    } else {
        "unknown panic".to_string()
    };
    InternalFault::Panic(detail).into_response()
}

/// The full application, ready for `axum::serve` or `oneshot`.
pub fn router(intel: Arc<CodeIntel>) -> Router {
    Router::new()
        .route("/health", get(health))
        .route("/api/completion", post(completion))
        .route("/api/hover", post(hover))
        .route("/api/definition", post(definition))
        .layer(CatchPanicLayer::custom(handle_panic))
        .layer(CorsLayer::permissive())
        .with_state(intel)
}

/// Bind and serve until Ctrl-C.
pub async fn serve(config: &ServerConfig, intel: Arc<CodeIntel>) -> std::io::Result<()> {
    let listener = tokio::net::TcpListener::bind(config.bind_addr()).await?;
    info!(addr = %listener.local_addr()?, engine = intel.engine_name(), "listening");
    axum::serve(listener, router(intel))
        .with_graceful_shutdown(shutdown_signal())
        .await
}

async fn shutdown_signal() {
    if tokio::signal::ctrl_c().await.is_ok() {
        info!("shutting down");
    }
}
