//! Yell ingestion routes.
//!
//! - `POST /yell` - Authenticate a game server and queue its yell
//! - `GET /health` - Liveness plus current backlog

use std::any::Any;
use std::sync::Arc;

use axum::extract::State;
use axum::http::header::AUTHORIZATION;
use axum::http::HeaderMap;
use axum::response::{IntoResponse, Response};
use axum::routing::{get, post};
use axum::{Json, Router};
use bytes::Bytes;
use serde::{Deserialize, Serialize};
use tower_http::catch_panic::CatchPanicLayer;
use tower_http::trace::TraceLayer;
use tracing::debug;

use crate::relay::formatter::format_yell;
use crate::relay::queue::YellQueue;
use crate::relay::registry::ChannelRegistry;
use crate::server::error::ApiError;

/// Shared state for the ingestion endpoint.
#[derive(Clone)]
pub struct AppState {
    pub registry: Arc<ChannelRegistry>,
    pub queue: Arc<YellQueue>,
    pub max_message_length: usize,
}

/// Build the ingestion router.
pub fn router(state: AppState) -> Router {
    let routes = Router::new()
        .route("/yell", post(yell).fallback(method_not_allowed))
        .route("/health", get(health));

    with_middleware(routes).with_state(state)
}

/// Request tracing, plus a 500 JSON error in place of a dropped connection
/// when a handler panics.
fn with_middleware<S>(routes: Router<S>) -> Router<S>
where
    S: Clone + Send + Sync + 'static,
{
    routes
        .layer(CatchPanicLayer::custom(handle_panic))
        .layer(TraceLayer::new_for_http())
}

fn handle_panic(panic: Box<dyn Any + Send + 'static>) -> Response {
    let detail = if let Some(text) = panic.downcast_ref::<String>() {
        text.clone()
    } else if let Some(text) = panic.downcast_ref::<&str>() {
        text.to_string()
    } else {
        "unknown panic".to_string()
    };

    ApiError::Internal(anyhow::anyhow!("request handler panicked: {}", detail)).into_response()
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct YellRequest {
    message: Option<String>,
    player_name: Option<String>,
    server_name: Option<String>,
}

#[derive(Debug, Serialize)]
pub struct YellResponse {
    success: bool,
    message: &'static str,
}

#[derive(Debug, Serialize)]
pub struct HealthResponse {
    status: &'static str,
    pending: usize,
}

async fn yell(
    State(state): State<AppState>,
    headers: HeaderMap,
    body: Bytes,
) -> Result<Json<YellResponse>, ApiError> {
    let credential = bearer_token(&headers)
        .ok_or(ApiError::Unauthorized("Missing or invalid Authorization header"))?;

    let mut server = state
        .registry
        .resolve_by_credential(credential)
        .ok_or(ApiError::Unauthorized("Invalid API key"))?;

    let request: YellRequest = serde_json::from_slice(&body)
        .map_err(|e| ApiError::Validation(format!("Invalid request body: {}", e)))?;

    let message = non_blank(request.message.as_deref())
        .ok_or_else(|| ApiError::Validation("Message is required".to_string()))?;

    if let Some(name) = non_blank(request.server_name.as_deref()) {
        server = state
            .registry
            .resolve_by_name(name)
            .ok_or_else(|| ApiError::Validation(format!("Server not found: {}", name)))?;
    }

    let channel = state
        .registry
        .destination_channel(server)
        .ok_or_else(|| ApiError::Resolution(server.name.clone()))?;

    let text = format_yell(
        &server.name,
        non_blank(request.player_name.as_deref()),
        message,
        state.max_message_length,
    );
    debug!(server = %server.name, channel = %channel.name, "Accepted yell");
    state.queue.enqueue(channel, text)?;

    Ok(Json(YellResponse {
        success: true,
        message: "Yell message queued",
    }))
}

async fn health(State(state): State<AppState>) -> Json<HealthResponse> {
    Json(HealthResponse {
        status: "ok",
        pending: state.queue.size(),
    })
}

async fn method_not_allowed() -> ApiError {
    ApiError::MethodNotAllowed
}

fn bearer_token(headers: &HeaderMap) -> Option<&str> {
    headers
        .get(AUTHORIZATION)
        .and_then(|value| value.to_str().ok())
        .and_then(|header| header.strip_prefix("Bearer "))
        .filter(|token| !token.is_empty())
}

fn non_blank(value: Option<&str>) -> Option<&str> {
    value.filter(|v| !v.trim().is_empty())
}
