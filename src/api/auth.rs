//! Pre-shared API key check.
//!
//! A flat, configured set of keys; no scopes, no sessions, no per-key
//! bookkeeping — the core only ever sees an already-authenticated
//! request/session.

use axum::Json;
use axum::extract::{Query, Request, State};
use axum::http::{HeaderName, StatusCode};
use axum::middleware::Next;
use axum::response::{IntoResponse, Response};
use serde::Deserialize;
use serde_json::json;

use super::server::AppState;

pub static API_KEY_HEADER: HeaderName = HeaderName::from_static("x-api-key");

#[derive(Debug, Deserialize)]
pub struct ApiKeyQuery {
    api_key: Option<String>,
}

#[derive(Debug)]
pub struct AuthError;

impl IntoResponse for AuthError {
    fn into_response(self) -> Response {
        (
            StatusCode::UNAUTHORIZED,
            Json(json!({
                "error": "unauthorized",
                "code": "UNAUTHORIZED",
                "message": "missing or invalid API key",
            })),
        )
            .into_response()
    }
}

/// Extracts the caller's key from `X-API-Key` (preferred) or `?api_key=`.
pub fn extract_key(request: &Request) -> Option<String> {
    if let Some(v) = request.headers().get(&API_KEY_HEADER).and_then(|v| v.to_str().ok()) {
        return Some(v.to_string());
    }
    Query::<ApiKeyQuery>::try_from_uri(request.uri())
        .ok()
        .and_then(|q| q.0.api_key)
}

/// HTTP control-plane auth middleware: 401 on a missing/unknown key.
pub async fn require_api_key(
    State(state): State<AppState>,
    request: Request,
    next: Next,
) -> Result<Response, AuthError> {
    match extract_key(&request) {
        Some(key) if state.auth.is_valid(&key) => Ok(next.run(request).await),
        _ => Err(AuthError),
    }
}
