//! HTTP middleware: permissive CORS for the control API.
//!
//! The teacher scopes CORS to a configured allow-list of UI origins; this
//! broker has no browser UI of its own and is fronted by whatever
//! dashboard a deployer builds against it, so the origin list isn't known
//! ahead of time.

use axum::http::{Method, StatusCode, header};
use axum::response::IntoResponse;
use tower_http::cors::{Any, CorsLayer};

use super::auth::API_KEY_HEADER;

pub fn cors() -> CorsLayer {
    CorsLayer::new()
        .allow_origin(Any)
        .allow_methods([Method::GET, Method::POST, Method::DELETE])
        .allow_headers([header::CONTENT_TYPE, header::AUTHORIZATION, API_KEY_HEADER.clone()])
}

pub async fn handle_404() -> impl IntoResponse {
    (StatusCode::NOT_FOUND, "not found")
}
