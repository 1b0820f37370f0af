//! Control API (HTTP) and WebSocket upgrade endpoint.

pub mod auth;
pub mod middleware;
pub mod routes;
mod server;
pub mod types;

pub use server::{ApiServer, AppState};
