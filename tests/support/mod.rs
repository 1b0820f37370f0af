//! Shared scaffolding for the end-to-end test suites: builds a real
//! `ApiServer` against an in-memory `TopicManager`, either driven in
//! process via `tower::ServiceExt::oneshot` (control-plane tests) or bound
//! to a real `TcpListener` for wire-protocol tests that need an actual
//! WebSocket client.
//!
//! Each `tests/*.rs` file is its own crate and only uses a subset of this
//! module's helpers — `dead_code` is expected per-binary.
#![allow(dead_code)]

use std::time::Duration;

use pubsub_broker::api::ApiServer;
use pubsub_broker::broker::{ManagerConfig, TopicManager};
use pubsub_broker::core::{AppConfig, CliConfig, ShutdownService};

pub const TEST_API_KEY: &str = "it-test-key";

/// Small queue/ring settings so tests don't need many messages to observe
/// eviction or ring-wrap behavior.
pub fn test_config() -> AppConfig {
    AppConfig::load(&CliConfig {
        api_keys: Some(vec![TEST_API_KEY.to_string()]),
        default_ring_size: Some(4),
        max_ring_size: Some(1000),
        subscriber_queue_size: Some(8),
        slow_consumer_threshold: Some(3),
        shutdown_timeout_sec: Some(2),
        ..Default::default()
    })
    .expect("valid test config")
}

pub fn build_server(config: AppConfig) -> ApiServer {
    build_server_with_shutdown(config).0
}

/// Like [`build_server`] but also hands back the [`ShutdownService`], for
/// tests that need to trigger a drain directly rather than through the
/// `/shutdown` route.
pub fn build_server_with_shutdown(config: AppConfig) -> (ApiServer, ShutdownService) {
    let topics = TopicManager::new(ManagerConfig {
        default_ring_size: config.broker.default_ring_size,
        max_ring_size: config.broker.max_ring_size,
        subscriber_queue_size: config.broker.subscriber_queue_size,
        slow_consumer_threshold: config.broker.slow_consumer_threshold,
    });
    let shutdown = ShutdownService::new(topics.clone(), Duration::from_secs(config.broker.shutdown_timeout_sec));
    let server = ApiServer::new(config, topics, shutdown.clone());
    (server, shutdown)
}

/// Binds the router to an OS-assigned port and serves it on a background
/// task, returning the address a WebSocket/HTTP client can connect to.
pub async fn spawn_server(server: ApiServer) -> std::net::SocketAddr {
    let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.expect("bind ephemeral port");
    let addr = listener.local_addr().expect("local addr");
    let router = server.router();
    tokio::spawn(async move {
        axum::serve(listener, router).await.ok();
    });
    addr
}
