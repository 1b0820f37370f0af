//! Centralized shutdown management

use std::sync::Arc;
use std::time::Duration;

use tokio::sync::watch;

use crate::broker::TopicManager;

/// Coordinates process-level graceful shutdown with the broker's own
/// RUNNING/DRAINING/CLOSED state machine: OS signals and `POST /shutdown`
/// both call [`ShutdownService::shutdown`], which drains the
/// [`TopicManager`] and then releases axum's `with_graceful_shutdown`
/// future.
#[derive(Clone)]
pub struct ShutdownService {
    tx: Arc<watch::Sender<bool>>,
    rx: watch::Receiver<bool>,
    manager: Arc<TopicManager>,
    drain_timeout: Duration,
}

impl ShutdownService {
    pub fn new(manager: Arc<TopicManager>, drain_timeout: Duration) -> Self {
        let (tx, rx) = watch::channel(false);
        Self {
            tx: Arc::new(tx),
            rx,
            manager,
            drain_timeout,
        }
    }

    /// Subscribe to the shutdown signal.
    pub fn subscribe(&self) -> watch::Receiver<bool> {
        self.rx.clone()
    }

    /// Trigger the process-level shutdown signal without waiting for drain.
    pub fn trigger(&self) {
        let _ = self.tx.send(true);
    }

    /// Check whether shutdown has been triggered.
    pub fn is_triggered(&self) -> bool {
        *self.rx.borrow()
    }

    /// Drain the broker and release the process shutdown signal.
    /// Idempotent — a second call observes `TopicManager` already CLOSED
    /// and returns immediately after re-arming the watch channel.
    pub async fn shutdown(&self) {
        tracing::info!("initiating graceful shutdown");
        self.manager.shutdown(self.drain_timeout).await;
        self.trigger();
        tracing::info!("shutdown complete");
    }

    /// Owned future for `axum::serve(..).with_graceful_shutdown(..)`.
    pub fn wait(&self) -> impl std::future::Future<Output = ()> + Send + 'static {
        let mut rx = self.rx.clone();
        async move {
            let _ = rx.wait_for(|&v| v).await;
        }
    }

    /// Install OS signal handlers; Ctrl+C/SIGTERM triggers the full drain
    /// and shutdown sequence, not just the watch channel.
    pub fn install_signal_handlers(&self) {
        let service = self.clone();
        tokio::spawn(async move {
            let ctrl_c = async {
                tokio::signal::ctrl_c().await.expect("failed to install Ctrl+C handler");
            };

            #[cfg(unix)]
            let terminate = async {
                tokio::signal::unix::signal(tokio::signal::unix::SignalKind::terminate())
                    .expect("failed to install SIGTERM handler")
                    .recv()
                    .await;
            };

            #[cfg(not(unix))]
            let terminate = std::future::pending::<()>();

            tokio::select! {
                _ = ctrl_c => tracing::info!("received Ctrl+C, shutting down"),
                _ = terminate => tracing::info!("received SIGTERM, shutting down"),
            }

            service.shutdown().await;
        });
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::broker::ManagerConfig;

    fn make_shutdown() -> ShutdownService {
        let manager = TopicManager::new(ManagerConfig {
            default_ring_size: 100,
            max_ring_size: 10_000,
            subscriber_queue_size: 50,
            slow_consumer_threshold: 3,
        });
        ShutdownService::new(manager, Duration::from_millis(50))
    }

    #[tokio::test]
    async fn not_triggered_initially() {
        let shutdown = make_shutdown();
        assert!(!shutdown.is_triggered());
    }

    #[tokio::test]
    async fn trigger_sets_the_flag() {
        let shutdown = make_shutdown();
        shutdown.trigger();
        assert!(shutdown.is_triggered());
    }

    #[tokio::test]
    async fn wait_returns_after_trigger() {
        let shutdown = make_shutdown();
        let wait_future = shutdown.wait();
        let handle = tokio::spawn(wait_future);

        tokio::task::yield_now().await;
        shutdown.trigger();

        tokio::time::timeout(Duration::from_millis(200), handle)
            .await
            .unwrap()
            .unwrap();
    }

    #[tokio::test]
    async fn shutdown_drains_manager_and_triggers() {
        let shutdown = make_shutdown();
        shutdown.shutdown().await;
        assert!(shutdown.is_triggered());
        assert!(shutdown.manager.health().shutdown_initiated);
    }
}
