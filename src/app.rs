//! Process entry point: parse CLI, build the broker, wire it to the
//! control API + WebSocket transport, install signal handlers, run.

use std::sync::Arc;
use std::time::Duration;

use anyhow::Result;

use crate::api::ApiServer;
use crate::broker::{ManagerConfig, TopicManager};
use crate::core::banner;
use crate::core::cli;
use crate::core::config::AppConfig;
use crate::core::constants::{APP_NAME_LOWER, ENV_LOG};
use crate::core::shutdown::ShutdownService;

/// Owns every long-lived value the process needs: the broker itself, its
/// shutdown coordinator, and the resolved config. Constructed once in
/// `run()` and handed to the transport/control-API layer — no process-wide
/// singleton.
pub struct CoreApp {
    pub config: AppConfig,
    pub topics: Arc<TopicManager>,
    pub shutdown: ShutdownService,
}

impl CoreApp {
    pub async fn run() -> Result<()> {
        dotenvy::dotenv().ok();
        Self::init_logging();

        let cli_config = cli::parse();
        let app = Self::init(&cli_config)?;
        Self::start_server(app).await
    }

    fn init(cli: &crate::core::CliConfig) -> Result<Self> {
        let config = AppConfig::load(cli)?;

        let topics = TopicManager::new(ManagerConfig {
            default_ring_size: config.broker.default_ring_size,
            max_ring_size: config.broker.max_ring_size,
            subscriber_queue_size: config.broker.subscriber_queue_size,
            slow_consumer_threshold: config.broker.slow_consumer_threshold,
        });
        let shutdown = ShutdownService::new(
            topics.clone(),
            Duration::from_secs(config.broker.shutdown_timeout_sec),
        );

        Ok(Self { config, topics, shutdown })
    }

    fn init_logging() {
        let default_filter = format!("info,{}=info", APP_NAME_LOWER);
        let filter = std::env::var(ENV_LOG)
            .or_else(|_| std::env::var("RUST_LOG"))
            .unwrap_or(default_filter);

        tracing_subscriber::fmt()
            .with_target(false)
            .with_thread_ids(false)
            .with_level(true)
            .compact()
            .with_env_filter(filter)
            .init();
    }

    async fn start_server(app: Self) -> Result<()> {
        app.shutdown.install_signal_handlers();

        banner::print_banner(
            &app.config.server.host,
            app.config.server.port,
            app.config.auth.api_keys.len(),
            app.config.auth.is_dev_placeholder(),
        );

        let server = ApiServer::new(app.config.clone(), app.topics.clone(), app.shutdown.clone());
        server.start().await?;
        // `start()` only returns once `ShutdownService::wait()` resolves, which
        // `ShutdownService::shutdown()` doesn't signal until it has already run
        // the drain to completion — the broker is already closed at this point.
        debug_assert!(app.shutdown.is_triggered());

        Ok(())
    }
}
