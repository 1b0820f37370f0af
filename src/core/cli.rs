//! Command-line flags, env-fallback via `clap`'s `env` feature.

use clap::Parser;

use super::constants::{
    ENV_API_KEYS, ENV_DEFAULT_RING_SIZE, ENV_HOST, ENV_MAX_RING_SIZE, ENV_PORT,
    ENV_SHUTDOWN_TIMEOUT_SEC, ENV_SLOW_CONSUMER_THRESHOLD, ENV_SUBSCRIBER_QUEUE_SIZE,
};

/// Every field is optional here; `config::AppConfig::load` applies defaults
/// for whatever neither the flag nor its env var supplied. There is no
/// persisted/file config layer — the broker keeps no state across restarts
/// to justify one.
#[derive(Parser, Debug, Default)]
#[command(name = "broker-rs")]
#[command(version, about = "In-memory pub/sub broker", long_about = None)]
pub struct CliConfig {
    /// Bind address
    #[arg(long, short = 'H', env = ENV_HOST)]
    pub host: Option<String>,

    /// Bind port
    #[arg(long, short = 'p', env = ENV_PORT)]
    pub port: Option<u16>,

    /// Comma-separated list of accepted `X-API-Key` values
    #[arg(long, env = ENV_API_KEYS, value_delimiter = ',')]
    pub api_keys: Option<Vec<String>>,

    /// Default per-topic history ring size
    #[arg(long, env = ENV_DEFAULT_RING_SIZE)]
    pub default_ring_size: Option<u64>,

    /// Upper bound accepted for a topic's `ring_size` override
    #[arg(long, env = ENV_MAX_RING_SIZE)]
    pub max_ring_size: Option<u64>,

    /// Per-subscriber bounded queue capacity
    #[arg(long, env = ENV_SUBSCRIBER_QUEUE_SIZE)]
    pub subscriber_queue_size: Option<usize>,

    /// Consecutive drops before a subscriber is ejected
    #[arg(long, env = ENV_SLOW_CONSUMER_THRESHOLD)]
    pub slow_consumer_threshold: Option<u32>,

    /// Wall-clock budget for `shutdown`'s drain phase, in seconds
    #[arg(long, env = ENV_SHUTDOWN_TIMEOUT_SEC)]
    pub shutdown_timeout_sec: Option<u64>,
}

pub fn parse() -> CliConfig {
    CliConfig::parse()
}
