//! Names, defaults, and env var keys shared by `cli` and `config`.

pub const APP_NAME: &str = "broker-rs";
pub const APP_NAME_LOWER: &str = "broker_rs";

pub const ENV_LOG: &str = "BROKER_LOG";
pub const ENV_HOST: &str = "BROKER_HOST";
pub const ENV_PORT: &str = "BROKER_PORT";
pub const ENV_API_KEYS: &str = "BROKER_API_KEYS";
pub const ENV_DEFAULT_RING_SIZE: &str = "BROKER_DEFAULT_RING_SIZE";
pub const ENV_MAX_RING_SIZE: &str = "BROKER_MAX_RING_SIZE";
pub const ENV_SUBSCRIBER_QUEUE_SIZE: &str = "BROKER_SUBSCRIBER_QUEUE_SIZE";
pub const ENV_SLOW_CONSUMER_THRESHOLD: &str = "BROKER_SLOW_CONSUMER_THRESHOLD";
pub const ENV_SHUTDOWN_TIMEOUT_SEC: &str = "BROKER_SHUTDOWN_TIMEOUT_SEC";

pub const DEFAULT_HOST: &str = "127.0.0.1";
pub const DEFAULT_PORT: u16 = 8808;

/// Default per-topic history ring capacity.
pub const DEFAULT_RING_BUFFER_SIZE: u64 = 100;
/// Upper bound a topic's `ring_size` override may request.
pub const DEFAULT_MAX_RING_BUFFER_SIZE: u64 = 10_000;
/// Default per-subscriber bounded queue capacity.
pub const DEFAULT_SUBSCRIBER_QUEUE_SIZE: usize = 50;
/// Consecutive drops before a subscriber is ejected as a slow consumer.
pub const DEFAULT_SLOW_CONSUMER_THRESHOLD: u32 = 3;
/// Default wall-clock budget for the shutdown drain phase, in seconds.
pub const DEFAULT_SHUTDOWN_TIMEOUT_SEC: u64 = 30;

/// Accepted only when no `BROKER_API_KEYS` is configured.
/// Never rely on this outside of local development; set `BROKER_API_KEYS`
/// in any deployment that is reachable from outside localhost.
pub const DEV_API_KEY: &str = "dev-local-only-key";
