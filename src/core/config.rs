//! Typed configuration, resolved from CLI flags (with env fallback via
//! `clap`'s `env` feature) and the defaults in `constants`.
//!
//! The broker keeps no persisted state, so this is a one-shot CLI -> struct
//! resolution with no config-file overlay layered on top.

use anyhow::{Result, bail};

use super::cli::CliConfig;
use super::constants::{
    DEFAULT_HOST, DEFAULT_MAX_RING_BUFFER_SIZE, DEFAULT_PORT, DEFAULT_RING_BUFFER_SIZE,
    DEFAULT_SHUTDOWN_TIMEOUT_SEC, DEFAULT_SLOW_CONSUMER_THRESHOLD, DEFAULT_SUBSCRIBER_QUEUE_SIZE,
    DEV_API_KEY,
};

#[derive(Debug, Clone)]
pub struct ServerConfig {
    pub host: String,
    pub port: u16,
}

#[derive(Debug, Clone)]
pub struct AuthConfig {
    /// Pre-shared keys accepted via `X-API-Key` / `?api_key=`.
    /// Never empty: falls back to [`DEV_API_KEY`] with a startup warning.
    pub api_keys: Vec<String>,
}

impl AuthConfig {
    pub fn is_valid(&self, key: &str) -> bool {
        self.api_keys.iter().any(|k| k == key)
    }

    pub fn is_dev_placeholder(&self) -> bool {
        self.api_keys.len() == 1 && self.api_keys[0] == DEV_API_KEY
    }
}

#[derive(Debug, Clone)]
pub struct BrokerConfig {
    pub default_ring_size: u64,
    pub max_ring_size: u64,
    pub subscriber_queue_size: usize,
    pub slow_consumer_threshold: u32,
    pub shutdown_timeout_sec: u64,
}

#[derive(Debug, Clone)]
pub struct AppConfig {
    pub server: ServerConfig,
    pub auth: AuthConfig,
    pub broker: BrokerConfig,
}

impl AppConfig {
    pub fn load(cli: &CliConfig) -> Result<Self> {
        let server = ServerConfig {
            host: cli.host.clone().unwrap_or_else(|| DEFAULT_HOST.to_string()),
            port: cli.port.unwrap_or(DEFAULT_PORT),
        };

        let api_keys = match &cli.api_keys {
            Some(keys) if !keys.is_empty() => {
                keys.iter().map(|k| k.trim().to_string()).filter(|k| !k.is_empty()).collect()
            }
            _ => {
                tracing::warn!(
                    "no API keys configured; accepting the development placeholder key only. \
                     Set BROKER_API_KEYS (or --api-keys) before exposing this server."
                );
                vec![DEV_API_KEY.to_string()]
            }
        };
        let auth = AuthConfig { api_keys };

        let default_ring_size = cli.default_ring_size.unwrap_or(DEFAULT_RING_BUFFER_SIZE);
        let max_ring_size = cli.max_ring_size.unwrap_or(DEFAULT_MAX_RING_BUFFER_SIZE);
        if default_ring_size == 0 || default_ring_size > max_ring_size {
            bail!(
                "default_ring_size ({default_ring_size}) must be between 1 and max_ring_size ({max_ring_size})"
            );
        }
        let subscriber_queue_size = cli.subscriber_queue_size.unwrap_or(DEFAULT_SUBSCRIBER_QUEUE_SIZE);
        if subscriber_queue_size == 0 {
            bail!("subscriber_queue_size must be at least 1");
        }
        let slow_consumer_threshold =
            cli.slow_consumer_threshold.unwrap_or(DEFAULT_SLOW_CONSUMER_THRESHOLD);
        if slow_consumer_threshold == 0 {
            bail!("slow_consumer_threshold must be at least 1");
        }

        let broker = BrokerConfig {
            default_ring_size,
            max_ring_size,
            subscriber_queue_size,
            slow_consumer_threshold,
            shutdown_timeout_sec: cli.shutdown_timeout_sec.unwrap_or(DEFAULT_SHUTDOWN_TIMEOUT_SEC),
        };

        Ok(Self { server, auth, broker })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_apply_when_cli_is_empty() {
        let config = AppConfig::load(&CliConfig::default()).unwrap();
        assert_eq!(config.server.host, DEFAULT_HOST);
        assert_eq!(config.server.port, DEFAULT_PORT);
        assert_eq!(config.broker.default_ring_size, DEFAULT_RING_BUFFER_SIZE);
        assert_eq!(config.auth.api_keys, vec![DEV_API_KEY.to_string()]);
        assert!(config.auth.is_dev_placeholder());
    }

    #[test]
    fn cli_values_override_defaults() {
        let cli = CliConfig {
            host: Some("0.0.0.0".to_string()),
            port: Some(9000),
            api_keys: Some(vec!["key-a".to_string(), "key-b".to_string()]),
            default_ring_size: Some(10),
            max_ring_size: Some(100),
            subscriber_queue_size: Some(5),
            slow_consumer_threshold: Some(2),
            shutdown_timeout_sec: Some(5),
        };
        let config = AppConfig::load(&cli).unwrap();
        assert_eq!(config.server.host, "0.0.0.0");
        assert_eq!(config.server.port, 9000);
        assert!(config.auth.is_valid("key-a"));
        assert!(!config.auth.is_valid("nope"));
        assert!(!config.auth.is_dev_placeholder());
        assert_eq!(config.broker.default_ring_size, 10);
        assert_eq!(config.broker.max_ring_size, 100);
    }

    #[test]
    fn rejects_default_ring_size_above_max() {
        let cli = CliConfig {
            default_ring_size: Some(500),
            max_ring_size: Some(100),
            ..Default::default()
        };
        assert!(AppConfig::load(&cli).is_err());
    }
}
