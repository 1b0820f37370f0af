//! Process-level infrastructure: CLI, config, startup banner, shutdown.

pub(crate) mod banner;
pub mod cli;
pub mod config;
pub mod constants;
pub mod shutdown;

pub use cli::CliConfig;
pub use config::{AppConfig, AuthConfig, BrokerConfig, ServerConfig};
pub use shutdown::ShutdownService;
