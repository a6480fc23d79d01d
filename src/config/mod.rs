//! Configuration management for deskbot
//!
//! Layered configuration loading:
//! 1. `default.toml` - base configuration
//! 2. `{environment}.toml` - environment-specific overrides
//! 3. `local.toml` - local overrides (not committed)
//! 4. `DESKBOT_*` environment variables (highest priority)
//!
//! Secrets (bot token, ERP credentials) are only ever read from the
//! environment, never from committed files.

pub mod environment;
pub mod error;
pub mod loader;
pub mod settings;

pub use environment::Environment;
pub use error::ConfigError;
pub use loader::ConfigLoader;
pub use settings::{
    DatabaseConfig, DutyConfig, ErpConfig, JobsConfig, LoggerSettings, Settings, TelegramConfig,
};
