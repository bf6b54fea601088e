//! Configuration for tbot servers.
//!
//! Configuration is layered with figment: built-in defaults, then values
//! merged in code, then `tbot.toml`, then `TBOT_*` environment variables.
//! See [`ConfigLoader`].

pub mod error;
pub mod loader;
pub mod schema;
pub mod validation;

pub use error::{ConfigError, ConfigResult};
pub use loader::{ConfigLoader, Profile, load_config, load_config_from_file};
pub use schema::{
    BotConfig, BotSection, DispatchConfig, LogFormat, LogLevel, LogOutput, LogRotation,
    LoggingConfig, SpanEventConfig,
};
pub use validation::validate_config;
