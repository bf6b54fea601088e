//! Configuration schema definitions.

use std::collections::HashMap;
use std::path::PathBuf;
use std::time::Duration;

use serde::{Deserialize, Serialize};

/// Root configuration structure.
///
/// ```toml
/// [bot]
/// username = "my_bot"
/// help = true
/// help_path = "/help"
///
/// [dispatch]
/// max_concurrency = 64
/// drain_timeout_ms = 5000
///
/// [logging]
/// level = "debug"
/// format = "pretty"
///
/// [logging.filters]
/// tbot_framework = "trace"
/// ```
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, Default)]
pub struct BotConfig {
    /// Bot identity and built-in routes.
    #[serde(default)]
    pub bot: BotSection,

    /// Dispatcher settings.
    #[serde(default)]
    pub dispatch: DispatchConfig,

    /// Logging settings.
    #[serde(default)]
    pub logging: LoggingConfig,
}

/// Bot identity and built-in routes.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BotSection {
    /// The bot's username, so `/cmd@username` is routed like `/cmd`.
    #[serde(default)]
    pub username: Option<String>,

    /// Register a route listing all route descriptions.
    #[serde(default = "default_help")]
    pub help: bool,

    /// Path of the help route.
    #[serde(default = "default_help_path")]
    pub help_path: String,
}

impl Default for BotSection {
    fn default() -> Self {
        Self {
            username: None,
            help: default_help(),
            help_path: default_help_path(),
        }
    }
}

fn default_help() -> bool {
    true
}

fn default_help_path() -> String {
    "/help".to_string()
}

/// Dispatcher settings.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DispatchConfig {
    /// Maximum number of handlers running at once. Unbounded when unset.
    #[serde(default)]
    pub max_concurrency: Option<usize>,

    /// How long shutdown waits for in-flight handlers, in milliseconds.
    /// `0` waits without limit.
    #[serde(default = "default_drain_timeout_ms")]
    pub drain_timeout_ms: u64,
}

impl Default for DispatchConfig {
    fn default() -> Self {
        Self {
            max_concurrency: None,
            drain_timeout_ms: default_drain_timeout_ms(),
        }
    }
}

impl DispatchConfig {
    /// The drain timeout, `None` meaning no limit.
    pub fn drain_timeout(&self) -> Option<Duration> {
        (self.drain_timeout_ms > 0).then(|| Duration::from_millis(self.drain_timeout_ms))
    }
}

fn default_drain_timeout_ms() -> u64 {
    5000
}

// =============================================================================
// Logging
// =============================================================================

/// Log verbosity.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum LogLevel {
    Trace,
    Debug,
    #[default]
    Info,
    Warn,
    Error,
}

impl LogLevel {
    /// Returns the level name as used in filter directives.
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Trace => "trace",
            Self::Debug => "debug",
            Self::Info => "info",
            Self::Warn => "warn",
            Self::Error => "error",
        }
    }

    /// Converts to a `tracing` level.
    pub fn to_tracing_level(self) -> tracing::Level {
        match self {
            Self::Trace => tracing::Level::TRACE,
            Self::Debug => tracing::Level::DEBUG,
            Self::Info => tracing::Level::INFO,
            Self::Warn => tracing::Level::WARN,
            Self::Error => tracing::Level::ERROR,
        }
    }
}

impl std::fmt::Display for LogLevel {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Log line format.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum LogFormat {
    #[default]
    Compact,
    Full,
    Pretty,
    #[cfg(feature = "json-log")]
    Json,
}

/// Where log lines go.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum LogOutput {
    #[default]
    Stdout,
    Stderr,
    /// Requires [`LoggingConfig::file_path`].
    File,
}

/// How the log file rotates.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum LogRotation {
    #[default]
    Never,
    Hourly,
    Daily,
}

/// Which span lifecycle events are logged.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct SpanEventConfig {
    #[serde(default)]
    pub new: bool,
    #[serde(default)]
    pub enter: bool,
    #[serde(default)]
    pub exit: bool,
    #[serde(default)]
    pub close: bool,
}

/// Logging settings.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, Default)]
pub struct LoggingConfig {
    /// Base level. `RUST_LOG`, when set, takes precedence.
    #[serde(default)]
    pub level: LogLevel,

    #[serde(default)]
    pub format: LogFormat,

    #[serde(default)]
    pub output: LogOutput,

    /// Log file for [`LogOutput::File`].
    #[serde(default)]
    pub file_path: Option<PathBuf>,

    #[serde(default)]
    pub rotation: LogRotation,

    #[serde(default)]
    pub span_events: SpanEventConfig,

    /// Include thread ids.
    #[serde(default)]
    pub thread_ids: bool,

    /// Include source file and line.
    #[serde(default)]
    pub file_location: bool,

    /// Per-module levels, e.g. `tbot_framework = "trace"`.
    #[serde(default)]
    pub filters: HashMap<String, LogLevel>,
}
