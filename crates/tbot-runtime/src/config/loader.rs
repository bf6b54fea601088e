//! Configuration loader using figment.
//!
//! # Configuration Priority (lowest to highest)
//!
//! 1. Built-in defaults
//! 2. Programmatic values passed to [`ConfigLoader::merge`]
//! 3. Profile-specific config file (`tbot.{profile}.toml`)
//! 4. Main config file (`tbot.toml` or `config.toml`)
//! 5. Environment variables (`TBOT_*`)
//!
//! # Environment Variable Mapping
//!
//! Variables use the `TBOT_` prefix with `__` between keys:
//!
//! - `TBOT_LOGGING__LEVEL=debug` → `logging.level = "debug"`
//! - `TBOT_DISPATCH__MAX_CONCURRENCY=32` → `dispatch.max_concurrency = 32`
//! - `TBOT_BOT__USERNAME=my_bot` → `bot.username = "my_bot"`
//!
//! The active profile comes from `TBOT_PROFILE` unless set explicitly.
//!
//! ```rust,ignore
//! let config = ConfigLoader::new()
//!     .file("./deploy/tbot.toml")
//!     .profile("production")
//!     .load()?;
//! ```

use std::path::{Path, PathBuf};

use figment::Figment;
#[cfg(feature = "toml-config")]
use figment::providers::{Format, Toml};
use figment::providers::{Env, Serialized};
use tracing::{debug, info, trace, warn};

use super::error::{ConfigError, ConfigResult};
use super::schema::BotConfig;
use super::validation::validate_config;

const ENV_PREFIX: &str = "TBOT_";
const PROFILE_VAR: &str = "TBOT_PROFILE";
const CONFIG_DIR_NAME: &str = "tbot";
#[cfg(feature = "toml-config")]
const TOML_NAMES: &[&str] = &["tbot.toml", "config.toml"];

/// Configuration profile for environment-specific settings.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub enum Profile {
    #[default]
    Development,
    Production,
    Custom(String),
}

impl Profile {
    pub fn as_str(&self) -> &str {
        match self {
            Self::Development => "development",
            Self::Production => "production",
            Self::Custom(name) => name,
        }
    }

    /// Parses a profile name, accepting the `dev` and `prod` short forms.
    pub fn parse(name: &str) -> Self {
        match name.to_lowercase().as_str() {
            "production" | "prod" => Self::Production,
            "development" | "dev" => Self::Development,
            other => Self::Custom(other.to_string()),
        }
    }

    /// Reads `TBOT_PROFILE`, defaulting to development.
    pub fn from_env() -> Self {
        std::env::var(PROFILE_VAR)
            .map(|p| Self::parse(&p))
            .unwrap_or_default()
    }
}

impl std::fmt::Display for Profile {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Layered configuration loader.
pub struct ConfigLoader {
    figment: Figment,
    profile: Profile,
    search_paths: Vec<PathBuf>,
    load_env: bool,
    /// Explicit file; disables the search when set.
    config_file: Option<PathBuf>,
}

impl Default for ConfigLoader {
    fn default() -> Self {
        Self::new()
    }
}

impl ConfigLoader {
    pub fn new() -> Self {
        Self {
            figment: Figment::new(),
            profile: Profile::from_env(),
            search_paths: Vec::new(),
            load_env: true,
            config_file: None,
        }
    }

    pub fn profile(mut self, profile: impl AsRef<str>) -> Self {
        self.profile = Profile::parse(profile.as_ref());
        self
    }

    /// Adds a directory to search for config files.
    ///
    /// When no search path is given, the current directory and the user
    /// config directory (`~/.config/tbot` on Linux) are searched.
    pub fn search_path<P: AsRef<Path>>(mut self, path: P) -> Self {
        self.search_paths.push(path.as_ref().to_path_buf());
        self
    }

    /// Loads exactly this file instead of searching.
    pub fn file<P: AsRef<Path>>(mut self, path: P) -> Self {
        self.config_file = Some(path.as_ref().to_path_buf());
        self
    }

    pub fn with_env(mut self) -> Self {
        self.load_env = true;
        self
    }

    pub fn without_env(mut self) -> Self {
        self.load_env = false;
        self
    }

    /// Merges configuration values set in code. Files and the environment
    /// still override them.
    pub fn merge(mut self, config: BotConfig) -> Self {
        self.figment = self.figment.merge(Serialized::defaults(config));
        self
    }

    /// Loads and validates the configuration.
    pub fn load(self) -> ConfigResult<BotConfig> {
        let profile = self.profile.clone();
        let figment = self.build_figment()?;

        let config: BotConfig = figment.extract()?;
        validate_config(&config)?;

        debug!(
            profile = %profile,
            logging_level = %config.logging.level,
            max_concurrency = ?config.dispatch.max_concurrency,
            "Configuration loaded"
        );

        Ok(config)
    }

    fn build_figment(mut self) -> ConfigResult<Figment> {
        let mut figment = Figment::from(Serialized::defaults(BotConfig::default()));
        figment = figment.merge(std::mem::take(&mut self.figment));

        if let Some(path) = &self.config_file {
            if !path.exists() {
                return Err(ConfigError::FileNotFound(path.clone()));
            }
            info!(path = %path.display(), "Loading configuration file");
            figment = Self::merge_config_file(figment, path)?;
        } else {
            figment = self.load_config_files(figment);
        }

        if self.load_env {
            trace!("Loading environment variables with {ENV_PREFIX} prefix");
            figment = figment.merge(Env::prefixed(ENV_PREFIX).ignore(&["profile"]).split("__"));
        }

        Ok(figment)
    }

    fn merge_config_file(figment: Figment, path: &Path) -> ConfigResult<Figment> {
        match path.extension().and_then(|e| e.to_str()) {
            #[cfg(feature = "toml-config")]
            Some("toml") => Ok(figment.merge(Toml::file(path))),
            _ => Err(ConfigError::UnsupportedFormat(path.to_path_buf())),
        }
    }

    fn resolve_search_paths(&self) -> Vec<PathBuf> {
        if !self.search_paths.is_empty() {
            return self.search_paths.clone();
        }
        let mut paths = Vec::new();
        if let Ok(cwd) = std::env::current_dir() {
            paths.push(cwd);
        }
        if let Some(config_dir) = dirs::config_dir() {
            paths.push(config_dir.join(CONFIG_DIR_NAME));
        }
        paths
    }

    /// Merges the first base file found, preceded by its profile variant.
    #[cfg(feature = "toml-config")]
    fn load_config_files(&self, mut figment: Figment) -> Figment {
        for dir in self.resolve_search_paths() {
            for name in TOML_NAMES {
                let Some((stem, ext)) = name.rsplit_once('.') else {
                    continue;
                };

                let profile_path = dir.join(format!("{stem}.{}.{ext}", self.profile));
                if profile_path.exists() {
                    debug!(path = %profile_path.display(), "Loading profile-specific config");
                    figment = figment.merge(Toml::file(&profile_path));
                }

                let base_path = dir.join(name);
                if base_path.exists() {
                    info!(path = %base_path.display(), "Loading configuration file");
                    return figment.merge(Toml::file(&base_path));
                }
            }
        }

        warn!("No configuration file found, using defaults");
        figment
    }

    #[cfg(not(feature = "toml-config"))]
    fn load_config_files(&self, figment: Figment) -> Figment {
        debug!(
            paths = self.resolve_search_paths().len(),
            "File configuration disabled, using defaults"
        );
        figment
    }
}

/// Loads configuration from the default locations and the environment.
pub fn load_config() -> ConfigResult<BotConfig> {
    ConfigLoader::new().load()
}

/// Loads configuration from one file plus the environment.
pub fn load_config_from_file(path: impl AsRef<Path>) -> ConfigResult<BotConfig> {
    ConfigLoader::new().file(path).load()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::LogLevel;

    fn write(dir: &Path, name: &str, contents: &str) -> PathBuf {
        let path = dir.join(name);
        std::fs::write(&path, contents).unwrap();
        path
    }

    #[test]
    fn test_default_config() {
        let dir = tempfile::tempdir().unwrap();
        let config = ConfigLoader::new()
            .search_path(dir.path())
            .without_env()
            .load()
            .unwrap();

        assert_eq!(config, BotConfig::default());
        assert_eq!(config.bot.help_path, "/help");
        assert_eq!(config.logging.level.as_str(), "info");
    }

    #[test]
    fn test_profile_parse() {
        assert_eq!(Profile::parse("prod"), Profile::Production);
        assert_eq!(Profile::parse("DEV"), Profile::Development);
        assert_eq!(
            Profile::parse("staging"),
            Profile::Custom("staging".into())
        );
    }

    #[cfg(feature = "toml-config")]
    #[test]
    fn test_file_overrides_merged_values() {
        let dir = tempfile::tempdir().unwrap();
        let path = write(
            dir.path(),
            "tbot.toml",
            r#"
                [bot]
                username = "my_bot"

                [dispatch]
                max_concurrency = 8

                [logging.filters]
                tbot_framework = "trace"
            "#,
        );

        let mut code = BotConfig::default();
        code.dispatch.max_concurrency = Some(2);
        code.dispatch.drain_timeout_ms = 250;

        let config = ConfigLoader::new()
            .merge(code)
            .file(&path)
            .without_env()
            .load()
            .unwrap();

        assert_eq!(config.bot.username.as_deref(), Some("my_bot"));
        assert_eq!(config.dispatch.max_concurrency, Some(8));
        assert_eq!(config.dispatch.drain_timeout_ms, 250);
        assert_eq!(
            config.logging.filters.get("tbot_framework"),
            Some(&LogLevel::Trace)
        );
    }

    #[cfg(feature = "toml-config")]
    #[test]
    fn test_profile_file_is_layered_under_base() {
        let dir = tempfile::tempdir().unwrap();
        write(
            dir.path(),
            "tbot.production.toml",
            "[dispatch]\nmax_concurrency = 64\ndrain_timeout_ms = 100\n",
        );
        write(dir.path(), "tbot.toml", "[dispatch]\ndrain_timeout_ms = 900\n");

        let config = ConfigLoader::new()
            .profile("prod")
            .search_path(dir.path())
            .without_env()
            .load()
            .unwrap();

        assert_eq!(config.dispatch.max_concurrency, Some(64));
        assert_eq!(config.dispatch.drain_timeout_ms, 900);
    }

    #[test]
    fn test_missing_file() {
        let err = ConfigLoader::new()
            .file("/nonexistent/tbot.toml")
            .without_env()
            .load()
            .unwrap_err();
        assert!(matches!(err, ConfigError::FileNotFound(_)));
    }

    #[test]
    fn test_unsupported_extension() {
        let dir = tempfile::tempdir().unwrap();
        let path = write(dir.path(), "tbot.ini", "level=debug");
        let err = ConfigLoader::new()
            .file(&path)
            .without_env()
            .load()
            .unwrap_err();
        assert!(matches!(err, ConfigError::UnsupportedFormat(_)));
    }

    #[cfg(feature = "toml-config")]
    #[test]
    fn test_invalid_values_are_rejected() {
        let dir = tempfile::tempdir().unwrap();
        let path = write(dir.path(), "tbot.toml", "[dispatch]\nmax_concurrency = 0\n");
        let err = ConfigLoader::new()
            .file(&path)
            .without_env()
            .load()
            .unwrap_err();
        assert!(matches!(err, ConfigError::ValidationError { .. }));
    }

    #[test]
    fn test_env_overrides() {
        let dir = tempfile::tempdir().unwrap();
        // SAFETY: no other test reads this variable
        unsafe {
            std::env::set_var("TBOT_BOT__HELP_PATH", "/commands");
        }
        let config = ConfigLoader::new()
            .search_path(dir.path())
            .with_env()
            .load();
        unsafe {
            std::env::remove_var("TBOT_BOT__HELP_PATH");
        }

        assert_eq!(config.unwrap().bot.help_path, "/commands");
    }
}
