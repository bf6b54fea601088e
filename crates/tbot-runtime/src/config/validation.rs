//! Configuration validation.

use super::error::{ConfigError, ConfigResult};
use super::schema::{BotConfig, BotSection, DispatchConfig, LogOutput, LoggingConfig};

/// Validates the entire configuration.
pub fn validate_config(config: &BotConfig) -> ConfigResult<()> {
    validate_bot_section(&config.bot)?;
    validate_dispatch_config(&config.dispatch)?;
    validate_logging_config(&config.logging)?;
    Ok(())
}

impl BotConfig {
    /// Checks the configuration, returning it unchanged if it is usable.
    pub fn validate(self) -> ConfigResult<Self> {
        validate_config(&self)?;
        Ok(self)
    }
}

fn validate_bot_section(bot: &BotSection) -> ConfigResult<()> {
    if let Some(username) = &bot.username {
        let name = username.trim().trim_start_matches('@');
        if name.is_empty() {
            return Err(ConfigError::validation("bot.username must not be empty"));
        }
        if name.contains('@') || name.chars().any(char::is_whitespace) {
            return Err(ConfigError::validation(format!(
                "bot.username '{username}' may not contain '@' or whitespace"
            )));
        }
    }

    if bot.help {
        let path = bot.help_path.trim();
        if path.is_empty() || path.chars().any(char::is_whitespace) {
            return Err(ConfigError::invalid_path("bot.help_path", &bot.help_path));
        }
    }

    Ok(())
}

fn validate_dispatch_config(dispatch: &DispatchConfig) -> ConfigResult<()> {
    if dispatch.max_concurrency == Some(0) {
        return Err(ConfigError::validation(
            "dispatch.max_concurrency must be greater than 0 (omit it for no limit)",
        ));
    }
    Ok(())
}

fn validate_logging_config(logging: &LoggingConfig) -> ConfigResult<()> {
    if logging.output == LogOutput::File && logging.file_path.is_none() {
        return Err(ConfigError::validation(
            "logging.file_path is required when logging.output = \"file\"",
        ));
    }

    for module in logging.filters.keys() {
        if module.is_empty() || module.contains(['=', ',', ' ']) {
            return Err(ConfigError::validation(format!(
                "Invalid logging filter target: '{module}'"
            )));
        }
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_config_is_valid() {
        assert!(validate_config(&BotConfig::default()).is_ok());
    }

    #[test]
    fn test_zero_concurrency_rejected() {
        let mut config = BotConfig::default();
        config.dispatch.max_concurrency = Some(0);
        assert!(matches!(
            config.validate(),
            Err(ConfigError::ValidationError { .. })
        ));
    }

    #[test]
    fn test_help_path_checked_only_when_enabled() {
        let mut config = BotConfig::default();
        config.bot.help_path = "/he lp".into();
        assert!(matches!(
            validate_config(&config),
            Err(ConfigError::InvalidPath { .. })
        ));

        config.bot.help = false;
        assert!(validate_config(&config).is_ok());
    }

    #[test]
    fn test_username() {
        let mut config = BotConfig::default();
        config.bot.username = Some("@my_bot".into());
        assert!(validate_config(&config).is_ok());

        config.bot.username = Some("my bot".into());
        assert!(validate_config(&config).is_err());

        config.bot.username = Some("@".into());
        assert!(validate_config(&config).is_err());
    }

    #[test]
    fn test_file_output_needs_path() {
        let mut config = BotConfig::default();
        config.logging.output = LogOutput::File;
        assert!(validate_config(&config).is_err());

        config.logging.file_path = Some("logs/tbot.log".into());
        assert!(validate_config(&config).is_ok());
    }
}
