//! Configuration validation utilities.

use super::error::{ConfigError, ConfigResult};
use super::schema::{BotConfig, LogOutput};

/// Validates the entire configuration.
pub fn validate_config(config: &BotConfig) -> ConfigResult<()> {
    validate_token(config.token.as_deref())?;
    validate_extensions(&config.extensions)?;
    validate_logging(config)?;

    if config.console.queue_capacity == 0 {
        return Err(ConfigError::validation(
            "console.queue_capacity must be greater than 0",
        ));
    }

    Ok(())
}

fn validate_token(token: Option<&str>) -> ConfigResult<()> {
    match token {
        Some(t) if !t.trim().is_empty() => Ok(()),
        _ => Err(ConfigError::missing_field("token")),
    }
}

fn validate_extensions(extensions: &[String]) -> ConfigResult<()> {
    for descriptor in extensions {
        if descriptor.starts_with('?') {
            return Err(ConfigError::validation(format!(
                "Extension descriptor has no path: {descriptor}"
            )));
        }
    }
    Ok(())
}

fn validate_logging(config: &BotConfig) -> ConfigResult<()> {
    if config.logging.output == LogOutput::File && config.logging.file_path.is_none() {
        return Err(ConfigError::missing_field("logging.file_path"));
    }
    Ok(())
}
