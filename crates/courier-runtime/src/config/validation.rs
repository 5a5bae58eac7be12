//! Configuration validation utilities.

use std::collections::HashSet;

use tracing_subscriber::EnvFilter;

use super::error::{ConfigError, ConfigResult};
use super::schema::{CourierConfig, DiConfig, LogOutput, LoggingConfig};

/// Validates the entire configuration.
pub fn validate_config(config: &CourierConfig) -> ConfigResult<()> {
    validate_logging_config(&config.logging)?;
    validate_di_config(&config.middleware.di)?;
    validate_extra_data(config)?;
    Ok(())
}

fn validate_logging_config(logging: &LoggingConfig) -> ConfigResult<()> {
    if logging.output == LogOutput::File && logging.file_path.is_none() {
        return Err(ConfigError::missing_field("logging.file_path"));
    }

    for (target, level) in &logging.filters {
        if target.is_empty() || target.contains(char::is_whitespace) {
            return Err(ConfigError::validation(format!(
                "Invalid log filter target: {target:?}"
            )));
        }
        let directive = format!("{target}={level}");
        EnvFilter::try_new(&directive).map_err(|e| {
            ConfigError::validation(format!("Invalid log filter {directive:?}: {e}"))
        })?;
    }

    Ok(())
}

fn validate_di_config(di: &DiConfig) -> ConfigResult<()> {
    let keys = [
        ("middleware.di.keys.scope", &di.keys.scope),
        ("middleware.di.keys.values", &di.keys.values),
        ("middleware.di.keys.container", &di.keys.container),
    ];

    let mut seen = HashSet::new();
    for (field, key) in keys {
        if key.is_empty() {
            return Err(ConfigError::missing_field(field));
        }
        if !seen.insert(key.as_str()) {
            return Err(ConfigError::validation(format!(
                "DI key {key:?} is used more than once"
            )));
        }
    }

    Ok(())
}

fn validate_extra_data(config: &CourierConfig) -> ConfigResult<()> {
    if config.extra_data.keys().any(String::is_empty) {
        return Err(ConfigError::validation("Extra data keys cannot be empty"));
    }
    Ok(())
}
