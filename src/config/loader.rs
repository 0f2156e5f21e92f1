use super::types::*;
use std::fs;
use std::path::Path;

#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("Failed to read config file: {0}")]
    ReadError(#[from] std::io::Error),

    #[error("Failed to parse config file: {0}")]
    ParseError(#[from] toml::de::Error),

    #[error("Validation error: {0}")]
    ValidationError(String),
}

pub type Result<T> = std::result::Result<T, ConfigError>;

/// Load and validate configuration from a TOML file
pub fn load_config<P: AsRef<Path>>(path: P) -> Result<Config> {
    let contents = fs::read_to_string(path)?;
    let config: Config = toml::from_str(&contents)?;
    validate_config(&config)?;
    Ok(config)
}

/// Validate the configuration
pub fn validate_config(config: &Config) -> Result<()> {
    if config.backup.retention_days == 0 {
        return Err(ConfigError::ValidationError(
            "retention_days must be at least 1".to_string(),
        ));
    }

    if config.server.query_timeout_seconds == 0 {
        return Err(ConfigError::ValidationError(
            "query_timeout_seconds must be at least 1".to_string(),
        ));
    }

    for tool in config.server.required_tools() {
        if tool.is_empty() {
            return Err(ConfigError::ValidationError(
                "tool paths must not be empty".to_string(),
            ));
        }
    }

    if let Some(ref defaults_file) = config.server.defaults_file {
        if !defaults_file.exists() {
            return Err(ConfigError::ValidationError(format!(
                "defaults_file does not exist: {:?}",
                defaults_file
            )));
        }
    }

    if config.logging.log_file.file_name().is_none() {
        return Err(ConfigError::ValidationError(format!(
            "log_file has no file name: {:?}",
            config.logging.log_file
        )));
    }

    Ok(())
}
