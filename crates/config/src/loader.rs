//! Configuration loader implementation

use crate::schema::Config;
use anyhow::{Context, Result};
use figment::{
    providers::{Env, Format, Yaml},
    Figment,
};
use std::path::Path;
use types::{ConfigError, RelayError};

/// Configuration loader that handles YAML files and environment variables
pub struct ConfigLoader;

impl ConfigLoader {
    /// Load configuration from file and environment variables
    pub fn load<P: AsRef<Path>>(config_path: P) -> Result<Config> {
        let config_path = config_path.as_ref();

        if !config_path.exists() {
            return Err(RelayError::Config(format!(
                "Configuration file not found: {}",
                config_path.display()
            ))
            .into());
        }

        // Load configuration using Figment
        let config: Config = Figment::new()
            // Start with YAML file
            .merge(Yaml::file(config_path))
            // Override with environment variables (prefixed with ETH_RELAY_)
            .merge(Env::prefixed("ETH_RELAY_").split("_"))
            // Also support unprefixed environment variables for common settings
            .merge(Env::raw().only(&["RUST_LOG"]))
            .extract()
            .context("Failed to parse configuration")?;

        Self::validate(&config)?;

        Ok(config)
    }

    /// Load configuration from string (for testing)
    pub fn load_from_str(yaml_content: &str) -> Result<Config> {
        let config: Config = Figment::new()
            .merge(Yaml::string(yaml_content))
            .extract()
            .context("Failed to parse configuration from string")?;

        Self::validate(&config)?;
        Ok(config)
    }

    /// Validate configuration
    fn validate(config: &Config) -> Result<()> {
        // Validate network
        if config.network.rpc_url.is_empty() {
            return Err(ConfigError::MissingField {
                field: "network.rpc_url".to_string(),
            }
            .into());
        }

        let valid_schemes = ["http://", "https://", "ws://", "wss://"];
        if !valid_schemes
            .iter()
            .any(|scheme| config.network.rpc_url.starts_with(scheme))
        {
            return Err(ConfigError::ValidationError {
                field: "network.rpc_url".to_string(),
                message: "RPC URL must start with http://, https://, ws://, or wss://".to_string(),
            }
            .into());
        }

        // Validate forwarder configuration
        if let Some(ref forwarder) = config.forwarder {
            if !types::utils::is_valid_address(&forwarder.address) {
                return Err(ConfigError::ValidationError {
                    field: "forwarder.address".to_string(),
                    message: format!("Invalid forwarder address: {}", forwarder.address),
                }
                .into());
            }

            if forwarder.name.is_empty() || forwarder.version.is_empty() {
                return Err(ConfigError::ValidationError {
                    field: "forwarder".to_string(),
                    message: "Forwarder domain name and version cannot be empty".to_string(),
                }
                .into());
            }
        }

        // Validate Gelato configuration
        if let Some(ref gelato) = config.gelato {
            if gelato.api_key.is_empty() {
                return Err(ConfigError::MissingField {
                    field: "gelato.api_key".to_string(),
                }
                .into());
            }

            if !gelato.api_url.starts_with("http://") && !gelato.api_url.starts_with("https://") {
                return Err(ConfigError::ValidationError {
                    field: "gelato.api_url".to_string(),
                    message: format!("Invalid API URL: {}", gelato.api_url),
                }
                .into());
            }

            if gelato.use_custom_forwarder && config.forwarder.is_none() {
                return Err(ConfigError::ValidationError {
                    field: "gelato.use_custom_forwarder".to_string(),
                    message: "A forwarder section is required to use a custom forwarder"
                        .to_string(),
                }
                .into());
            }
        }

        // Validate ITX configuration
        if let Some(ref itx) = config.itx {
            if config.forwarder.is_none() {
                return Err(ConfigError::ValidationError {
                    field: "itx".to_string(),
                    message: "ITX always routes through a custom forwarder; a forwarder section is required"
                        .to_string(),
                }
                .into());
            }

            match itx.gas.parse::<u64>() {
                Ok(0) | Err(_) => {
                    return Err(ConfigError::InvalidValue {
                        field: "itx.gas".to_string(),
                        value: itx.gas.clone(),
                    }
                    .into());
                }
                Ok(_) => {}
            }

            let valid_schedules = ["fast", "slow"];
            if !valid_schedules.contains(&itx.schedule.as_str()) {
                return Err(ConfigError::ValidationError {
                    field: "itx.schedule".to_string(),
                    message: format!(
                        "Invalid schedule: {}. Valid schedules: {:?}",
                        itx.schedule, valid_schedules
                    ),
                }
                .into());
            }
        }

        // Validate polling configuration
        if config.poll.period_ms == 0 {
            return Err(ConfigError::ValidationError {
                field: "poll.period_ms".to_string(),
                message: "Poll period cannot be 0".to_string(),
            }
            .into());
        }

        if config.poll.stop_after_ms < config.poll.period_ms {
            return Err(ConfigError::ValidationError {
                field: "poll.stop_after_ms".to_string(),
                message: "Poll deadline cannot be shorter than the poll period".to_string(),
            }
            .into());
        }

        // Validate logging configuration
        let valid_log_levels = ["trace", "debug", "info", "warn", "error"];
        if !valid_log_levels.contains(&config.logging.level.as_str()) {
            return Err(ConfigError::ValidationError {
                field: "logging.level".to_string(),
                message: format!(
                    "Invalid log level: {}. Valid levels: {:?}",
                    config.logging.level, valid_log_levels
                ),
            }
            .into());
        }

        let valid_log_formats = ["json", "pretty"];
        if !valid_log_formats.contains(&config.logging.format.as_str()) {
            return Err(ConfigError::ValidationError {
                field: "logging.format".to_string(),
                message: format!(
                    "Invalid log format: {}. Valid formats: {:?}",
                    config.logging.format, valid_log_formats
                ),
            }
            .into());
        }

        Ok(())
    }

    /// Get default configuration
    pub fn default() -> Config {
        Config::default()
    }

    /// Create example configuration file
    pub fn create_example<P: AsRef<Path>>(path: P) -> Result<()> {
        let config = Self::default();
        let yaml_content =
            serde_yaml::to_string(&config).context("Failed to serialize default configuration")?;

        std::fs::write(path.as_ref(), yaml_content)
            .context("Failed to write example configuration file")?;

        Ok(())
    }
}
