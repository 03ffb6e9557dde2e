//! Configuration schema definitions

use alloy::primitives::Address;
use serde::{Deserialize, Serialize};
use std::time::Duration;
use types::{ConfigError, ForwarderConfig};

/// Main configuration structure
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Config {
    /// Ethereum network configuration
    pub network: NetworkConfig,
    /// Custom forwarder contract configuration
    #[serde(default)]
    pub forwarder: Option<ForwarderSection>,
    /// Gelato relay configuration
    #[serde(default)]
    pub gelato: Option<GelatoSection>,
    /// ITX relay configuration
    #[serde(default)]
    pub itx: Option<ItxSection>,
    /// Relay status polling configuration
    #[serde(default)]
    pub poll: PollConfig,
    /// Logging configuration
    #[serde(default)]
    pub logging: LoggingConfig,
}

/// Network configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct NetworkConfig {
    /// JSON-RPC endpoint used for forwarder reads and ITX relay calls
    pub rpc_url: String,
    /// Expected chain ID (optional, informational)
    pub chain_id: Option<u64>,
}

/// Custom forwarder contract section
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ForwarderSection {
    /// Deployed forwarder contract address
    pub address: String,
    /// EIP-712 domain name the forwarder was deployed with
    pub name: String,
    /// EIP-712 domain version the forwarder was deployed with
    pub version: String,
}

/// Gelato relay section
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct GelatoSection {
    /// Sponsor API key
    pub api_key: String,
    /// Gelato API base URL
    #[serde(default = "default_gelato_api_url")]
    pub api_url: String,
    /// Route submissions through the custom forwarder instead of
    /// Gelato's own ERC-2771 forwarder
    #[serde(default)]
    pub use_custom_forwarder: bool,
}

/// ITX relay section
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ItxSection {
    /// Gas limit for relayed transactions, in wei as a decimal string
    #[serde(default = "default_itx_gas")]
    pub gas: String,
    /// Relay schedule (fast, slow)
    #[serde(default = "default_itx_schedule")]
    pub schedule: String,
}

/// Relay status polling configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PollConfig {
    /// Interval between status lookups in milliseconds
    #[serde(default = "default_poll_period_ms")]
    pub period_ms: u64,
    /// Give up waiting after this many milliseconds
    #[serde(default = "default_stop_after_ms")]
    pub stop_after_ms: u64,
}

/// Logging configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LoggingConfig {
    /// Log level
    #[serde(default = "default_log_level")]
    pub level: String,
    /// Log format (json, pretty)
    #[serde(default = "default_log_format")]
    pub format: String,
}

// Default value functions

fn default_gelato_api_url() -> String {
    "https://api.gelato.digital".to_string()
}

fn default_itx_gas() -> String {
    "1000000".to_string()
}

fn default_itx_schedule() -> String {
    "slow".to_string()
}

fn default_poll_period_ms() -> u64 {
    5000
}

fn default_stop_after_ms() -> u64 {
    60_000
}

fn default_log_level() -> String {
    "info".to_string()
}

fn default_log_format() -> String {
    "json".to_string()
}

impl Config {
    /// Parse the forwarder section into a typed [`ForwarderConfig`]
    pub fn forwarder_config(&self) -> Result<Option<ForwarderConfig>, ConfigError> {
        let Some(ref section) = self.forwarder else {
            return Ok(None);
        };

        let address = section
            .address
            .parse::<Address>()
            .map_err(|_| ConfigError::InvalidValue {
                field: "forwarder.address".to_string(),
                value: section.address.clone(),
            })?;

        Ok(Some(ForwarderConfig::new(
            address,
            section.name.clone(),
            section.version.clone(),
        )))
    }
}

impl PollConfig {
    /// Interval between status lookups
    pub fn period(&self) -> Duration {
        Duration::from_millis(self.period_ms)
    }

    /// Deadline for the whole wait
    pub fn stop_after(&self) -> Duration {
        Duration::from_millis(self.stop_after_ms)
    }
}

impl Default for Config {
    fn default() -> Self {
        Self {
            network: NetworkConfig {
                rpc_url: "https://polygon-rpc.com".to_string(),
                chain_id: Some(137),
            },
            forwarder: Some(ForwarderSection {
                address: "0x0000000000000000000000000000000000000000".to_string(),
                name: "FlexibleNonceForwarder".to_string(),
                version: "0.0.1".to_string(),
            }),
            gelato: Some(GelatoSection {
                api_key: "changeme".to_string(),
                api_url: default_gelato_api_url(),
                use_custom_forwarder: true,
            }),
            itx: Some(ItxSection::default()),
            poll: PollConfig::default(),
            logging: LoggingConfig::default(),
        }
    }
}

impl Default for ItxSection {
    fn default() -> Self {
        Self {
            gas: default_itx_gas(),
            schedule: default_itx_schedule(),
        }
    }
}

impl Default for PollConfig {
    fn default() -> Self {
        Self {
            period_ms: default_poll_period_ms(),
            stop_after_ms: default_stop_after_ms(),
        }
    }
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: default_log_level(),
            format: default_log_format(),
        }
    }
}
