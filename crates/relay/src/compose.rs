//! Config-driven registry assembly

use crate::{
    gelato::{GelatoConfig, GelatoFactory},
    itx::{ItxConfig, ItxFactory, ItxOptions, Schedule},
    registry::RelayerRegistry,
    relayer::RelayerFactory,
};
use alloy::{primitives::U256, signers::Signer};
use config::Config;
use types::{ConfigError, Result};

/// Build a registry from the configured provider sections.
///
/// Factories are probed in a fixed order: Gelato first, then ITX.
/// Sections that are absent from the configuration simply contribute no
/// factory.
pub fn registry_from_config<S>(config: &Config) -> Result<RelayerRegistry<S>>
where
    S: Signer + Send + Sync + 'static,
{
    let forwarder = config.forwarder_config()?;
    let mut factories: Vec<Box<dyn RelayerFactory<S>>> = Vec::new();

    if let Some(ref gelato) = config.gelato {
        let forwarder = if gelato.use_custom_forwarder {
            Some(forwarder.clone().ok_or_else(|| ConfigError::MissingField {
                field: "forwarder".to_string(),
            })?)
        } else {
            None
        };

        factories.push(Box::new(GelatoFactory::with(GelatoConfig {
            api_key: gelato.api_key.clone(),
            api_url: gelato.api_url.clone(),
            rpc_url: config.network.rpc_url.clone(),
            forwarder,
        })));
    }

    if let Some(ref itx) = config.itx {
        let forwarder = forwarder.ok_or_else(|| ConfigError::MissingField {
            field: "forwarder".to_string(),
        })?;

        let gas = itx
            .gas
            .parse::<U256>()
            .map_err(|_| ConfigError::InvalidValue {
                field: "itx.gas".to_string(),
                value: itx.gas.clone(),
            })?;

        let schedule = match itx.schedule.as_str() {
            "fast" => Schedule::Fast,
            "slow" => Schedule::Slow,
            other => {
                return Err(ConfigError::InvalidValue {
                    field: "itx.schedule".to_string(),
                    value: other.to_string(),
                }
                .into())
            }
        };

        factories.push(Box::new(ItxFactory::with(ItxConfig {
            rpc_url: config.network.rpc_url.clone(),
            forwarder,
            options: ItxOptions { gas, schedule },
        })));
    }

    tracing::info!(factories = factories.len(), "assembled relayer registry");
    Ok(RelayerRegistry::new(factories))
}
