//! Forwarder contract configuration

use alloy::primitives::Address;
use serde::{Deserialize, Serialize};

/// The static part of an EIP-712 domain.
///
/// `chain_id` and `verifying_contract` are deliberately absent: they are
/// computed at request time from the active network and the forwarder
/// address. `name` and `version` must match the values the forwarder
/// contract was deployed with, or signature verification fails on-chain.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DomainFragment {
    pub name: String,
    pub version: String,
}

/// Identifies the on-chain forwarder contract a meta-transaction targets
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ForwarderConfig {
    /// Deployed forwarder contract address
    pub address: Address,
    /// Static EIP-712 domain fields of the deployed contract
    pub domain: DomainFragment,
}

impl ForwarderConfig {
    /// Create a forwarder config from an address and domain fields
    pub fn new(address: Address, name: impl Into<String>, version: impl Into<String>) -> Self {
        Self {
            address,
            domain: DomainFragment {
                name: name.into(),
                version: version.into(),
            },
        }
    }
}
