//! Shared types for the Eth Relay system
//!
//! This crate contains the domain types shared across the relaying
//! components: the relay task/status model, forwarder configuration,
//! and the error taxonomy.

pub mod error;
pub mod forwarder;
pub mod relay;
pub mod utils;

// Re-export commonly used types
pub use error::{ConfigError, MetaTxError, RelayError, Result};
pub use forwarder::{DomainFragment, ForwarderConfig};
pub use relay::{RelayResponse, RelayStatus};
