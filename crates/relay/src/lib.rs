//! Relay provider adapters for gasless transaction submission
//!
//! This crate defines the uniform capability contract every relay-service
//! adapter satisfies (`Relayer`), a registry that resolves and caches the
//! first adapter supporting a chain, a bounded polling waiter, and the
//! Gelato (HTTP API) and ITX (custom JSON-RPC) adapters.

pub mod compose;
pub mod gelato;
pub mod itx;
pub mod registry;
pub mod relayer;
pub mod waiter;

pub use compose::registry_from_config;
pub use gelato::{GelatoConfig, GelatoFactory, GelatoRelayer};
pub use itx::{ItxConfig, ItxFactory, ItxOptions, ItxRelayer, Schedule};
pub use registry::RelayerRegistry;
pub use relayer::{Relayer, RelayerFactory};
pub use waiter::{wait_for_relay, PollOptions};
