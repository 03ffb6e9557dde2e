//! Configuration management for the Eth Relay system
//!
//! This crate handles parsing, validation, and management of configuration
//! from YAML files and environment variables, plus tracing initialization.

pub mod loader;
pub mod logging;
pub mod schema;

pub use loader::ConfigLoader;
pub use logging::init_logging;
pub use schema::*;
