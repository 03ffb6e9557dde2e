//! Meta-transaction construction and EIP-712 signing
//!
//! This crate builds EIP-2771 forward requests against a deployed
//! forwarder contract: it fetches the sender's forwarder nonce, signs the
//! request as EIP-712 typed data, and populates the forwarder `execute`
//! call so a third-party relayer can broadcast it.

pub mod abi;
pub mod builder;

pub use abi::Forwarder;
pub use builder::*;
