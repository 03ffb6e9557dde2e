//! Error types for the Eth Relay system

use thiserror::Error;

/// Errors raised while building or signing a meta-transaction
#[derive(Error, Debug)]
pub enum MetaTxError {
    /// The transaction to be forwarded is missing a required field.
    /// Raised before any network call is made.
    #[error("transaction is missing required field `{field}`")]
    IncompleteTransaction { field: &'static str },

    /// A read call against the forwarder contract failed
    #[error("forwarder call failed: {0}")]
    Contract(#[from] alloy::contract::Error),

    /// The signing capability refused or failed to sign
    #[error("signing failed: {0}")]
    Signer(#[from] alloy::signers::Error),

    /// RPC transport failure while resolving chain state
    #[error("rpc transport error: {0}")]
    Transport(#[from] alloy::transports::TransportError),
}

/// Main error type for relay operations
#[derive(Error, Debug)]
pub enum RelayError {
    /// Meta-transaction construction or signing failed
    #[error(transparent)]
    MetaTx(#[from] MetaTxError),

    /// HTTP-level failure from a relay provider
    #[error("HTTP error from {relayer}: {status}")]
    Http { relayer: String, status: u16 },

    /// Connection timeout to a relay provider
    #[error("connection timeout to {relayer}")]
    Timeout { relayer: String },

    /// The provider accepted the request but reported a failure
    #[error("{relayer} rejected the request: {message}")]
    Rejected { relayer: String, message: String },

    /// The provider returned a payload this adapter cannot interpret
    #[error("unexpected response from {relayer}: {message}")]
    UnexpectedResponse { relayer: String, message: String },

    /// The operation is not implemented by this provider
    #[error("{operation} is not supported by {relayer}")]
    Unsupported { relayer: String, operation: &'static str },

    /// RPC transport failure while talking to a JSON-RPC relay endpoint
    #[error("rpc transport error: {0}")]
    Transport(#[from] alloy::transports::TransportError),

    /// Configuration related errors
    #[error("configuration error: {0}")]
    Config(String),
}

/// Result type alias for relay operations
pub type Result<T> = std::result::Result<T, RelayError>;

/// Configuration specific errors
#[derive(Error, Debug)]
pub enum ConfigError {
    /// Missing required field
    #[error("missing required configuration field: {field}")]
    MissingField { field: String },

    /// Validation error
    #[error("configuration validation error: {field}: {message}")]
    ValidationError { field: String, message: String },

    /// Invalid value
    #[error("invalid configuration value for {field}: {value}")]
    InvalidValue { field: String, value: String },

    /// Parse error
    #[error("configuration parse error: {0}")]
    ParseError(String),
}

impl From<ConfigError> for RelayError {
    fn from(err: ConfigError) -> Self {
        RelayError::Config(err.to_string())
    }
}
