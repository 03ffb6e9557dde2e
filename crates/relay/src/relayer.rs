//! Relay adapter capability contract

use alloy::{primitives::U256, rpc::types::TransactionRequest, signers::Signer};
use async_trait::async_trait;
use std::sync::Arc;
use types::{RelayResponse, RelayStatus, Result};

/// Uniform contract implemented by every relay provider adapter.
///
/// Adapters differ in submission protocol (HTTP API, custom JSON-RPC,
/// managed relayer) but present identical semantics for `send` and
/// `lookup`. Adapters are safe to share across tasks: concurrent `send`
/// calls against the same adapter are supported, subject to the nonce
/// race described on [`Relayer::send`].
#[async_trait]
pub trait Relayer: Send + Sync {
    /// Adapter name used in logs and error messages
    fn name(&self) -> &str;

    /// Submit a prepared transaction to the provider's relay API.
    ///
    /// Fails fast with a precondition error, before any network call,
    /// when the transaction is missing a call target or calldata.
    ///
    /// Two sends racing for the same sender may capture the same
    /// forwarder nonce; exactly one lands on-chain and the other
    /// surfaces as a relay-level failure. A failed send must be
    /// resubmitted by the caller with a freshly fetched nonce; nothing
    /// here retries.
    async fn send(&self, tx: &TransactionRequest) -> Result<RelayResponse>;

    /// Single non-blocking status query for a task identifier.
    ///
    /// A provider that has not indexed the task yet reports a pending
    /// status, not an error.
    async fn lookup(&self, task_id: &str) -> Result<RelayStatus>;

    /// Whether this adapter can serve the given chain.
    ///
    /// A pure capability check: mutates nothing and is safe to call
    /// before any `send`.
    async fn supports_chain(&self, chain_id: u64) -> Result<bool>;

    /// Relay account balance in the provider's native accounting unit.
    ///
    /// May legitimately fail with [`types::RelayError::Unsupported`] for
    /// providers that do not expose balances.
    async fn get_balance(&self) -> Result<U256>;

    /// Deposit funds into the relay account.
    ///
    /// May likewise be unsupported per provider.
    async fn fund(&self, amount: U256) -> Result<()>;
}

/// Asynchronous adapter factory.
///
/// A factory rather than a constructor because some providers need
/// asynchronous initialization before becoming usable. Building must be
/// cheap and side-effect-free until `send` is actually invoked: the
/// registry materializes candidates that may be rejected right after.
#[async_trait]
pub trait RelayerFactory<S>: Send + Sync
where
    S: Signer + Send + Sync + 'static,
{
    /// Build an adapter bound to a chain and signing capability
    async fn build(&self, chain_id: u64, signer: Arc<S>) -> Result<Arc<dyn Relayer>>;
}
