//! Relay task and status types

use alloy::primitives::TxHash;
use serde::{Deserialize, Serialize};

/// Handle returned by a relay provider for a submitted transaction.
///
/// The task identifier is opaque and only meaningful to the adapter
/// that produced it.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RelayResponse {
    /// Provider-assigned task identifier
    pub task_id: String,
}

/// Status of a relayed transaction as reported by a provider.
///
/// At most one of `is_complete`/`is_error` is true. Both false means the
/// task is still pending, including the window right after submission
/// where the provider has not indexed the task yet.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RelayStatus {
    /// The underlying transaction was mined successfully
    pub is_complete: bool,
    /// The task reached a terminal failure (reverted, cancelled, ...)
    pub is_error: bool,
    /// Hash of the mined transaction, when known
    pub transaction_hash: Option<TxHash>,
    /// Provider-specific status payload, for callers that want more
    /// than the uniform fields
    #[serde(skip_serializing_if = "Option::is_none")]
    pub detail: Option<serde_json::Value>,
}

impl RelayStatus {
    /// A task that has not reached a terminal state
    pub fn pending() -> Self {
        Self {
            is_complete: false,
            is_error: false,
            transaction_hash: None,
            detail: None,
        }
    }

    /// A task whose transaction was mined successfully
    pub fn complete(transaction_hash: Option<TxHash>) -> Self {
        Self {
            is_complete: true,
            is_error: false,
            transaction_hash,
            detail: None,
        }
    }

    /// A task that terminally failed
    pub fn errored(transaction_hash: Option<TxHash>) -> Self {
        Self {
            is_complete: false,
            is_error: true,
            transaction_hash,
            detail: None,
        }
    }

    /// Attach the provider's raw status payload
    pub fn with_detail(mut self, detail: serde_json::Value) -> Self {
        self.detail = Some(detail);
        self
    }

    /// Whether polling can stop
    pub fn is_terminal(&self) -> bool {
        self.is_complete || self.is_error
    }
}

impl RelayResponse {
    /// Create a response from a provider task identifier
    pub fn new(task_id: impl Into<String>) -> Self {
        Self {
            task_id: task_id.into(),
        }
    }
}
