//! Gelato relay adapter
//!
//! Submits through Gelato's HTTP relay API. With no custom forwarder
//! configured, submissions go through Gelato's own ERC-2771 endpoint,
//! which does not support concurrent requests for one sender. With a
//! custom forwarder, the transaction is wrapped as a signed meta-tx
//! targeting that forwarder and submitted as a plain sponsored call.

use crate::relayer::{Relayer, RelayerFactory};
use alloy::{
    primitives::{Address, Bytes, TxHash, U256},
    providers::{ProviderBuilder, ReqwestProvider},
    rpc::types::TransactionRequest,
    signers::Signer,
};
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use reqwest::StatusCode;
use serde::{de::DeserializeOwned, Deserialize, Serialize};
use std::{sync::Arc, time::Duration};
use tokio::time::timeout;
use types::{utils, ForwarderConfig, RelayError, RelayResponse, RelayStatus, Result};

const RELAYER_NAME: &str = "gelato";
const HTTP_TIMEOUT: Duration = Duration::from_secs(30);

/// Chains billed against the mainnets 1Balance pool.
///
/// Not the same as the supported-networks list: a chain missing here may
/// still be relayable, but balance queries treat it as a testnet.
const MAINNET_CHAIN_IDS: &[u64] = &[
    1,             // eth mainnet
    137,           // polygon
    1_313_161_554, // aurora
    10,            // optimism
    11_297_108_109, // palm
    42_161,        // arbitrum one
    42_220,        // celo
    43_114,        // avalanche c-chain
    50,            // xdc
    56,            // bsc
    25,            // cronos
    250,           // fantom
    100,           // gnosis
    1284,          // moonbeam
    1285,          // moonriver
];

/// 1Balance accounting group
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum NetworkGroup {
    Mainnets,
    Testnets,
}

impl NetworkGroup {
    fn for_chain(chain_id: u64) -> Self {
        if MAINNET_CHAIN_IDS.contains(&chain_id) {
            NetworkGroup::Mainnets
        } else {
            NetworkGroup::Testnets
        }
    }

    fn as_str(&self) -> &'static str {
        match self {
            NetworkGroup::Mainnets => "mainnets",
            NetworkGroup::Testnets => "testnets",
        }
    }
}

/// Gelato adapter configuration
#[derive(Debug, Clone)]
pub struct GelatoConfig {
    /// Sponsor API key
    pub api_key: String,
    /// Relay API base URL
    pub api_url: String,
    /// JSON-RPC endpoint for forwarder nonce reads
    pub rpc_url: String,
    /// Custom forwarder routing. Without one, Gelato's own forwarder is
    /// used and concurrent sends for one sender are rejected upstream.
    pub forwarder: Option<ForwarderConfig>,
}

/// Adapter for the Gelato relay API
pub struct GelatoRelayer<S> {
    chain_id: u64,
    signer: Arc<S>,
    provider: ReqwestProvider,
    http: reqwest::Client,
    api_url: String,
    api_key: String,
    forwarder: Option<ForwarderConfig>,
    network_group: NetworkGroup,
}

/// Factory producing [`GelatoRelayer`] instances for the registry
pub struct GelatoFactory {
    config: GelatoConfig,
}

impl GelatoFactory {
    /// Create a factory from adapter configuration
    pub fn with(config: GelatoConfig) -> Self {
        Self { config }
    }
}

#[async_trait]
impl<S> RelayerFactory<S> for GelatoFactory
where
    S: Signer + Send + Sync + 'static,
{
    async fn build(&self, chain_id: u64, signer: Arc<S>) -> Result<Arc<dyn Relayer>> {
        let relayer = GelatoRelayer::new(self.config.clone(), chain_id, signer)?;
        Ok(Arc::new(relayer))
    }
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
struct SponsoredCallRequest {
    chain_id: u64,
    target: Address,
    data: Bytes,
    sponsor_api_key: String,
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
struct SponsoredCallErc2771Request {
    chain_id: u64,
    target: Address,
    data: Bytes,
    user: Address,
    sponsor_api_key: String,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct RelayCallResponse {
    task_id: String,
}

/// Task lifecycle states reported by the Gelato status API
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum TaskState {
    CheckPending,
    ExecPending,
    WaitingForConfirmation,
    ExecSuccess,
    ExecReverted,
    Blacklisted,
    Cancelled,
    NotFound,
}

/// Provider-specific task status, surfaced through [`RelayStatus::detail`]
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct GelatoTaskStatus {
    pub task_id: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub chain_id: Option<u64>,
    pub task_state: TaskState,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub creation_date: Option<DateTime<Utc>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub execution_date: Option<DateTime<Utc>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub transaction_hash: Option<TxHash>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub last_check_message: Option<String>,
}

#[derive(Debug, Deserialize)]
struct TaskStatusResponse {
    task: GelatoTaskStatus,
}

#[derive(Debug, Deserialize)]
struct SupportedNetworksResponse {
    relays: Vec<String>,
}

impl<S> GelatoRelayer<S>
where
    S: Signer + Send + Sync + 'static,
{
    /// Create an adapter bound to a chain and signing capability
    pub fn new(config: GelatoConfig, chain_id: u64, signer: Arc<S>) -> Result<Self> {
        let rpc_url = config
            .rpc_url
            .parse()
            .map_err(|e| RelayError::Config(format!("invalid rpc_url: {e}")))?;
        let provider = ProviderBuilder::new().on_http(rpc_url);

        let http = reqwest::Client::builder()
            .timeout(HTTP_TIMEOUT)
            .user_agent("eth-relay/0.1.0")
            .build()
            .map_err(|e| RelayError::Config(format!("failed to create HTTP client: {e}")))?;

        Ok(Self {
            chain_id,
            signer,
            provider,
            http,
            api_url: config.api_url.trim_end_matches('/').to_string(),
            api_key: config.api_key,
            forwarder: config.forwarder,
            network_group: NetworkGroup::for_chain(chain_id),
        })
    }

    fn map_task_status(task: GelatoTaskStatus) -> RelayStatus {
        let status = match task.task_state {
            TaskState::ExecSuccess => RelayStatus::complete(task.transaction_hash),
            TaskState::ExecReverted
            | TaskState::Blacklisted
            | TaskState::Cancelled
            | TaskState::NotFound => RelayStatus::errored(task.transaction_hash),
            TaskState::CheckPending | TaskState::ExecPending | TaskState::WaitingForConfirmation => {
                RelayStatus::pending()
            }
        };

        match serde_json::to_value(&task) {
            Ok(detail) => status.with_detail(detail),
            Err(_) => status,
        }
    }

    async fn get_json<T: DeserializeOwned>(&self, path: &str) -> Result<Option<T>> {
        let url = format!("{}/{}", self.api_url, path);
        let response = timeout(HTTP_TIMEOUT, self.http.get(&url).send())
            .await
            .map_err(|_| RelayError::Timeout {
                relayer: RELAYER_NAME.to_string(),
            })?
            .map_err(|e| RelayError::Http {
                relayer: RELAYER_NAME.to_string(),
                status: e.status().map(|s| s.as_u16()).unwrap_or(0),
            })?;

        if response.status() == StatusCode::NOT_FOUND {
            return Ok(None);
        }

        if !response.status().is_success() {
            return Err(RelayError::Http {
                relayer: RELAYER_NAME.to_string(),
                status: response.status().as_u16(),
            });
        }

        let payload = response
            .json::<T>()
            .await
            .map_err(|e| RelayError::UnexpectedResponse {
                relayer: RELAYER_NAME.to_string(),
                message: e.to_string(),
            })?;
        Ok(Some(payload))
    }

    async fn post_relay_call<B: Serialize>(&self, path: &str, body: &B) -> Result<RelayResponse> {
        let url = format!("{}/{}", self.api_url, path);
        let response = timeout(HTTP_TIMEOUT, self.http.post(&url).json(body).send())
            .await
            .map_err(|_| RelayError::Timeout {
                relayer: RELAYER_NAME.to_string(),
            })?
            .map_err(|e| RelayError::Http {
                relayer: RELAYER_NAME.to_string(),
                status: e.status().map(|s| s.as_u16()).unwrap_or(0),
            })?;

        if !response.status().is_success() {
            let status = response.status().as_u16();
            let body_text = response.text().await.unwrap_or_default();
            let message = serde_json::from_str::<serde_json::Value>(&body_text)
                .ok()
                .and_then(|v| v.get("message").and_then(|m| m.as_str()).map(String::from));

            return Err(match message {
                Some(message) => RelayError::Rejected {
                    relayer: RELAYER_NAME.to_string(),
                    message,
                },
                None => RelayError::Http {
                    relayer: RELAYER_NAME.to_string(),
                    status,
                },
            });
        }

        let payload: RelayCallResponse =
            response
                .json()
                .await
                .map_err(|e| RelayError::UnexpectedResponse {
                    relayer: RELAYER_NAME.to_string(),
                    message: e.to_string(),
                })?;

        tracing::info!(
            relayer = RELAYER_NAME,
            task_id = %utils::sanitize_for_logging(&payload.task_id),
            "relay task created"
        );
        Ok(RelayResponse::new(payload.task_id))
    }
}

#[async_trait]
impl<S> Relayer for GelatoRelayer<S>
where
    S: Signer + Send + Sync + 'static,
{
    fn name(&self) -> &str {
        RELAYER_NAME
    }

    async fn send(&self, tx: &TransactionRequest) -> Result<RelayResponse> {
        let correlation_id = utils::generate_correlation_id();

        match &self.forwarder {
            // Gelato's own forwarder. Does not tolerate concurrent sends
            // for one sender.
            None => {
                let (target, data) = metatx::call_fields(tx)?;
                tracing::info!(
                    relayer = RELAYER_NAME,
                    correlation_id = %correlation_id,
                    chain_id = self.chain_id,
                    target = %target,
                    "submitting sponsored ERC-2771 call"
                );

                let request = SponsoredCallErc2771Request {
                    chain_id: self.chain_id,
                    target,
                    data,
                    user: self.signer.address(),
                    sponsor_api_key: self.api_key.clone(),
                };
                self.post_relay_call("relays/v2/sponsored-call-erc2771", &request)
                    .await
            }
            // Custom forwarder: wrap as a signed meta-tx and submit a
            // plain sponsored call targeting the forwarder.
            Some(forwarder) => {
                let meta_tx = metatx::create_forwarded_transaction(
                    tx,
                    forwarder,
                    self.signer.as_ref(),
                    self.provider.clone(),
                )
                .await?;
                let (target, data) = metatx::call_fields(&meta_tx)?;

                tracing::info!(
                    relayer = RELAYER_NAME,
                    correlation_id = %correlation_id,
                    chain_id = self.chain_id,
                    forwarder = %target,
                    "submitting sponsored call via custom forwarder"
                );

                let request = SponsoredCallRequest {
                    chain_id: self.chain_id,
                    target,
                    data,
                    sponsor_api_key: self.api_key.clone(),
                };
                self.post_relay_call("relays/v2/sponsored-call", &request)
                    .await
            }
        }
    }

    async fn lookup(&self, task_id: &str) -> Result<RelayStatus> {
        let path = format!("tasks/status/{task_id}");
        match self.get_json::<TaskStatusResponse>(&path).await? {
            // The provider has not indexed the task yet
            None => Ok(RelayStatus::pending()),
            Some(payload) => Ok(Self::map_task_status(payload.task)),
        }
    }

    async fn supports_chain(&self, chain_id: u64) -> Result<bool> {
        let payload = self
            .get_json::<SupportedNetworksResponse>("relays/v2/supported-networks")
            .await?
            .ok_or_else(|| RelayError::UnexpectedResponse {
                relayer: RELAYER_NAME.to_string(),
                message: "supported-networks endpoint not found".to_string(),
            })?;

        let chain_id = chain_id.to_string();
        Ok(payload.relays.iter().any(|chain| chain == &chain_id))
    }

    async fn get_balance(&self) -> Result<U256> {
        let path = format!(
            "1balance/networks/{}/sponsors/{}",
            self.network_group.as_str(),
            self.signer.address()
        );
        let payload = self
            .get_json::<serde_json::Value>(&path)
            .await?
            .ok_or_else(|| RelayError::UnexpectedResponse {
                relayer: RELAYER_NAME.to_string(),
                message: "no sponsor balance returned".to_string(),
            })?;

        // Nested and flat response shapes are both in the wild
        let balance = payload
            .get("sponsor")
            .and_then(|sponsor| sponsor.get("remainingBalance"))
            .or_else(|| payload.get("remainingBalance"))
            .and_then(|value| value.as_str())
            .and_then(|value| value.parse::<U256>().ok());

        balance.ok_or_else(|| RelayError::UnexpectedResponse {
            relayer: RELAYER_NAME.to_string(),
            message: format!("unparseable sponsor balance: {payload}"),
        })
    }

    async fn fund(&self, _amount: U256) -> Result<()> {
        // Deposits go through the 1Balance deposit contract, outside
        // this adapter.
        Err(RelayError::Unsupported {
            relayer: RELAYER_NAME.to_string(),
            operation: "fund",
        })
    }
}
