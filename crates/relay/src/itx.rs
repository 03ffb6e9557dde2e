//! ITX relay adapter
//!
//! Submits through Infura Transaction's custom JSON-RPC methods
//! (`relay_sendTransaction`, `relay_getTransactionStatus`,
//! `relay_getBalance`) on the connected endpoint. ITX has no ERC-2771
//! support of its own, so every submission is wrapped through the
//! configured custom forwarder.

use crate::relayer::{Relayer, RelayerFactory};
use alloy::{
    primitives::{address, keccak256, Address, Bytes, TxKind, U256},
    providers::{Provider, ProviderBuilder, ReqwestProvider},
    rpc::types::TransactionRequest,
    signers::Signer,
    sol_types::SolValue,
};
use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use types::{utils, ForwarderConfig, MetaTxError, RelayError, RelayResponse, RelayStatus, Result};

const RELAYER_NAME: &str = "itx";

/// ITX deposit contract (same address on all public Ethereum networks)
const ITX_DEPOSIT_CONTRACT: Address = address!("015C7C7A7D65bbdb117C573007219107BD7486f9");

/// Ethereum mainnet, goerli, polygon mainnet
const SUPPORTED_CHAIN_IDS: &[u64] = &[1, 5, 137];

/// Relay speed requested from ITX
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Schedule {
    Fast,
    Slow,
}

impl Schedule {
    fn as_str(&self) -> &'static str {
        match self {
            Schedule::Fast => "fast",
            Schedule::Slow => "slow",
        }
    }
}

/// Tunable submission parameters
#[derive(Debug, Clone)]
pub struct ItxOptions {
    /// Gas limit for the relayed transaction
    pub gas: U256,
    /// Relay speed
    pub schedule: Schedule,
}

impl Default for ItxOptions {
    fn default() -> Self {
        Self {
            gas: U256::from(1_000_000),
            schedule: Schedule::Slow,
        }
    }
}

/// ITX adapter configuration
#[derive(Debug, Clone)]
pub struct ItxConfig {
    /// ITX-enabled JSON-RPC endpoint (authentication rides on the
    /// endpoint credentials)
    pub rpc_url: String,
    /// Custom forwarder every submission is wrapped through
    pub forwarder: ForwarderConfig,
    /// Submission parameters
    pub options: ItxOptions,
}

/// Adapter for Infura Transactions (ITX)
pub struct ItxRelayer<S> {
    chain_id: u64,
    signer: Arc<S>,
    provider: ReqwestProvider,
    forwarder: ForwarderConfig,
    options: ItxOptions,
}

/// Factory producing [`ItxRelayer`] instances for the registry
pub struct ItxFactory {
    config: ItxConfig,
}

impl ItxFactory {
    /// Create a factory from adapter configuration
    pub fn with(config: ItxConfig) -> Self {
        Self { config }
    }
}

#[async_trait]
impl<S> RelayerFactory<S> for ItxFactory
where
    S: Signer + Send + Sync + 'static,
{
    async fn build(&self, chain_id: u64, signer: Arc<S>) -> Result<Arc<dyn Relayer>> {
        let rpc_url = self
            .config
            .rpc_url
            .parse()
            .map_err(|e| RelayError::Config(format!("invalid rpc_url: {e}")))?;
        let provider = ProviderBuilder::new().on_http(rpc_url);

        Ok(Arc::new(ItxRelayer {
            chain_id,
            signer,
            provider,
            forwarder: self.config.forwarder.clone(),
            options: self.config.options.clone(),
        }))
    }
}

#[derive(Debug, Clone, Serialize)]
struct ItxRelayRequest {
    to: Address,
    data: Bytes,
    gas: String,
    schedule: Schedule,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct ItxSendResponse {
    relay_transaction_hash: String,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct ItxStatusResponse {
    #[serde(default)]
    broadcasts: Option<Vec<ItxBroadcast>>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct ItxBroadcast {
    eth_tx_hash: alloy::primitives::TxHash,
}

#[derive(Debug, Deserialize)]
struct ItxBalanceResponse {
    balance: String,
}

impl<S> ItxRelayer<S>
where
    S: Signer + Send + Sync + 'static,
{
    /// EIP-191 signature over the relay request fields, identifying the
    /// gas tank owner to the ITX API.
    async fn sign_relay_request(&self, request: &ItxRelayRequest) -> Result<String> {
        let encoded = (
            request.to,
            request.data.clone(),
            self.options.gas,
            U256::from(self.chain_id),
            request.schedule.as_str().to_string(),
        )
            .abi_encode_params();
        let relay_transaction_hash = keccak256(&encoded);

        let signature = self
            .signer
            .sign_message(relay_transaction_hash.as_slice())
            .await
            .map_err(MetaTxError::from)?;
        Ok(format!("0x{}", hex::encode(signature.as_bytes())))
    }
}

#[async_trait]
impl<S> Relayer for ItxRelayer<S>
where
    S: Signer + Send + Sync + 'static,
{
    fn name(&self) -> &str {
        RELAYER_NAME
    }

    async fn send(&self, tx: &TransactionRequest) -> Result<RelayResponse> {
        let correlation_id = utils::generate_correlation_id();

        let meta_tx = metatx::create_forwarded_transaction(
            tx,
            &self.forwarder,
            self.signer.as_ref(),
            self.provider.clone(),
        )
        .await?;
        let (_, data) = metatx::call_fields(&meta_tx)?;

        let request = ItxRelayRequest {
            to: self.forwarder.address,
            data,
            gas: self.options.gas.to_string(),
            schedule: self.options.schedule,
        };
        let signature = self.sign_relay_request(&request).await?;

        tracing::info!(
            relayer = RELAYER_NAME,
            correlation_id = %correlation_id,
            chain_id = self.chain_id,
            forwarder = %request.to,
            schedule = request.schedule.as_str(),
            "submitting relay transaction"
        );

        let response: ItxSendResponse = self
            .provider
            .raw_request("relay_sendTransaction".into(), (request, signature))
            .await?;

        Ok(RelayResponse::new(response.relay_transaction_hash))
    }

    async fn lookup(&self, task_id: &str) -> Result<RelayStatus> {
        let status: ItxStatusResponse = self
            .provider
            .raw_request("relay_getTransactionStatus".into(), (task_id.to_string(),))
            .await?;

        // No broadcasts yet
        let Some(broadcasts) = status.broadcasts else {
            return Ok(RelayStatus::pending());
        };

        for broadcast in broadcasts {
            let Some(receipt) = self
                .provider
                .get_transaction_receipt(broadcast.eth_tx_hash)
                .await?
            else {
                continue;
            };

            let status = if receipt.status() {
                RelayStatus::complete(Some(receipt.transaction_hash))
            } else {
                RelayStatus::errored(Some(receipt.transaction_hash))
            };

            return Ok(match serde_json::to_value(&receipt) {
                Ok(detail) => status.with_detail(detail),
                Err(_) => status,
            });
        }

        // Broadcast but not mined yet
        Ok(RelayStatus::pending())
    }

    async fn supports_chain(&self, chain_id: u64) -> Result<bool> {
        Ok(SUPPORTED_CHAIN_IDS.contains(&chain_id))
    }

    async fn get_balance(&self) -> Result<U256> {
        let response: ItxBalanceResponse = self
            .provider
            .raw_request("relay_getBalance".into(), (self.signer.address(),))
            .await?;

        response
            .balance
            .parse::<U256>()
            .map_err(|_| RelayError::UnexpectedResponse {
                relayer: RELAYER_NAME.to_string(),
                message: format!("unparseable balance: {}", response.balance),
            })
    }

    async fn fund(&self, amount: U256) -> Result<()> {
        // Deposits are plain value transfers to the ITX deposit contract,
        // sent by the account the connected endpoint manages.
        let tx = TransactionRequest {
            from: Some(self.signer.address()),
            to: Some(TxKind::Call(ITX_DEPOSIT_CONTRACT)),
            value: Some(amount),
            ..Default::default()
        };

        let pending = self.provider.send_transaction(tx).await?;
        let tx_hash = pending.watch().await.map_err(|e| RelayError::Rejected {
            relayer: RELAYER_NAME.to_string(),
            message: format!("deposit transaction failed: {e}"),
        })?;

        tracing::info!(
            relayer = RELAYER_NAME,
            tx_hash = %utils::sanitize_for_logging(&tx_hash.to_string()),
            "deposited into the ITX gas tank"
        );
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use alloy::{
        primitives::address, rpc::types::TransactionInput, signers::local::PrivateKeySigner,
    };
    use serde_json::json;
    use wiremock::{
        matchers::{body_partial_json, method},
        Mock, MockServer, Request, Respond, ResponseTemplate,
    };

    const TX_HASH: &str = "0x2222222222222222222222222222222222222222222222222222222222222222";

    struct RpcResponder {
        result: serde_json::Value,
    }

    impl Respond for RpcResponder {
        fn respond(&self, request: &Request) -> ResponseTemplate {
            let body: serde_json::Value = serde_json::from_slice(&request.body).unwrap();
            ResponseTemplate::new(200).set_body_json(json!({
                "jsonrpc": "2.0",
                "id": body["id"],
                "result": self.result,
            }))
        }
    }

    fn rpc_mock(rpc_method: &str, result: serde_json::Value) -> Mock {
        Mock::given(method("POST"))
            .and(body_partial_json(json!({ "method": rpc_method })))
            .respond_with(RpcResponder { result })
    }

    fn receipt_json(status: &str) -> serde_json::Value {
        json!({
            "transactionHash": TX_HASH,
            "transactionIndex": "0x0",
            "blockHash": "0x3333333333333333333333333333333333333333333333333333333333333333",
            "blockNumber": "0x10",
            "from": "0xaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaa",
            "to": "0xcccccccccccccccccccccccccccccccccccccccc",
            "cumulativeGasUsed": "0x5208",
            "gasUsed": "0x5208",
            "contractAddress": null,
            "logs": [],
            "logsBloom": format!("0x{}", "00".repeat(256)),
            "status": status,
            "type": "0x2",
            "effectiveGasPrice": "0x3b9aca00",
        })
    }

    async fn relayer(server: &MockServer) -> Arc<dyn Relayer> {
        let config = ItxConfig {
            rpc_url: server.uri(),
            forwarder: ForwarderConfig::new(
                address!("cccccccccccccccccccccccccccccccccccccccc"),
                "FlexibleNonceForwarder",
                "0.0.1",
            ),
            options: ItxOptions::default(),
        };

        ItxFactory::with(config)
            .build(137, Arc::new(PrivateKeySigner::random()))
            .await
            .unwrap()
    }

    fn call_request() -> TransactionRequest {
        TransactionRequest {
            to: Some(TxKind::Call(address!(
                "bbbbbbbbbbbbbbbbbbbbbbbbbbbbbbbbbbbbbbbb"
            ))),
            input: TransactionInput::new(Bytes::from(vec![0xde, 0xad])),
            ..Default::default()
        }
    }

    #[tokio::test]
    async fn send_wraps_and_submits_a_relay_transaction() {
        let server = MockServer::start().await;
        rpc_mock(
            "eth_call",
            json!("0x0000000000000000000000000000000000000000000000000000000000000003"),
        )
        .mount(&server)
        .await;
        rpc_mock("eth_chainId", json!("0x89")).mount(&server).await;
        rpc_mock(
            "relay_sendTransaction",
            json!({ "relayTransactionHash": "0xrelay-task" }),
        )
        .mount(&server)
        .await;

        let relayer = relayer(&server).await;
        let response = relayer.send(&call_request()).await.unwrap();
        assert_eq!(response.task_id, "0xrelay-task");
    }

    #[tokio::test]
    async fn send_fails_fast_on_an_incomplete_transaction() {
        let server = MockServer::start().await;
        let relayer = relayer(&server).await;

        let missing_to = TransactionRequest {
            input: TransactionInput::new(Bytes::from(vec![0xde, 0xad])),
            ..Default::default()
        };
        let result = relayer.send(&missing_to).await;
        assert!(matches!(result, Err(RelayError::MetaTx(_))));
        assert!(server.received_requests().await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn lookup_without_broadcasts_is_pending() {
        let server = MockServer::start().await;
        rpc_mock("relay_getTransactionStatus", json!({}))
            .mount(&server)
            .await;

        let relayer = relayer(&server).await;
        let status = relayer.lookup("0xtask").await.unwrap();
        assert!(!status.is_terminal());
    }

    #[tokio::test]
    async fn lookup_reports_a_mined_broadcast_as_complete() {
        let server = MockServer::start().await;
        rpc_mock(
            "relay_getTransactionStatus",
            json!({ "broadcasts": [{ "ethTxHash": TX_HASH }] }),
        )
        .mount(&server)
        .await;
        rpc_mock("eth_getTransactionReceipt", receipt_json("0x1"))
            .mount(&server)
            .await;

        let relayer = relayer(&server).await;
        let status = relayer.lookup("0xtask").await.unwrap();
        assert!(status.is_complete && !status.is_error);
        assert_eq!(status.transaction_hash, Some(TX_HASH.parse().unwrap()));
        assert!(status.detail.is_some());
    }

    #[tokio::test]
    async fn lookup_reports_a_reverted_broadcast_as_error() {
        let server = MockServer::start().await;
        rpc_mock(
            "relay_getTransactionStatus",
            json!({ "broadcasts": [{ "ethTxHash": TX_HASH }] }),
        )
        .mount(&server)
        .await;
        rpc_mock("eth_getTransactionReceipt", receipt_json("0x0"))
            .mount(&server)
            .await;

        let relayer = relayer(&server).await;
        let status = relayer.lookup("0xtask").await.unwrap();
        assert!(status.is_error && !status.is_complete);
    }

    #[tokio::test]
    async fn lookup_skips_unmined_broadcasts() {
        let server = MockServer::start().await;
        rpc_mock(
            "relay_getTransactionStatus",
            json!({ "broadcasts": [{ "ethTxHash": TX_HASH }] }),
        )
        .mount(&server)
        .await;
        rpc_mock("eth_getTransactionReceipt", json!(null))
            .mount(&server)
            .await;

        let relayer = relayer(&server).await;
        let status = relayer.lookup("0xtask").await.unwrap();
        assert!(!status.is_terminal());
    }

    #[tokio::test]
    async fn get_balance_uses_the_relay_rpc() {
        let server = MockServer::start().await;
        rpc_mock("relay_getBalance", json!({ "balance": "100000" }))
            .mount(&server)
            .await;

        let relayer = relayer(&server).await;
        assert_eq!(relayer.get_balance().await.unwrap(), U256::from(100_000));
    }

    #[tokio::test]
    async fn chain_support_is_a_static_list() {
        let server = MockServer::start().await;
        let relayer = relayer(&server).await;

        assert!(relayer.supports_chain(1).await.unwrap());
        assert!(relayer.supports_chain(5).await.unwrap());
        assert!(relayer.supports_chain(137).await.unwrap());
        assert!(!relayer.supports_chain(10).await.unwrap());
        // The capability check never touches the network
        assert!(server.received_requests().await.unwrap().is_empty());
    }
}
