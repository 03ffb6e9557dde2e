//! Forward request building and signing

use alloy::{
    primitives::{Address, Bytes, Signature, TxKind, U256},
    providers::Provider,
    rpc::types::{TransactionInput, TransactionRequest},
    signers::Signer,
    sol_types::{Eip712Domain, SolCall, SolStruct},
    transports::Transport,
};
use types::{DomainFragment, ForwarderConfig, MetaTxError};

use crate::abi::Forwarder;

/// Gas limit applied to a forward request when the caller does not set one
pub const DEFAULT_FORWARD_GAS: u64 = 2_000_000;

/// Result type for meta-transaction construction
pub type Result<T> = std::result::Result<T, MetaTxError>;

/// Caller-supplied fields of a forward request
#[derive(Debug, Clone)]
pub struct MetaTxInput {
    /// The account whose intent the forwarder re-executes
    pub from: Address,
    /// Target contract of the inner call
    pub to: Address,
    /// Calldata of the inner call
    pub data: Bytes,
    /// Ether value of the inner call; defaults to zero
    pub value: Option<U256>,
    /// Gas limit of the inner call; defaults to [`DEFAULT_FORWARD_GAS`]
    pub gas: Option<U256>,
}

impl MetaTxInput {
    /// A plain call with default value and gas
    pub fn new(from: Address, to: Address, data: Bytes) -> Self {
        Self {
            from,
            to,
            data,
            value: None,
            gas: None,
        }
    }
}

/// A forward request together with its EIP-712 signature.
///
/// Produced once per logical transaction and never reused: the embedded
/// nonce makes a second submission replay an already-consumed slot.
pub struct SignedForwardRequest {
    pub request: Forwarder::ForwardRequest,
    pub signature: Bytes,
}

/// Build a forward request by merging the caller input with the sender's
/// current forwarder nonce and the builder defaults.
///
/// The nonce is read from the forwarder at call time; a request held for
/// too long goes stale and is rejected downstream rather than retried.
pub async fn build_forward_request<T, P>(
    forwarder: &Forwarder::ForwarderInstance<T, P>,
    input: &MetaTxInput,
) -> Result<Forwarder::ForwardRequest>
where
    T: Transport + Clone,
    P: Provider<T>,
{
    let nonce = forwarder.getNonce(input.from).call().await?._0;
    tracing::debug!(from = %input.from, nonce = %nonce, "fetched forwarder nonce");

    Ok(Forwarder::ForwardRequest {
        from: input.from,
        to: input.to,
        value: input.value.unwrap_or(U256::ZERO),
        gas: input.gas.unwrap_or_else(|| U256::from(DEFAULT_FORWARD_GAS)),
        nonce,
        data: input.data.clone(),
    })
}

/// Assemble the full EIP-712 domain from the static fragment and the
/// request-time chain id and forwarder address.
pub fn domain_for(
    fragment: &DomainFragment,
    chain_id: u64,
    verifying_contract: Address,
) -> Eip712Domain {
    Eip712Domain::new(
        Some(fragment.name.clone().into()),
        Some(fragment.version.clone().into()),
        Some(U256::from(chain_id)),
        Some(verifying_contract),
        None,
    )
}

/// Resolve the active chain id from the forwarder's connected provider and
/// assemble the signing domain for its deployed address.
pub async fn build_domain<T, P>(
    forwarder: &Forwarder::ForwarderInstance<T, P>,
    fragment: &DomainFragment,
) -> Result<Eip712Domain>
where
    T: Transport + Clone,
    P: Provider<T>,
{
    let chain_id = forwarder.provider().get_chain_id().await?;
    Ok(domain_for(fragment, chain_id, *forwarder.address()))
}

/// Sign a forward request as EIP-712 typed data.
///
/// Failures from the signing capability propagate unchanged and are never
/// retried.
pub async fn sign_typed_data<S>(
    signer: &S,
    request: &Forwarder::ForwardRequest,
    domain: &Eip712Domain,
) -> Result<Signature>
where
    S: Signer + Sync,
{
    let hash = request.eip712_signing_hash(domain);
    Ok(signer.sign_hash(&hash).await?)
}

/// Build and sign a forward request in one step
pub async fn sign_meta_tx_request<T, P, S>(
    signer: &S,
    forwarder: &Forwarder::ForwarderInstance<T, P>,
    input: &MetaTxInput,
    fragment: &DomainFragment,
) -> Result<SignedForwardRequest>
where
    T: Transport + Clone,
    P: Provider<T>,
    S: Signer + Sync,
{
    let request = build_forward_request(forwarder, input).await?;
    let domain = build_domain(forwarder, fragment).await?;
    let signature = sign_typed_data(signer, &request, &domain).await?;

    Ok(SignedForwardRequest {
        request,
        signature: Bytes::from(signature.as_bytes().to_vec()),
    })
}

/// Extract the call target and calldata of a transaction request, failing
/// fast (no network call) when either is absent.
pub fn call_fields(tx: &TransactionRequest) -> Result<(Address, Bytes)> {
    let to = match tx.to {
        Some(TxKind::Call(address)) => address,
        _ => return Err(MetaTxError::IncompleteTransaction { field: "to" }),
    };

    let data = tx
        .input
        .input()
        .cloned()
        .ok_or(MetaTxError::IncompleteTransaction { field: "data" })?;

    Ok((to, data))
}

/// Wrap a transaction in a signed forward request and populate the
/// forwarder's `execute` call.
///
/// The returned request carries no `from`: it will be broadcast by a
/// third-party relayer, and must not assert a sender identity that will
/// not match the actual broadcaster.
pub async fn create_forwarded_transaction<T, P, S>(
    tx: &TransactionRequest,
    forwarder: &ForwarderConfig,
    signer: &S,
    provider: P,
) -> Result<TransactionRequest>
where
    T: Transport + Clone,
    P: Provider<T>,
    S: Signer + Sync,
{
    let (to, data) = call_fields(tx)?;

    let contract = Forwarder::new(forwarder.address, provider);
    let input = MetaTxInput::new(signer.address(), to, data);
    let signed = sign_meta_tx_request(signer, &contract, &input, &forwarder.domain).await?;

    let calldata = Forwarder::executeCall {
        req: signed.request,
        signature: signed.signature,
    }
    .abi_encode();

    Ok(TransactionRequest {
        to: Some(TxKind::Call(forwarder.address)),
        input: TransactionInput::new(Bytes::from(calldata)),
        ..Default::default()
    })
}
