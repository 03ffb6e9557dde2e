//! Forwarder contract binding

use alloy::sol;

sol! {
    /// EIP-2771 forwarder surface consumed by the meta-transaction builder.
    ///
    /// `getNonce` is a read call; `execute` is only ever ABI-encoded here,
    /// never broadcast by this layer.
    #[allow(missing_docs)]
    #[sol(rpc)]
    contract Forwarder {
        struct ForwardRequest {
            address from;
            address to;
            uint256 value;
            uint256 gas;
            uint256 nonce;
            bytes data;
        }

        function getNonce(address from) external view returns (uint256);

        function execute(ForwardRequest calldata req, bytes calldata signature)
            external
            payable
            returns (bool, bytes memory);
    }
}
