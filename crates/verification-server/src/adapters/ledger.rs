//! # Fee Ledger Adapter
//!
//! `FeeLedger` over Ethereum JSON-RPC: an `eth_call` of
//! `feePaidFor(address) returns (uint256)` on each chain's verification
//! contract at the latest block.

use async_trait::async_trait;
use pp_01_signing_engine::keccak256;
use pp_02_verification::{FeeLedger, LedgerError};
use reqwest::Client;
use serde::{Deserialize, Serialize};
use serde_json::json;
use shared_types::{Address, ChainId};
use std::collections::HashMap;
use std::sync::atomic::{AtomicU64, Ordering};
use std::time::Duration;
use tracing::debug;

const FEE_PAID_FOR_SIGNATURE: &str = "feePaidFor(address)";

/// Where to query one chain.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LedgerEndpoint {
    pub rpc_url: String,
    pub contract: Address,
}

/// JSON-RPC client for the verification contracts.
pub struct JsonRpcFeeLedger {
    client: Client,
    endpoints: HashMap<ChainId, LedgerEndpoint>,
    selector: [u8; 4],
    request_id: AtomicU64,
}

impl JsonRpcFeeLedger {
    pub fn new(
        endpoints: HashMap<ChainId, LedgerEndpoint>,
        timeout: Duration,
    ) -> Result<Self, LedgerError> {
        let client = Client::builder()
            .timeout(timeout)
            .build()
            .map_err(|e| LedgerError::Rpc(e.to_string()))?;

        Ok(Self {
            client,
            endpoints,
            selector: function_selector(FEE_PAID_FOR_SIGNATURE),
            request_id: AtomicU64::new(1),
        })
    }

    fn next_id(&self) -> u64 {
        self.request_id.fetch_add(1, Ordering::Relaxed)
    }

    /// Calldata: selector followed by the left-padded address word.
    fn calldata(&self, account: Address) -> String {
        let mut data = Vec::with_capacity(4 + 32);
        data.extend_from_slice(&self.selector);
        data.extend_from_slice(&[0u8; 12]);
        data.extend_from_slice(account.as_bytes());
        format!("0x{}", hex::encode(data))
    }
}

/// First four bytes of the Keccak-256 of a function signature.
pub fn function_selector(signature: &str) -> [u8; 4] {
    let hash = keccak256(signature.as_bytes());
    [hash[0], hash[1], hash[2], hash[3]]
}

/// Decode a `uint256` return word that must fit a block number.
pub fn decode_block_number(result: &str) -> Result<u64, LedgerError> {
    let raw = result.strip_prefix("0x").unwrap_or(result);
    let bytes = hex::decode(raw).map_err(|e| LedgerError::Decode(e.to_string()))?;
    if bytes.len() != 32 {
        return Err(LedgerError::Decode(format!(
            "expected a 32-byte word, got {} bytes",
            bytes.len()
        )));
    }
    if bytes[..24].iter().any(|b| *b != 0) {
        return Err(LedgerError::Decode("block number exceeds u64".into()));
    }
    let mut word = [0u8; 8];
    word.copy_from_slice(&bytes[24..]);
    Ok(u64::from_be_bytes(word))
}

#[derive(Serialize)]
struct RpcRequest {
    jsonrpc: &'static str,
    id: u64,
    method: &'static str,
    params: [serde_json::Value; 2],
}

#[derive(Deserialize)]
struct RpcResponse {
    result: Option<String>,
    error: Option<RpcErrorObject>,
}

#[derive(Deserialize)]
struct RpcErrorObject {
    code: i64,
    message: String,
}

#[async_trait]
impl FeeLedger for JsonRpcFeeLedger {
    async fn fee_paid_for(&self, chain: ChainId, account: Address) -> Result<u64, LedgerError> {
        let endpoint = self
            .endpoints
            .get(&chain)
            .ok_or(LedgerError::UnsupportedChain(chain))?;

        let request = RpcRequest {
            jsonrpc: "2.0",
            id: self.next_id(),
            method: "eth_call",
            params: [
                json!({ "to": endpoint.contract, "data": self.calldata(account) }),
                json!("latest"),
            ],
        };

        let response: RpcResponse = self
            .client
            .post(&endpoint.rpc_url)
            .json(&request)
            .send()
            .await
            .map_err(|e| LedgerError::Rpc(e.to_string()))?
            .json()
            .await
            .map_err(|e| LedgerError::Decode(e.to_string()))?;

        if let Some(error) = response.error {
            return Err(LedgerError::Rpc(format!("{} ({})", error.message, error.code)));
        }
        let result = response
            .result
            .ok_or_else(|| LedgerError::Decode("missing result".into()))?;

        let block = decode_block_number(&result)?;
        debug!(chain = %chain, account = %account, block, "[ledger] feePaidFor");
        Ok(block)
    }
}
