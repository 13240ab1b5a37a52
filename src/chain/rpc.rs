use std::time::Duration;

use async_trait::async_trait;
use once_cell::sync::Lazy;
use primitive_types::U256;
use reqwest::Client;
use serde_json::{json, Value};
use tiny_keccak::{Hasher, Keccak};
use tracing::debug;

use crate::chain::{normalize_address, CallArgs, ContractCall, ContractReader, ReadError};

const DEFAULT_HTTP_TIMEOUT_SECS: u64 = 12;
const DEFAULT_CONNECT_TIMEOUT_SECS: u64 = 6;

static HTTP_CLIENT: Lazy<Client> = Lazy::new(|| {
    Client::builder()
        .user_agent("eligibility-oracle/0.1")
        .timeout(Duration::from_secs(DEFAULT_HTTP_TIMEOUT_SECS))
        .connect_timeout(Duration::from_secs(DEFAULT_CONNECT_TIMEOUT_SECS))
        .build()
        .expect("failed to build HTTP client")
});

/// `eth_call`-backed contract reader against a single JSON-RPC endpoint.
pub struct JsonRpcReader {
    rpc_url: String,
    timeout: Duration,
}

impl JsonRpcReader {
    pub fn new(rpc_url: impl Into<String>, timeout_secs: u64) -> Self {
        Self {
            rpc_url: rpc_url.into(),
            timeout: Duration::from_secs(timeout_secs.max(1)),
        }
    }
}

#[async_trait]
impl ContractReader for JsonRpcReader {
    async fn read(&self, contract_address: &str, call: &ContractCall) -> Result<U256, ReadError> {
        let to = normalize_address(contract_address)
            .ok_or_else(|| ReadError::InvalidAddress(contract_address.to_string()))?;
        let data = encode_calldata(call)?;
        debug!(contract = %to, function = %call.signature(), "issuing eth_call");

        let request = json!({
            "jsonrpc": "2.0",
            "id": 1,
            "method": "eth_call",
            "params": [{"to": to, "data": data}, "latest"],
        });

        let response = HTTP_CLIENT
            .post(&self.rpc_url)
            .timeout(self.timeout)
            .json(&request)
            .send()
            .await
            .map_err(|e| ReadError::Transport(e.to_string()))?;
        let body: Value = response
            .json()
            .await
            .map_err(|e| ReadError::Transport(format!("invalid JSON-RPC response: {e}")))?;

        if let Some(error) = body.get("error") {
            let message = error
                .get("message")
                .and_then(Value::as_str)
                .unwrap_or("unknown RPC error");
            return Err(ReadError::CallFailed(message.to_string()));
        }

        let result = body
            .get("result")
            .and_then(Value::as_str)
            .ok_or_else(|| ReadError::Transport("missing result field".to_string()))?;
        decode_return_word(result)
    }
}

/// Build 0x-prefixed calldata: 4-byte keccak selector of the canonical
/// signature, plus the single address argument left-padded to 32 bytes.
pub fn encode_calldata(call: &ContractCall) -> Result<String, ReadError> {
    let mut data = function_selector(&call.signature()).to_vec();
    if let CallArgs::Address(holder) = &call.args {
        let normalized = normalize_address(holder)
            .ok_or_else(|| ReadError::InvalidAddress(holder.clone()))?;
        let mut word = [0u8; 32];
        hex::decode_to_slice(&normalized[2..], &mut word[12..])
            .map_err(|e| ReadError::InvalidAddress(e.to_string()))?;
        data.extend_from_slice(&word);
    }
    Ok(format!("0x{}", hex::encode(data)))
}

pub fn function_selector(signature: &str) -> [u8; 4] {
    let mut hasher = Keccak::v256();
    let mut output = [0u8; 32];
    hasher.update(signature.as_bytes());
    hasher.finalize(&mut output);
    let mut selector = [0u8; 4];
    selector.copy_from_slice(&output[..4]);
    selector
}

/// Decode the first 32-byte word of `eth_call` return data. Nodes answer calls
/// to absent functions with empty data, which surfaces as `EmptyReturn` and
/// becomes a per-rule failure upstream.
pub fn decode_return_word(raw: &str) -> Result<U256, ReadError> {
    let digits = raw.strip_prefix("0x").unwrap_or(raw);
    if digits.is_empty() {
        return Err(ReadError::EmptyReturn);
    }
    let bytes =
        hex::decode(digits).map_err(|e| ReadError::CallFailed(format!("bad return data: {e}")))?;
    let mut word = [0u8; 32];
    if bytes.len() >= 32 {
        word.copy_from_slice(&bytes[..32]);
    } else {
        word[32 - bytes.len()..].copy_from_slice(&bytes);
    }
    Ok(U256::from_big_endian(&word))
}
