pub mod rpc;

use async_trait::async_trait;
use primitive_types::U256;
use thiserror::Error;

/// Argument shape of a read call. Rules only ever produce two shapes: a plain
/// getter or a single-address lookup, so the variants are closed here instead
/// of dispatching on function names at call time.
#[derive(Debug, Clone, PartialEq)]
pub enum CallArgs {
    None,
    Address(String),
}

/// A resolved, typed descriptor for one read-only contract call.
#[derive(Debug, Clone, PartialEq)]
pub struct ContractCall {
    pub function: String,
    pub args: CallArgs,
    pub output_type: String,
}

impl ContractCall {
    pub fn zero_arg(function: impl Into<String>, output_type: impl Into<String>) -> Self {
        Self {
            function: function.into(),
            args: CallArgs::None,
            output_type: output_type.into(),
        }
    }

    pub fn address_arg(
        function: impl Into<String>,
        holder: impl Into<String>,
        output_type: impl Into<String>,
    ) -> Self {
        Self {
            function: function.into(),
            args: CallArgs::Address(holder.into()),
            output_type: output_type.into(),
        }
    }

    /// Canonical Solidity signature used for selector derivation.
    pub fn signature(&self) -> String {
        match self.args {
            CallArgs::None => format!("{}()", self.function),
            CallArgs::Address(_) => format!("{}(address)", self.function),
        }
    }
}

#[derive(Debug, Error)]
pub enum ReadError {
    #[error("invalid contract address: {0}")]
    InvalidAddress(String),
    #[error("rpc transport failure: {0}")]
    Transport(String),
    #[error("contract call failed: {0}")]
    CallFailed(String),
    #[error("call returned no data")]
    EmptyReturn,
}

/// Read-only contract access. One attempt per call, no retries; a failure
/// belongs to the rule that issued the call.
#[async_trait]
pub trait ContractReader: Send + Sync {
    async fn read(&self, contract_address: &str, call: &ContractCall) -> Result<U256, ReadError>;
}

/// Validate a 20-byte hex wallet/contract address with optional 0x prefix.
pub fn is_wallet_address(raw: &str) -> bool {
    let digits = raw.strip_prefix("0x").unwrap_or(raw);
    digits.len() == 40 && digits.chars().all(|c| c.is_ascii_hexdigit())
}

/// Lowercase-normalize an address to its 0x-prefixed form.
pub fn normalize_address(raw: &str) -> Option<String> {
    if !is_wallet_address(raw) {
        return None;
    }
    let digits = raw.strip_prefix("0x").unwrap_or(raw);
    Some(format!("0x{}", digits.to_ascii_lowercase()))
}
