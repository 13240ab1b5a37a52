pub mod store;

use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::abi::parse_abi;
use crate::chain::normalize_address;

/// A registered token contract. Immutable once created; removal is the only
/// mutation.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct TokenRecord {
    pub id: u64,
    pub name: String,
    pub address: String,
    pub abi: String,
}

/// Creation payload before id assignment and normalization.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct NewToken {
    pub name: String,
    pub address: String,
    pub abi: String,
}

#[derive(Debug, Error)]
pub enum StoreError {
    #[error("token name cannot be empty")]
    EmptyName,
    #[error("invalid contract address format: {0}")]
    InvalidAddress(String),
    #[error("invalid ABI: {0}")]
    InvalidAbi(String),
    #[error("token already exists: {0}")]
    DuplicateName(String),
    #[error("address already registered: {0}")]
    DuplicateAddress(String),
    #[error("failed persisting token registry: {0}")]
    Persistence(String),
}

/// The registry collaborator the engine and surfaces are handed. Constructed
/// once at startup and passed down; never a process-wide singleton.
pub trait TokenStore: Send + Sync {
    fn insert(&self, token: NewToken) -> Result<TokenRecord, StoreError>;
    fn get(&self, id: u64) -> Result<Option<TokenRecord>, StoreError>;
    fn find_by_name(&self, name: &str) -> Result<Option<TokenRecord>, StoreError>;
    fn list(&self) -> Result<Vec<TokenRecord>, StoreError>;
    fn delete(&self, id: u64) -> Result<bool, StoreError>;
}

/// Validate and normalize a creation payload: non-empty name, 40-hex-digit
/// address lowercased with 0x prefix, ABI parseable as a JSON array.
pub fn validate_new_token(token: NewToken) -> Result<NewToken, StoreError> {
    let name = token.name.trim().to_string();
    if name.is_empty() {
        return Err(StoreError::EmptyName);
    }
    let address = normalize_address(&token.address)
        .ok_or_else(|| StoreError::InvalidAddress(token.address.clone()))?;
    parse_abi(&token.abi).map_err(|e| StoreError::InvalidAbi(e.to_string()))?;
    Ok(NewToken {
        name,
        address,
        abi: token.abi,
    })
}
