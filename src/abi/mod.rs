pub mod filter;

use anyhow::{anyhow, Result};
use serde::{Deserialize, Serialize};

/// One entry of a contract ABI, as the registry stores it. Fields that do not
/// apply to a given entry kind (constructor, event, fallback) deserialize to
/// their defaults so a full ERC-20 ABI parses without special-casing.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
pub struct AbiEntry {
    #[serde(default)]
    pub name: String,
    #[serde(rename = "type", default)]
    pub kind: String,
    #[serde(rename = "stateMutability", default)]
    pub state_mutability: String,
    #[serde(default)]
    pub inputs: Vec<AbiParam>,
    #[serde(default)]
    pub outputs: Vec<AbiParam>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
pub struct AbiParam {
    #[serde(rename = "type", default)]
    pub kind: String,
    #[serde(default)]
    pub name: String,
}

impl AbiEntry {
    pub fn is_read_only_function(&self) -> bool {
        self.kind == "function"
            && matches!(self.state_mutability.as_str(), "view" | "pure")
    }

    /// Declared type of the first output, if any.
    pub fn output_type(&self) -> Option<&str> {
        self.outputs.first().map(|p| p.kind.as_str())
    }
}

/// Parse a serialized ABI. The registry only accepts ABIs that are JSON
/// arrays; anything else is a validation error for the caller to surface.
pub fn parse_abi(raw: &str) -> Result<Vec<AbiEntry>> {
    let value: serde_json::Value =
        serde_json::from_str(raw).map_err(|e| anyhow!("ABI is not valid JSON: {e}"))?;
    let entries = value
        .as_array()
        .ok_or_else(|| anyhow!("ABI must be a JSON array of interface entries"))?;
    entries
        .iter()
        .map(|entry| {
            serde_json::from_value(entry.clone())
                .map_err(|e| anyhow!("malformed ABI entry: {e}"))
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::parse_abi;

    #[test]
    fn parses_mixed_entry_kinds() {
        let abi = r#"[
            {"type": "function", "name": "totalSupply", "stateMutability": "view",
             "inputs": [], "outputs": [{"type": "uint256"}]},
            {"type": "event", "name": "Transfer", "inputs": []},
            {"type": "fallback", "stateMutability": "payable"}
        ]"#;
        let entries = parse_abi(abi).expect("failed to parse ABI");
        assert_eq!(entries.len(), 3);
        assert!(entries[0].is_read_only_function());
        assert_eq!(entries[0].output_type(), Some("uint256"));
        assert!(!entries[1].is_read_only_function());
    }

    #[test]
    fn rejects_non_array_abi() {
        assert!(parse_abi(r#"{"type": "function"}"#).is_err());
        assert!(parse_abi("not json").is_err());
    }
}
