pub mod evaluator;
pub mod normalize;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::rules::Rule;

/// Fatal pre-flight failures. Everything that happens after validation is
/// recorded per rule instead of aborting the evaluation.
#[derive(Debug, Error)]
pub enum EvalError {
    #[error("invalid wallet address: {0}")]
    InvalidAddress(String),
    #[error("token ABI is malformed: {0}")]
    InvalidAbi(String),
}

/// Aggregated outcome of one (token, address, rule set) evaluation.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct EligibilityReport {
    pub success: bool,
    pub token_name: String,
    pub token_address: String,
    pub checked_address: String,
    pub decimals: u32,
    pub results: Vec<RuleOutcome>,
    pub checked_at: DateTime<Utc>,
}

impl EligibilityReport {
    pub fn passed_count(&self) -> usize {
        self.results.iter().filter(|r| r.success).count()
    }

    pub fn failed_results(&self) -> impl Iterator<Item = &RuleOutcome> {
        self.results.iter().filter(|r| !r.success)
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RuleOutcome {
    pub rule: Rule,
    pub success: bool,
    pub value: Option<f64>,
    pub error: Option<String>,
}

impl RuleOutcome {
    pub fn failed(rule: &Rule, error: impl Into<String>) -> Self {
        Self {
            rule: rule.clone(),
            success: false,
            value: None,
            error: Some(error.into()),
        }
    }
}
