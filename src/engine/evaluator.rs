use chrono::Utc;
use primitive_types::U256;
use tracing::debug;

use crate::abi::{parse_abi, AbiEntry};
use crate::chain::{normalize_address, ContractCall, ContractReader};
use crate::engine::normalize::{normalize, MAX_SUPPORTED_DECIMALS};
use crate::engine::{EligibilityReport, EvalError, RuleOutcome};
use crate::rules::predicate::satisfies;
use crate::rules::Rule;
use crate::tokens::TokenRecord;

const FUNCTION_NOT_FOUND: &str = "function not found in ABI";

/// Evaluate a rule set for one (token, address) pair.
///
/// Address and ABI problems are fatal and reported before any network
/// activity. After that each rule is resolved independently: a lookup miss,
/// transport failure, or revert marks that rule failed and evaluation moves
/// on. Result order matches rule order. An empty rule set yields a trivially
/// successful report; callers that require rules must block before calling.
pub async fn evaluate_eligibility(
    reader: &dyn ContractReader,
    token: &TokenRecord,
    address: &str,
    rules: &[Rule],
    default_decimals: u32,
) -> Result<EligibilityReport, EvalError> {
    let target = normalize_address(address)
        .ok_or_else(|| EvalError::InvalidAddress(address.to_string()))?;
    let abi = parse_abi(&token.abi).map_err(|e| EvalError::InvalidAbi(e.to_string()))?;

    let decimals = discover_decimals(reader, &token.address, default_decimals).await;

    let mut results = Vec::with_capacity(rules.len());
    for rule in rules {
        results.push(evaluate_rule(reader, token, &abi, &target, decimals, rule).await);
    }

    let success = results.iter().all(|r| r.success);
    Ok(EligibilityReport {
        success,
        token_name: token.name.clone(),
        token_address: token.address.clone(),
        checked_address: target,
        decimals,
        results,
        checked_at: Utc::now(),
    })
}

/// Best-effort `decimals()` probe. Absent functions, transport failures, and
/// nonsense answers all fall back to the default precision without surfacing
/// an error.
async fn discover_decimals(
    reader: &dyn ContractReader,
    contract_address: &str,
    default_decimals: u32,
) -> u32 {
    let call = ContractCall::zero_arg("decimals", "uint8");
    match reader.read(contract_address, &call).await {
        Ok(raw) if raw <= U256::from(MAX_SUPPORTED_DECIMALS) => raw.as_u32(),
        Ok(raw) => {
            debug!(raw = %raw, "decimals out of range, using default precision");
            default_decimals
        }
        Err(err) => {
            debug!(error = %err, "decimals discovery failed, using default precision");
            default_decimals
        }
    }
}

async fn evaluate_rule(
    reader: &dyn ContractReader,
    token: &TokenRecord,
    abi: &[AbiEntry],
    target: &str,
    decimals: u32,
    rule: &Rule,
) -> RuleOutcome {
    let Some(entry) = abi
        .iter()
        .find(|e| e.kind == "function" && e.name == rule.function_name)
    else {
        return RuleOutcome::failed(rule, FUNCTION_NOT_FOUND);
    };

    let output_type = entry.output_type().unwrap_or("uint256").to_string();
    let call = if entry.inputs.is_empty() {
        ContractCall::zero_arg(&rule.function_name, &output_type)
    } else {
        ContractCall::address_arg(&rule.function_name, target, &output_type)
    };

    match reader.read(&token.address, &call).await {
        Ok(raw) => {
            let value = normalize(raw, &output_type, decimals);
            RuleOutcome {
                rule: rule.clone(),
                success: satisfies(value, rule.value, rule.operator),
                value: Some(value),
                error: None,
            }
        }
        Err(err) => RuleOutcome::failed(rule, err.to_string()),
    }
}

#[cfg(test)]
mod tests {
    use std::collections::HashMap;

    use async_trait::async_trait;
    use primitive_types::U256;

    use super::evaluate_eligibility;
    use crate::chain::{ContractCall, ContractReader, ReadError};
    use crate::engine::normalize::DEFAULT_DECIMALS;
    use crate::engine::EvalError;
    use crate::rules::{Operator, Rule};
    use crate::tokens::TokenRecord;

    const ERC20_ABI: &str = r#"[
        {"type": "function", "name": "balanceOf", "stateMutability": "view",
         "inputs": [{"type": "address"}], "outputs": [{"type": "uint256"}]},
        {"type": "function", "name": "totalSupply", "stateMutability": "view",
         "inputs": [], "outputs": [{"type": "uint256"}]},
        {"type": "function", "name": "tier", "stateMutability": "view",
         "inputs": [{"type": "address"}], "outputs": [{"type": "uint8"}]}
    ]"#;

    /// Replays canned answers keyed by call signature.
    struct MockReader {
        responses: HashMap<String, Result<U256, String>>,
    }

    impl MockReader {
        fn new() -> Self {
            Self {
                responses: HashMap::new(),
            }
        }

        fn answer(mut self, signature: &str, value: U256) -> Self {
            self.responses.insert(signature.to_string(), Ok(value));
            self
        }

        fn fail(mut self, signature: &str, message: &str) -> Self {
            self.responses
                .insert(signature.to_string(), Err(message.to_string()));
            self
        }
    }

    #[async_trait]
    impl ContractReader for MockReader {
        async fn read(
            &self,
            _contract_address: &str,
            call: &ContractCall,
        ) -> Result<U256, ReadError> {
            match self.responses.get(&call.signature()) {
                Some(Ok(value)) => Ok(*value),
                Some(Err(message)) => Err(ReadError::CallFailed(message.clone())),
                None => Err(ReadError::EmptyReturn),
            }
        }
    }

    fn token() -> TokenRecord {
        TokenRecord {
            id: 1,
            name: "Quest".to_string(),
            address: "0xa0b86991c6218b36c1d19d4a2e9eb0ce3606eb48".to_string(),
            abi: ERC20_ABI.to_string(),
        }
    }

    fn balance_rule(operator: Operator, value: f64) -> Rule {
        Rule {
            function_name: "balanceOf".to_string(),
            operator,
            value,
            display_name: "Balance Of".to_string(),
        }
    }

    const HOLDER: &str = "0x00000000000000000000000000000000000000aa";

    #[tokio::test]
    async fn balance_rule_passes_end_to_end() {
        let reader = MockReader::new()
            .answer("decimals()", U256::from(18u64))
            .answer("balanceOf(address)", U256::from(200u64) * U256::exp10(18));
        let rules = vec![balance_rule(Operator::GreaterThanEqual, 100.0)];

        let report = evaluate_eligibility(&reader, &token(), HOLDER, &rules, DEFAULT_DECIMALS)
            .await
            .expect("evaluation failed");
        assert!(report.success);
        assert_eq!(report.results.len(), 1);
        assert!(report.results[0].success);
        assert_eq!(report.results[0].value, Some(200.0));
        assert!(report.results[0].error.is_none());
        assert_eq!(report.decimals, 18);
    }

    #[tokio::test]
    async fn missing_function_is_a_per_rule_failure() {
        let reader = MockReader::new().answer("decimals()", U256::from(18u64));
        let rules = vec![Rule {
            function_name: "nonExistentFn".to_string(),
            operator: Operator::GreaterThanEqual,
            value: 0.0,
            display_name: "Non Existent Fn".to_string(),
        }];

        let report = evaluate_eligibility(&reader, &token(), HOLDER, &rules, DEFAULT_DECIMALS)
            .await
            .expect("evaluation failed");
        assert!(!report.success);
        assert_eq!(report.results.len(), 1);
        assert_eq!(
            report.results[0].error.as_deref(),
            Some("function not found in ABI")
        );
        assert!(report.results[0].value.is_none());
    }

    #[tokio::test]
    async fn transport_failure_does_not_abort_other_rules() {
        let reader = MockReader::new()
            .answer("decimals()", U256::from(18u64))
            .answer("balanceOf(address)", U256::from(5u64) * U256::exp10(18))
            .fail("totalSupply()", "execution reverted");
        let rules = vec![
            balance_rule(Operator::GreaterThanEqual, 1.0),
            Rule {
                function_name: "totalSupply".to_string(),
                operator: Operator::GreaterThan,
                value: 0.0,
                display_name: "Total Supply".to_string(),
            },
        ];

        let report = evaluate_eligibility(&reader, &token(), HOLDER, &rules, DEFAULT_DECIMALS)
            .await
            .expect("evaluation failed");
        assert!(!report.success);
        assert_eq!(report.results.len(), 2);
        assert!(report.results[0].success);
        let error = report.results[1].error.as_deref().expect("missing error");
        assert!(error.contains("execution reverted"));
    }

    #[tokio::test]
    async fn decimals_fallback_is_silent() {
        // No decimals() answer configured: discovery fails, precision
        // defaults to 18 and the rule still evaluates.
        let reader = MockReader::new()
            .answer("balanceOf(address)", U256::from(3u64) * U256::exp10(18));
        let rules = vec![balance_rule(Operator::Equal, 3.0)];

        let report = evaluate_eligibility(&reader, &token(), HOLDER, &rules, DEFAULT_DECIMALS)
            .await
            .expect("evaluation failed");
        assert!(report.success);
        assert_eq!(report.decimals, 18);
    }

    #[tokio::test]
    async fn discovered_decimals_drive_scaling() {
        let reader = MockReader::new()
            .answer("decimals()", U256::from(6u64))
            .answer("balanceOf(address)", U256::from(5_000_000u64));
        let rules = vec![balance_rule(Operator::Equal, 5.0)];

        let report = evaluate_eligibility(&reader, &token(), HOLDER, &rules, DEFAULT_DECIMALS)
            .await
            .expect("evaluation failed");
        assert!(report.success);
        assert_eq!(report.decimals, 6);
        assert_eq!(report.results[0].value, Some(5.0));
    }

    #[tokio::test]
    async fn uint8_outputs_are_not_scaled() {
        let reader = MockReader::new()
            .answer("decimals()", U256::from(18u64))
            .answer("tier(address)", U256::from(7u64));
        let rules = vec![Rule {
            function_name: "tier".to_string(),
            operator: Operator::GreaterThanEqual,
            value: 5.0,
            display_name: "Tier".to_string(),
        }];

        let report = evaluate_eligibility(&reader, &token(), HOLDER, &rules, DEFAULT_DECIMALS)
            .await
            .expect("evaluation failed");
        assert!(report.success);
        assert_eq!(report.results[0].value, Some(7.0));
    }

    #[tokio::test]
    async fn invalid_address_is_fatal() {
        let reader = MockReader::new();
        let result =
            evaluate_eligibility(&reader, &token(), "0xnope", &[], DEFAULT_DECIMALS).await;
        assert!(matches!(result, Err(EvalError::InvalidAddress(_))));
    }

    #[tokio::test]
    async fn malformed_abi_is_fatal() {
        let mut bad = token();
        bad.abi = "{\"not\": \"an array\"}".to_string();
        let reader = MockReader::new();
        let result = evaluate_eligibility(&reader, &bad, HOLDER, &[], DEFAULT_DECIMALS).await;
        assert!(matches!(result, Err(EvalError::InvalidAbi(_))));
    }

    #[tokio::test]
    async fn empty_rule_set_is_trivially_successful() {
        let reader = MockReader::new().answer("decimals()", U256::from(18u64));
        let report = evaluate_eligibility(&reader, &token(), HOLDER, &[], DEFAULT_DECIMALS)
            .await
            .expect("evaluation failed");
        assert!(report.success);
        assert!(report.results.is_empty());
    }
}
