use std::str::FromStr;

use crate::rules::Operator;

/// Apply a comparison operator between a normalized on-chain value and a rule
/// threshold. Equality and inequality are exact floating-point comparisons,
/// no epsilon.
pub fn satisfies(value: f64, threshold: f64, operator: Operator) -> bool {
    match operator {
        Operator::GreaterThanEqual => value >= threshold,
        Operator::LessThanEqual => value <= threshold,
        Operator::GreaterThan => value > threshold,
        Operator::LessThan => value < threshold,
        Operator::Equal => value == threshold,
        Operator::NotEqual => value != threshold,
    }
}

/// String-operator variant for callers holding raw wire input. Unrecognized
/// operators evaluate to false rather than erroring: fail-closed, an unknown
/// comparison never grants eligibility.
pub fn satisfies_str(value: f64, threshold: f64, operator: &str) -> bool {
    match Operator::from_str(operator) {
        Ok(op) => satisfies(value, threshold, op),
        Err(_) => false,
    }
}
