use crate::abi::filter::rule_candidates;
use crate::rules::{Operator, Rule};

/// Build the default rule set for a token's ABI: one rule per eligible
/// interface entry, thresholded at `>= 0` so every rule starts satisfiable.
/// Deterministic for a fixed ABI, so re-selecting the same token is a no-op.
pub fn default_rules(raw_abi: &str) -> Vec<Rule> {
    rule_candidates(raw_abi)
        .into_iter()
        .map(|entry| Rule {
            display_name: display_label(&entry.name),
            function_name: entry.name,
            operator: Operator::GreaterThanEqual,
            value: 0.0,
        })
        .collect()
}

/// Human-readable label for a camelCase function name: a space before each
/// internal capital, first letter capitalized ("totalSupply" -> "Total Supply").
pub fn display_label(function_name: &str) -> String {
    let mut label = String::with_capacity(function_name.len() + 4);
    for (i, c) in function_name.chars().enumerate() {
        if c.is_ascii_uppercase() && i > 0 {
            label.push(' ');
        }
        if i == 0 {
            label.extend(c.to_uppercase());
        } else {
            label.push(c);
        }
    }
    label.trim().to_string()
}
