use crate::abi::{parse_abi, AbiEntry};

/// Output types a rule can compare against. Anything outside this set (strings,
/// bytes, bools, tuples) cannot be thresholded and is excluded.
pub const INTEGER_OUTPUT_TYPES: [&str; 14] = [
    "uint256", "uint128", "uint64", "uint32", "uint16", "uint8", //
    "int256", "int128", "int64", "int32", "int16", "int8", //
    "uint", "int",
];

pub fn is_integer_output(kind: &str) -> bool {
    INTEGER_OUTPUT_TYPES.contains(&kind)
}

/// Extract the ABI entries usable as eligibility rules, in ABI order.
///
/// An entry qualifies when it is a view/pure function whose first output is a
/// fixed-width integer and whose inputs are either empty or a single address
/// (a per-holder lookup such as `balanceOf`). A malformed ABI yields an empty
/// set rather than an error: rule derivation is fail-soft so callers can still
/// present the token.
pub fn rule_candidates(raw_abi: &str) -> Vec<AbiEntry> {
    let Ok(entries) = parse_abi(raw_abi) else {
        return Vec::new();
    };
    entries
        .into_iter()
        .filter(|entry| is_rule_candidate(entry))
        .collect()
}

pub fn is_rule_candidate(entry: &AbiEntry) -> bool {
    if !entry.is_read_only_function() {
        return false;
    }
    let Some(output) = entry.output_type() else {
        return false;
    };
    if !is_integer_output(output) {
        return false;
    }
    match entry.inputs.as_slice() {
        [] => true,
        [only] => only.kind == "address",
        _ => false,
    }
}
