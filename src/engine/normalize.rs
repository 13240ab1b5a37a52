use primitive_types::U256;

/// Working precision when a token does not expose a readable `decimals()`.
pub const DEFAULT_DECIMALS: u32 = 18;

/// Largest decimals value that is meaningful for a 256-bit amount; anything
/// above it is treated as a bogus on-chain answer.
pub const MAX_SUPPORTED_DECIMALS: u32 = 77;

/// Convert a raw on-chain word into a comparable decimal number.
///
/// 8-bit outputs are counts or flags, never token-decimal-scaled amounts, so
/// they pass through as exact integers. Every other accepted integer type is
/// a fixed-point amount and is scaled down by 10^decimals.
pub fn normalize(raw: U256, output_type: &str, decimals: u32) -> f64 {
    let value = to_signed_f64(raw, output_type);
    match output_type {
        "uint8" | "int8" => value,
        _ => value / 10f64.powi(decimals as i32),
    }
}

/// Interpret the word as two's complement when the declared type is signed.
fn to_signed_f64(raw: U256, output_type: &str) -> f64 {
    if output_type.starts_with("int") && raw.bit(255) {
        let magnitude = (!raw).overflowing_add(U256::one()).0;
        -u256_to_f64(magnitude)
    } else {
        u256_to_f64(raw)
    }
}

pub fn u256_to_f64(value: U256) -> f64 {
    value
        .0
        .iter()
        .enumerate()
        .fold(0.0, |acc, (i, &limb)| {
            acc + (limb as f64) * 2f64.powi(64 * i as i32)
        })
}

#[cfg(test)]
mod tests {
    use super::{normalize, u256_to_f64, DEFAULT_DECIMALS};
    use primitive_types::U256;

    #[test]
    fn scales_token_amounts_by_decimals() {
        let raw = U256::from(1_500_000_000_000_000_000u64);
        assert_eq!(normalize(raw, "uint256", DEFAULT_DECIMALS), 1.5);

        // 200 whole tokens at 18 decimals.
        let raw = U256::from(200u64) * U256::exp10(18);
        assert_eq!(normalize(raw, "uint256", 18), 200.0);

        // 6-decimal stablecoin amount.
        assert_eq!(normalize(U256::from(5_000_000u64), "uint256", 6), 5.0);
    }

    #[test]
    fn eight_bit_outputs_skip_scaling() {
        assert_eq!(normalize(U256::from(7u64), "uint8", DEFAULT_DECIMALS), 7.0);
        assert_eq!(normalize(U256::from(0u64), "uint8", 6), 0.0);
    }

    #[test]
    fn signed_words_use_twos_complement() {
        // -42 sign-extended across the full word, unscaled int8.
        let neg = (!U256::from(42u64)).overflowing_add(U256::one()).0;
        assert_eq!(normalize(neg, "int8", DEFAULT_DECIMALS), -42.0);

        // -3 whole tokens as int256.
        let raw = U256::from(3u64) * U256::exp10(18);
        let neg = (!raw).overflowing_add(U256::one()).0;
        assert_eq!(normalize(neg, "int256", 18), -3.0);

        // The same bit pattern as uint256 stays positive.
        assert!(normalize(neg, "uint256", 18) > 0.0);
    }

    #[test]
    fn wide_words_convert_without_panicking() {
        let huge = U256::MAX;
        assert!(u256_to_f64(huge).is_finite());
        assert!(u256_to_f64(huge) > 1e77);
    }
}
