//! Decimal token amounts to and from minimal on-chain units.
//!
//! Integer-only: no floating point anywhere in the pipeline.

use alloy::primitives::U256;

use crate::DiagonalError;

/// Convert a human-readable amount (e.g. `"10"`, `"9.99"`) into minimal units
/// for a token with `decimals` decimal places.
///
/// Fractional digits beyond `decimals` are rejected rather than truncated.
pub fn parse_units(amount: &str, decimals: u8) -> Result<U256, DiagonalError> {
    let invalid = |why: &str| DiagonalError::InvalidAmount(format!("'{amount}': {why}"));

    let (integer_part, fractional_part) = match amount.split_once('.') {
        Some((i, f)) => (i, f),
        None => (amount, ""),
    };

    if integer_part.is_empty() && fractional_part.is_empty() {
        return Err(invalid("no numeric content"));
    }
    if !integer_part.bytes().all(|b| b.is_ascii_digit())
        || !fractional_part.bytes().all(|b| b.is_ascii_digit())
    {
        return Err(invalid("only digits and a single '.' are allowed"));
    }
    if fractional_part.len() > usize::from(decimals) {
        return Err(invalid("more fractional digits than the token supports"));
    }

    let padding = usize::from(decimals) - fractional_part.len();
    let mut digits = String::with_capacity(integer_part.len() + usize::from(decimals));
    digits.push_str(integer_part);
    digits.push_str(fractional_part);
    digits.extend(std::iter::repeat('0').take(padding));

    let trimmed = digits.trim_start_matches('0');
    if trimmed.is_empty() {
        return Ok(U256::ZERO);
    }
    U256::from_str_radix(trimmed, 10).map_err(|_| invalid("overflows uint256"))
}

/// Render minimal units as a decimal string, trimming trailing fractional zeros.
pub fn format_units(value: U256, decimals: u8) -> String {
    let digits = value.to_string();
    let decimals = usize::from(decimals);
    if decimals == 0 {
        return digits;
    }

    let padded = if digits.len() <= decimals {
        format!("{}{}", "0".repeat(decimals - digits.len() + 1), digits)
    } else {
        digits
    };
    let (integer, fraction) = padded.split_at(padded.len() - decimals);
    let fraction = fraction.trim_end_matches('0');
    if fraction.is_empty() {
        integer.to_string()
    } else {
        format!("{integer}.{fraction}")
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_whole_amount_six_decimals() {
        assert_eq!(parse_units("10", 6).unwrap(), U256::from(10_000_000u64));
    }

    #[test]
    fn test_whole_amount_eighteen_decimals() {
        assert_eq!(
            parse_units("10", 18).unwrap(),
            U256::from(10_000_000_000_000_000_000u128)
        );
    }

    #[test]
    fn test_fractional_amount() {
        assert_eq!(parse_units("9.99", 6).unwrap(), U256::from(9_990_000u64));
        assert_eq!(parse_units(".5", 6).unwrap(), U256::from(500_000u64));
        assert_eq!(parse_units("1.", 6).unwrap(), U256::from(1_000_000u64));
        assert_eq!(parse_units("0.000001", 6).unwrap(), U256::from(1u64));
    }

    #[test]
    fn test_zero() {
        assert_eq!(parse_units("0", 18).unwrap(), U256::ZERO);
        assert_eq!(parse_units("0.000", 6).unwrap(), U256::ZERO);
    }

    #[test]
    fn test_rejects_excess_precision() {
        assert!(parse_units("0.0000001", 6).is_err());
    }

    #[test]
    fn test_rejects_garbage() {
        for bad in ["", ".", "-1", "+1", "1e6", "1.2.3", "$10", " 10", "1,000"] {
            assert!(parse_units(bad, 6).is_err(), "accepted {bad:?}");
        }
    }

    #[test]
    fn test_rejects_overflow() {
        let huge = "1".repeat(80);
        assert!(matches!(
            parse_units(&huge, 18),
            Err(DiagonalError::InvalidAmount(_))
        ));
    }

    #[test]
    fn test_format_units() {
        assert_eq!(format_units(U256::from(10_000_000u64), 6), "10");
        assert_eq!(format_units(U256::from(9_990_000u64), 6), "9.99");
        assert_eq!(format_units(U256::from(1u64), 6), "0.000001");
        assert_eq!(format_units(U256::ZERO, 18), "0");
        assert_eq!(format_units(U256::from(42u64), 0), "42");
    }
}
