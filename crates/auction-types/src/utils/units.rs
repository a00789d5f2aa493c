//! Conversion between decimal ETH strings and Wei.
//!
//! Amounts are decimal ETH strings on the user side and `U256` Wei on the
//! contract side. Each adapter operation converts exactly once, through the
//! two functions in this module.

use alloy_primitives::utils::{parse_units, ParseUnits};
use alloy_primitives::U256;
use thiserror::Error;

/// Decimals of the native currency.
pub const ETHER_DECIMALS: u8 = 18;

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum UnitsError {
	#[error("Invalid amount: {0}")]
	Invalid(String),
	#[error("Amount must be positive")]
	Negative,
}

/// Parses a decimal ETH string such as `"1.25"` into Wei.
///
/// Parsing is exact: no floating point is involved, and more than 18
/// fractional digits is an error rather than a silent truncation.
pub fn parse_ether(amount: &str) -> Result<U256, UnitsError> {
	let trimmed = amount.trim();
	if trimmed.is_empty() {
		return Err(UnitsError::Invalid("amount is empty".to_string()));
	}
	if trimmed.starts_with('-') {
		return Err(UnitsError::Negative);
	}
	if let Some((_, fraction)) = trimmed.split_once('.') {
		if fraction.len() > ETHER_DECIMALS as usize {
			return Err(UnitsError::Invalid(format!(
				"{trimmed}: more than {ETHER_DECIMALS} decimal places"
			)));
		}
	}

	match parse_units(trimmed, "ether").map_err(|e| UnitsError::Invalid(format!("{trimmed}: {e}")))? {
		ParseUnits::U256(value) => Ok(value),
		ParseUnits::I256(_) => Err(UnitsError::Negative),
	}
}

/// Formats Wei as a decimal ETH string with trailing zeros trimmed.
pub fn format_ether(amount: U256) -> String {
	format_units(amount, ETHER_DECIMALS)
}

/// Formats an amount with the given decimals, keeping at least one
/// fractional digit ("1.0", "0.25").
pub fn format_units(amount: U256, decimals: u8) -> String {
	if amount.is_zero() {
		return "0.0".to_string();
	}

	let divisor = U256::from(10).pow(U256::from(decimals));
	let whole = amount / divisor;
	let fractional = amount % divisor;

	let fractional_str = format!("{:0>width$}", fractional, width = decimals as usize);
	let trimmed = fractional_str.trim_end_matches('0');

	if trimmed.is_empty() {
		format!("{}.0", whole)
	} else {
		format!("{}.{}", whole, trimmed)
	}
}

#[cfg(test)]
mod tests {
	use super::*;

	const ONE_ETHER: u128 = 1_000_000_000_000_000_000;

	#[test]
	fn test_parse_ether() {
		assert_eq!(parse_ether("1.0").unwrap(), U256::from(ONE_ETHER));
		assert_eq!(parse_ether("0.1").unwrap(), U256::from(ONE_ETHER / 10));
		assert_eq!(parse_ether("100").unwrap(), U256::from(100 * ONE_ETHER));
		assert_eq!(parse_ether(" 1.5 ").unwrap(), U256::from(3 * ONE_ETHER / 2));
		assert_eq!(parse_ether("0.000000000000000001").unwrap(), U256::from(1));
		assert_eq!(parse_ether("0").unwrap(), U256::ZERO);
	}

	#[test]
	fn test_parse_ether_errors() {
		assert_eq!(parse_ether("-1.0"), Err(UnitsError::Negative));
		assert!(matches!(parse_ether(""), Err(UnitsError::Invalid(_))));
		assert!(matches!(parse_ether("abc"), Err(UnitsError::Invalid(_))));
		assert!(matches!(
			parse_ether("0.0000000000000000001"),
			Err(UnitsError::Invalid(_))
		));
	}

	#[test]
	fn test_format_ether() {
		assert_eq!(format_ether(U256::from(ONE_ETHER)), "1.0");
		assert_eq!(format_ether(U256::from(ONE_ETHER / 10)), "0.1");
		assert_eq!(format_ether(U256::from(3 * ONE_ETHER / 2)), "1.5");
		assert_eq!(format_ether(U256::from(1)), "0.000000000000000001");
		assert_eq!(format_ether(U256::ZERO), "0.0");
	}

	#[test]
	fn test_format_units_other_decimals() {
		assert_eq!(format_units(U256::from(1_500_000u64), 6), "1.5");
		assert_eq!(format_units(U256::from(2_000_000u64), 6), "2.0");
	}
}
