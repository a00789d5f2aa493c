//! Address parsing and display helpers.

use alloy_primitives::Address;
use std::str::FromStr;

/// Parses a hex address, accepting any letter case.
pub fn parse_address(value: &str) -> Result<Address, String> {
	Address::from_str(value.trim()).map_err(|e| format!("Invalid address '{value}': {e}"))
}

pub fn is_zero_address(address: &Address) -> bool {
	address.is_zero()
}

/// Abbreviated form used in status lines, e.g. `0x7099...79C8`.
pub fn short_address(address: &Address) -> String {
	let full = address.to_checksum(None);
	format!("{}...{}", &full[..6], &full[full.len() - 4..])
}

#[cfg(test)]
mod tests {
	use super::*;

	#[test]
	fn test_parse_address_is_case_insensitive() {
		let lower = parse_address("0x70997970c51812dc3a010c7d01b50e0d17dc79c8").unwrap();
		let mixed = parse_address("0x70997970C51812dc3A010C7d01b50e0d17dc79C8").unwrap();
		assert_eq!(lower, mixed);
		assert!(parse_address("0x1234").is_err());
	}

	#[test]
	fn test_short_address() {
		let address = parse_address("0x70997970C51812dc3A010C7d01b50e0d17dc79C8").unwrap();
		assert_eq!(short_address(&address), "0x7099...79C8");
	}

	#[test]
	fn test_zero_address() {
		assert!(is_zero_address(&Address::ZERO));
	}
}
