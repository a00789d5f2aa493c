//! Wallet kinds and capability probing.
//!
//! The provider is probed once and the result is folded into a
//! [`WalletKind`]; everything downstream branches on the tag instead of
//! probing the provider again.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// Result of probing a wallet provider.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct WalletCapabilities {
	/// A provider answered at all.
	pub available: bool,
	pub is_brave: bool,
	pub is_metamask: bool,
}

impl WalletCapabilities {
	pub fn unavailable() -> Self {
		Self::default()
	}

	/// Derives the capability flags from a client identification string
	/// such as the answer to `web3_clientVersion`.
	pub fn from_client_version(version: &str) -> Self {
		let lower = version.to_ascii_lowercase();
		Self {
			available: true,
			is_brave: lower.contains("brave"),
			is_metamask: lower.contains("metamask"),
		}
	}
}

/// Wallet flavour, persisted next to the connected account.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum WalletKind {
	Brave,
	MetaMask,
	Other,
}

impl WalletKind {
	/// Brave reports itself as MetaMask-compatible too, so it is checked first.
	pub fn detect(capabilities: &WalletCapabilities) -> Option<Self> {
		if !capabilities.available {
			None
		} else if capabilities.is_brave {
			Some(WalletKind::Brave)
		} else if capabilities.is_metamask {
			Some(WalletKind::MetaMask)
		} else {
			Some(WalletKind::Other)
		}
	}

	pub fn as_str(&self) -> &'static str {
		match self {
			WalletKind::Brave => "brave",
			WalletKind::MetaMask => "metamask",
			WalletKind::Other => "other",
		}
	}
}

impl fmt::Display for WalletKind {
	fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
		f.write_str(self.as_str())
	}
}

impl FromStr for WalletKind {
	type Err = String;

	fn from_str(s: &str) -> Result<Self, Self::Err> {
		match s {
			"brave" => Ok(WalletKind::Brave),
			"metamask" => Ok(WalletKind::MetaMask),
			"other" => Ok(WalletKind::Other),
			other => Err(format!("Unknown wallet kind: {other}")),
		}
	}
}

#[cfg(test)]
mod tests {
	use super::*;

	#[test]
	fn test_detect_prefers_brave() {
		let caps = WalletCapabilities {
			available: true,
			is_brave: true,
			is_metamask: true,
		};
		assert_eq!(WalletKind::detect(&caps), Some(WalletKind::Brave));
	}

	#[test]
	fn test_detect_unavailable() {
		assert_eq!(WalletKind::detect(&WalletCapabilities::unavailable()), None);
	}

	#[test]
	fn test_from_client_version() {
		let caps = WalletCapabilities::from_client_version("MetaMask/v11.16.0");
		assert_eq!(WalletKind::detect(&caps), Some(WalletKind::MetaMask));

		let caps = WalletCapabilities::from_client_version("anvil/v1.0.0");
		assert_eq!(WalletKind::detect(&caps), Some(WalletKind::Other));
	}

	#[test]
	fn test_round_trip_through_str() {
		for kind in [WalletKind::Brave, WalletKind::MetaMask, WalletKind::Other] {
			assert_eq!(kind.as_str().parse::<WalletKind>().unwrap(), kind);
		}
		assert!("phantom".parse::<WalletKind>().is_err());
	}
}
