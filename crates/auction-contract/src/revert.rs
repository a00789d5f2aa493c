//! Turning provider and contract failures into one user-facing message.
//!
//! Wallets and nodes report the same failure in several shapes: a nested
//! provider error, a decoded revert reason, a message inside the error data
//! or only a flat string. [`ProviderFailure`] holds whichever of those parts
//! were present and [`normalize_error`] picks one by fixed precedence.

use alloy_sol_types::{Revert, SolError};
use alloy_transport::TransportError;
use auction_wallet::USER_REJECTED_CODE;
use std::fmt;

pub const INSUFFICIENT_FUNDS_MESSAGE: &str =
	"Insufficient funds in your wallet to complete this transaction.";
pub const REJECTED_MESSAGE: &str = "Transaction was rejected in your wallet.";
pub const FALLBACK_MESSAGE: &str = "Transaction failed.";

const EXECUTION_REVERTED: &str = "execution reverted";

/// The parts of a failed call, as far as the provider reported them.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ProviderFailure {
	/// Message of the error nested inside the provider's answer.
	pub provider_message: Option<String>,
	/// Decoded `Error(string)` revert reason.
	pub reason: Option<String>,
	/// `message` field of the error data.
	pub data_message: Option<String>,
	/// The complete error text.
	pub message: Option<String>,
}

impl ProviderFailure {
	/// A failure known only by its text.
	pub fn from_message(message: impl Into<String>) -> Self {
		Self {
			message: Some(message.into()),
			..Self::default()
		}
	}

	/// Splits an RPC error into its parts.
	///
	/// A JSON-RPC error whose data is an `Error(string)` revert yields the
	/// reason. The top-level error message is the raw message, so known
	/// patterns in it are still recognized. Only an error nested inside the
	/// data (`originalError` or `error`) yields a provider message, and the
	/// data's own `message` yields the data message. Code 4001 is a wallet
	/// rejection regardless of its wording.
	pub fn from_transport(err: &TransportError) -> Self {
		let Some(payload) = err.as_error_resp() else {
			return Self::from_message(err.to_string());
		};

		if payload.code == USER_REJECTED_CODE {
			return Self {
				provider_message: Some(REJECTED_MESSAGE.to_string()),
				..Self::from_message(payload.message.to_string())
			};
		}

		let mut failure = Self::from_message(payload.message.to_string());
		failure.reason = payload
			.as_revert_data()
			.and_then(|data| Revert::abi_decode(&data).ok())
			.map(|revert| revert.reason);

		let data = payload
			.data
			.as_ref()
			.and_then(|data| serde_json::from_str::<serde_json::Value>(data.get()).ok());
		if let Some(data) = data.as_ref().filter(|data| data.is_object()) {
			failure.provider_message = ["originalError", "error"]
				.iter()
				.find_map(|key| data.get(key)?.get("message")?.as_str())
				.map(str::to_string);
			failure.data_message = data
				.get("message")
				.and_then(serde_json::Value::as_str)
				.map(str::to_string);
		}

		failure
	}
}

impl fmt::Display for ProviderFailure {
	fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
		f.write_str(self.message.as_deref().unwrap_or(FALLBACK_MESSAGE))
	}
}

/// Picks the message to show for a failed call.
///
/// Precedence: provider message, revert reason, data message, then known
/// patterns in the raw text, then the raw text itself. Total: every input,
/// including an empty one, yields a message.
pub fn normalize_error(failure: &ProviderFailure) -> String {
	let present = |field: &Option<String>| {
		field
			.as_deref()
			.map(str::trim)
			.filter(|value| !value.is_empty())
			.map(str::to_string)
	};

	if let Some(message) = present(&failure.provider_message) {
		return message;
	}
	if let Some(reason) = present(&failure.reason) {
		return reason;
	}
	if let Some(message) = present(&failure.data_message) {
		return message;
	}

	match present(&failure.message) {
		Some(raw) => match_raw_message(&raw).unwrap_or(raw),
		None => FALLBACK_MESSAGE.to_string(),
	}
}

fn match_raw_message(raw: &str) -> Option<String> {
	if raw.contains(EXECUTION_REVERTED) {
		return quoted_reason(raw).or_else(|| {
			raw.split("execution reverted:")
				.nth(1)
				.map(str::trim)
				.filter(|reason| !reason.is_empty())
				.map(str::to_string)
		});
	}

	let lower = raw.to_lowercase();
	if lower.contains("insufficient funds") {
		return Some(INSUFFICIENT_FUNDS_MESSAGE.to_string());
	}
	if lower.contains("user rejected transaction") || lower.contains("user denied") {
		return Some(REJECTED_MESSAGE.to_string());
	}
	None
}

/// Extracts `...` from `reason="..."`.
fn quoted_reason(raw: &str) -> Option<String> {
	let start = raw.find("reason=\"")? + "reason=\"".len();
	let rest = &raw[start..];
	let end = rest.find('"')?;
	let reason = &rest[..end];
	(!reason.is_empty()).then(|| reason.to_string())
}
