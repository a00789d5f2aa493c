//! Uniform outcome of a state-changing contract call.
//!
//! Every write operation returns a [`CallResult`] instead of signalling
//! expected failures through errors, so callers branch on `success`.

use alloy_primitives::B256;
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CallResult {
	pub success: bool,
	pub message: String,
	/// Hash of the submitted transaction, when one was sent.
	#[serde(default, skip_serializing_if = "Option::is_none")]
	pub tx_hash: Option<B256>,
}

impl CallResult {
	pub fn success(message: impl Into<String>) -> Self {
		Self {
			success: true,
			message: message.into(),
			tx_hash: None,
		}
	}

	pub fn failure(message: impl Into<String>) -> Self {
		Self {
			success: false,
			message: message.into(),
			tx_hash: None,
		}
	}

	/// Attaches the transaction hash.
	pub fn with_tx_hash(mut self, hash: B256) -> Self {
		self.tx_hash = Some(hash);
		self
	}
}
