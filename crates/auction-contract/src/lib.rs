//! Contract call adapter for the auction smart contract.
//!
//! Reads go straight to the chain through a read-only provider. Writes need
//! the signer of a connected [`auction_wallet::Session`], are validated
//! locally first and always come back as a [`auction_types::CallResult`].
//! Expected failures never escape as errors; only read operations surface
//! transport problems to the caller.

use alloy_primitives::{Address, B256, U256};
use async_trait::async_trait;
use auction_types::AuctionRecord;
use auction_wallet::SignerHandle;
use thiserror::Error;

pub mod bindings;
pub mod client;
pub mod revert;
pub mod validation;

/// Re-export implementations
pub mod implementations {
	pub mod evm {
		pub mod alloy;
	}
}

pub use client::{AuctionClient, ClientSettings};
pub use revert::{normalize_error, ProviderFailure};
pub use validation::PreflightError;

/// Errors that can occur while talking to the contract.
#[derive(Debug, Error)]
pub enum ContractError {
	/// Transport failure, or an RPC error on a read.
	#[error("Network error: {0}")]
	Network(String),
	/// The contract answered with data that does not match the ABI.
	#[error("Decode error: {0}")]
	Decode(String),
	/// The wallet, node or contract refused a transaction.
	#[error("{0}")]
	Rejected(ProviderFailure),
	/// No receipt arrived within the confirmation timeout.
	#[error("Timed out waiting for confirmation of {0}")]
	Timeout(B256),
}

impl ContractError {
	/// The failure in the shape expected by [`normalize_error`].
	pub fn to_failure(&self) -> ProviderFailure {
		match self {
			ContractError::Rejected(failure) => failure.clone(),
			other => ProviderFailure::from_message(other.to_string()),
		}
	}
}

/// Outcome of a mined transaction.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TxOutcome {
	pub hash: B256,
	/// Receipt status.
	pub success: bool,
	/// Address of the created contract, for deployments.
	pub contract_address: Option<Address>,
}

/// Trait defining the interface to the deployed auction contract.
///
/// Mirrors the contract ABI one method per function, plus the latest block
/// timestamp used as the reference time for expiry checks. Write methods
/// submit through the given signer and wait for the receipt.
#[async_trait]
#[cfg_attr(any(test, feature = "testing"), mockall::automock)]
pub trait AuctionBackend: Send + Sync {
	/// Number of auctions ever created; ids run from 0 to this value.
	async fn auction_counter(&self) -> Result<u64, ContractError>;

	/// Raw state of one auction. Unknown ids come back zeroed.
	async fn get_auction(&self, id: u64) -> Result<AuctionRecord, ContractError>;

	/// Ids of the auctions `account` has bid on.
	async fn get_user_bids(&self, account: Address) -> Result<Vec<u64>, ContractError>;

	/// Wei waiting to be withdrawn by `account`.
	async fn get_pending_return(&self, account: Address) -> Result<U256, ContractError>;

	async fn owner(&self) -> Result<Address, ContractError>;

	/// Whether the contract's emergency stop is engaged.
	async fn stopped(&self) -> Result<bool, ContractError>;

	/// Timestamp of the latest block, in seconds.
	async fn latest_timestamp(&self) -> Result<u64, ContractError>;

	async fn create_auction(
		&self,
		signer: &SignerHandle,
		name: &str,
		starting_price: U256,
		description: &str,
		duration: u64,
	) -> Result<TxOutcome, ContractError>;

	async fn place_bid(
		&self,
		signer: &SignerHandle,
		id: u64,
		value: U256,
		gas_limit: u64,
	) -> Result<TxOutcome, ContractError>;

	async fn end_auction(&self, signer: &SignerHandle, id: u64) -> Result<TxOutcome, ContractError>;

	async fn withdraw(&self, signer: &SignerHandle) -> Result<TxOutcome, ContractError>;
}

#[cfg(test)]
mod tests {
	use super::*;

	#[test]
	fn test_error_to_failure() {
		let failure = ContractError::Network("connection refused".into()).to_failure();
		assert_eq!(
			failure.message.as_deref(),
			Some("Network error: connection refused")
		);
		assert!(failure.provider_message.is_none());

		let rejected = ProviderFailure {
			reason: Some("Auction has ended".into()),
			..ProviderFailure::from_message("execution reverted")
		};
		let err = ContractError::Rejected(rejected.clone());
		assert_eq!(err.to_string(), "execution reverted");
		assert_eq!(err.to_failure(), rejected);
	}
}
