//! Wallet session management for the auction client.
//!
//! A wallet provider is anything that can list authorized accounts, report
//! the chain it is on and hand out a transaction-signing handle for one of
//! those accounts. [`WalletSession`] binds the client to exactly one such
//! account and keeps that binding consistent across account switches,
//! network switches and process restarts.

use alloy_primitives::Address;
use alloy_provider::DynProvider;
use alloy_rpc_client::RpcClient;
use alloy_transport::layers::RetryBackoffLayer;
use alloy_transport::TransportError;
use async_trait::async_trait;
use auction_storage::StorageError;
use auction_types::{SecretString, WalletCapabilities};
use std::fmt;
use std::time::Duration;
use thiserror::Error;
use tokio::sync::broadcast;

/// Session state and the adapter that owns it.
pub mod session;

pub use session::{Session, WalletSession, ACCOUNT_KEY, WALLET_TYPE_KEY};

/// Re-export implementations
pub mod implementations {
	pub mod local;
	pub mod rpc;
}

/// JSON-RPC error code wallets use when the user declines a request.
pub const USER_REJECTED_CODE: i64 = 4001;

/// Errors that can occur while talking to a wallet provider.
#[derive(Debug, Error)]
pub enum WalletError {
	/// The user declined the request in the wallet.
	#[error("Request rejected: {0}")]
	Rejected(String),
	/// The wallet returned an empty account list.
	#[error("No accounts returned by the wallet")]
	NoAccounts,
	/// A signing handle could not be obtained for the account.
	#[error("Signer unavailable: {0}")]
	Signer(String),
	/// Transport or RPC failure.
	#[error("Network error: {0}")]
	Network(String),
	/// Invalid wallet settings.
	#[error("Configuration error: {0}")]
	Configuration(String),
	/// Failure of the persisted session storage.
	#[error(transparent)]
	Storage(#[from] StorageError),
}

impl From<TransportError> for WalletError {
	fn from(err: TransportError) -> Self {
		match err.as_error_resp() {
			Some(payload) if payload.code == USER_REJECTED_CODE => {
				WalletError::Rejected(payload.message.to_string())
			},
			_ => WalletError::Network(err.to_string()),
		}
	}
}

/// Change notifications pushed by a wallet provider.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum WalletEvent {
	/// The set of authorized accounts changed; empty means all were revoked.
	AccountsChanged(Vec<Address>),
	/// The wallet switched to another chain.
	ChainChanged(u64),
}

/// Handle able to submit transactions from one account.
#[derive(Clone)]
pub struct SignerHandle {
	pub address: Address,
	/// Provider whose `send_transaction` is signed for `address`.
	pub provider: DynProvider,
}

impl fmt::Debug for SignerHandle {
	fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
		f.debug_struct("SignerHandle")
			.field("address", &self.address)
			.finish_non_exhaustive()
	}
}

/// Trait defining the interface for wallet providers.
///
/// This is the Rust counterpart of an EIP-1193 provider: the session adapter
/// only ever talks to the wallet through these methods.
#[async_trait]
#[cfg_attr(feature = "testing", mockall::automock)]
pub trait WalletInterface: Send + Sync {
	/// Probes what kind of wallet is on the other end.
	///
	/// Never fails: an unreachable provider is reported as unavailable.
	async fn capabilities(&self) -> WalletCapabilities;

	/// Asks the wallet for account access, prompting the user if needed.
	async fn request_accounts(&self) -> Result<Vec<Address>, WalletError>;

	/// Returns the accounts already authorized, without prompting.
	async fn accounts(&self) -> Result<Vec<Address>, WalletError>;

	/// Returns the id of the chain the wallet is connected to.
	async fn chain_id(&self) -> Result<u64, WalletError>;

	/// Returns a read-only provider handle.
	fn provider(&self) -> DynProvider;

	/// Returns a handle that signs transactions for `account`.
	async fn signer(&self, account: Address) -> Result<SignerHandle, WalletError>;

	/// Subscribes to account and chain change notifications.
	fn subscribe(&self) -> broadcast::Receiver<WalletEvent>;
}

/// Settings shared by all wallet implementations.
#[derive(Debug, Clone)]
pub struct WalletSettings {
	/// HTTP endpoint of the wallet or node.
	pub rpc_url: String,
	/// Key for the in-process wallet; ignored by the `rpc` implementation.
	pub private_key: Option<SecretString>,
	/// How often the `rpc` implementation polls for account/chain changes.
	pub poll_interval: Duration,
}

/// Type alias for wallet factory functions.
pub type WalletFactory = fn(&WalletSettings) -> Result<Box<dyn WalletInterface>, WalletError>;

/// Get all registered wallet implementations.
///
/// Returns a vector of (name, factory) tuples for all available wallet implementations.
pub fn get_all_implementations() -> Vec<(&'static str, WalletFactory)> {
	use auction_types::ImplementationRegistry;
	use implementations::{local, rpc};

	vec![
		(rpc::Registry::NAME, rpc::Registry::factory()),
		(local::Registry::NAME, local::Registry::factory()),
	]
}

/// Builds the wallet implementation registered under `name`.
pub fn create_wallet(
	name: &str,
	settings: &WalletSettings,
) -> Result<Box<dyn WalletInterface>, WalletError> {
	let factory = get_all_implementations()
		.into_iter()
		.find(|(registered, _)| *registered == name)
		.map(|(_, factory)| factory)
		.ok_or_else(|| {
			WalletError::Configuration(format!("Unknown wallet implementation: {name}"))
		})?;

	tracing::debug!(implementation = name, rpc_url = %settings.rpc_url, "Creating wallet provider");
	factory(settings)
}

/// Creates an RPC client with retry capabilities for `rpc_url`.
pub(crate) fn retrying_client(rpc_url: &str) -> Result<RpcClient, WalletError> {
	let url = rpc_url
		.parse()
		.map_err(|e| WalletError::Configuration(format!("Invalid RPC URL {rpc_url}: {e}")))?;

	// Retry network errors and rate limits
	let retry_layer = RetryBackoffLayer::new(
		5,    // max_retry: retry up to 5 times
		1000, // backoff: initial backoff in milliseconds
		10,   // cups: compute units per second
	);

	Ok(RpcClient::builder().layer(retry_layer).http(url))
}
