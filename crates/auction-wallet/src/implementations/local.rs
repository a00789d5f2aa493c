//! In-process private-key wallet.
//!
//! Holds one key and signs locally, then submits raw transactions to the
//! configured node. Meant for development and scripting. It has exactly one
//! account, so it never emits change events.

use crate::{retrying_client, SignerHandle, WalletError, WalletEvent, WalletInterface, WalletSettings};
use alloy_network::EthereumWallet;
use alloy_primitives::Address;
use alloy_provider::{DynProvider, Provider, ProviderBuilder};
use alloy_signer_local::PrivateKeySigner;
use async_trait::async_trait;
use auction_types::{SecretString, WalletCapabilities};
use tokio::sync::broadcast;

/// Wallet backed by a locally held private key.
pub struct LocalWallet {
	address: Address,
	/// Read-only provider.
	provider: DynProvider,
	/// Provider that signs with the local key.
	signing_provider: DynProvider,
	events: broadcast::Sender<WalletEvent>,
}

impl LocalWallet {
	/// Creates a wallet from a hex-encoded private key (with or without 0x prefix).
	pub fn new(rpc_url: &str, private_key: &SecretString) -> Result<Self, WalletError> {
		let signer = private_key.with_exposed(|key| {
			key.trim()
				.parse::<PrivateKeySigner>()
				.map_err(|e| WalletError::Configuration(format!("Invalid private key: {e}")))
		})?;
		let address = signer.address();

		let provider = ProviderBuilder::new()
			.connect_client(retrying_client(rpc_url)?)
			.erased();
		let signing_provider = ProviderBuilder::new()
			.wallet(EthereumWallet::from(signer))
			.connect_client(retrying_client(rpc_url)?)
			.erased();
		let (events, _) = broadcast::channel(1);

		tracing::debug!(address = %address, "Loaded local wallet");
		Ok(Self {
			address,
			provider,
			signing_provider,
			events,
		})
	}

	pub fn address(&self) -> Address {
		self.address
	}
}

#[async_trait]
impl WalletInterface for LocalWallet {
	async fn capabilities(&self) -> WalletCapabilities {
		WalletCapabilities {
			available: true,
			is_brave: false,
			is_metamask: false,
		}
	}

	async fn request_accounts(&self) -> Result<Vec<Address>, WalletError> {
		Ok(vec![self.address])
	}

	async fn accounts(&self) -> Result<Vec<Address>, WalletError> {
		Ok(vec![self.address])
	}

	async fn chain_id(&self) -> Result<u64, WalletError> {
		Ok(self.provider.get_chain_id().await?)
	}

	fn provider(&self) -> DynProvider {
		self.provider.clone()
	}

	async fn signer(&self, account: Address) -> Result<SignerHandle, WalletError> {
		if account != self.address {
			return Err(WalletError::Signer(format!(
				"local wallet holds {}, not {account}",
				self.address
			)));
		}
		Ok(SignerHandle {
			address: account,
			provider: self.signing_provider.clone(),
		})
	}

	fn subscribe(&self) -> broadcast::Receiver<WalletEvent> {
		self.events.subscribe()
	}
}

/// Factory function to create a local wallet from settings.
///
/// Requires `private_key`.
pub fn create_wallet(settings: &WalletSettings) -> Result<Box<dyn WalletInterface>, WalletError> {
	let private_key = settings
		.private_key
		.as_ref()
		.filter(|key| !key.is_empty())
		.ok_or_else(|| {
			WalletError::Configuration("local wallet requires a private_key".to_string())
		})?;

	Ok(Box::new(LocalWallet::new(&settings.rpc_url, private_key)?))
}

/// Registry for the local wallet implementation.
pub struct Registry;

impl auction_types::ImplementationRegistry for Registry {
	const NAME: &'static str = "local";
	type Factory = crate::WalletFactory;

	fn factory() -> Self::Factory {
		create_wallet
	}
}
