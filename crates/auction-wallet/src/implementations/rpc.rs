//! JSON-RPC wallet provider.
//!
//! Talks to a wallet that exposes the EIP-1193 methods over HTTP: a desktop
//! wallet with an RPC port or a development node with managed accounts.
//! Transactions are sent with `eth_sendTransaction` and signed on the wallet
//! side. HTTP has no push channel, so account and chain changes are detected
//! by polling.

use crate::{retrying_client, SignerHandle, WalletError, WalletEvent, WalletInterface, WalletSettings};
use alloy_primitives::Address;
use alloy_provider::{DynProvider, Provider, ProviderBuilder};
use async_trait::async_trait;
use auction_types::WalletCapabilities;
use std::sync::Mutex;
use std::time::Duration;
use tokio::sync::broadcast;
use tokio::task::JoinHandle;
use tokio::time::MissedTickBehavior;

const EVENT_CHANNEL_CAPACITY: usize = 16;

/// Wallet reached through a JSON-RPC endpoint.
pub struct RpcWallet {
	provider: DynProvider,
	poll_interval: Duration,
	events: broadcast::Sender<WalletEvent>,
	/// Change poller, started by the first subscription.
	poller: Mutex<Option<JoinHandle<()>>>,
}

impl RpcWallet {
	/// Creates a wallet for `rpc_url`. No request is sent until first use.
	pub fn new(rpc_url: &str, poll_interval: Duration) -> Result<Self, WalletError> {
		if poll_interval.is_zero() {
			return Err(WalletError::Configuration(
				"poll interval must be greater than zero".to_string(),
			));
		}

		let client = retrying_client(rpc_url)?;
		let provider = ProviderBuilder::new().connect_client(client).erased();
		let (events, _) = broadcast::channel(EVENT_CHANNEL_CAPACITY);

		Ok(Self {
			provider,
			poll_interval,
			events,
			poller: Mutex::new(None),
		})
	}

	fn ensure_poller(&self) {
		let mut poller = self.poller.lock().unwrap_or_else(|e| e.into_inner());
		if poller.as_ref().is_some_and(|handle| !handle.is_finished()) {
			return;
		}

		*poller = Some(tokio::spawn(poll_changes(
			self.provider.clone(),
			self.events.clone(),
			self.poll_interval,
		)));
	}
}

impl Drop for RpcWallet {
	fn drop(&mut self) {
		if let Some(handle) = self.poller.get_mut().ok().and_then(Option::take) {
			handle.abort();
		}
	}
}

/// Polls accounts and chain id, emitting an event whenever either changes.
///
/// Stops once nobody is subscribed anymore.
async fn poll_changes(
	provider: DynProvider,
	events: broadcast::Sender<WalletEvent>,
	interval: Duration,
) {
	let mut last_accounts = provider.get_accounts().await.ok();
	let mut last_chain = provider.get_chain_id().await.ok();

	let mut ticker = tokio::time::interval(interval);
	ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);
	// The first tick completes immediately
	ticker.tick().await;

	loop {
		ticker.tick().await;
		if events.receiver_count() == 0 {
			tracing::debug!("No wallet subscribers left, stopping change poller");
			break;
		}

		match provider.get_accounts().await {
			Ok(accounts) => {
				if last_accounts.as_ref() != Some(&accounts) {
					if last_accounts.is_some() {
						tracing::debug!(count = accounts.len(), "Wallet accounts changed");
						let _ = events.send(WalletEvent::AccountsChanged(accounts.clone()));
					}
					last_accounts = Some(accounts);
				}
			},
			Err(e) => tracing::debug!(error = %e, "Failed to poll wallet accounts"),
		}

		match provider.get_chain_id().await {
			Ok(chain_id) => {
				if last_chain != Some(chain_id) {
					if last_chain.is_some() {
						tracing::debug!(chain_id, "Wallet chain changed");
						let _ = events.send(WalletEvent::ChainChanged(chain_id));
					}
					last_chain = Some(chain_id);
				}
			},
			Err(e) => tracing::debug!(error = %e, "Failed to poll wallet chain id"),
		}
	}
}

#[async_trait]
impl WalletInterface for RpcWallet {
	async fn capabilities(&self) -> WalletCapabilities {
		match self.provider.get_client_version().await {
			Ok(version) => {
				tracing::debug!(client_version = %version, "Wallet provider detected");
				WalletCapabilities::from_client_version(&version)
			},
			Err(e) => {
				tracing::debug!(error = %e, "Wallet provider did not answer");
				WalletCapabilities::unavailable()
			},
		}
	}

	async fn request_accounts(&self) -> Result<Vec<Address>, WalletError> {
		let accounts: Vec<Address> = self
			.provider
			.client()
			.request_noparams("eth_requestAccounts")
			.await?;
		Ok(accounts)
	}

	async fn accounts(&self) -> Result<Vec<Address>, WalletError> {
		Ok(self.provider.get_accounts().await?)
	}

	async fn chain_id(&self) -> Result<u64, WalletError> {
		Ok(self.provider.get_chain_id().await?)
	}

	fn provider(&self) -> DynProvider {
		self.provider.clone()
	}

	async fn signer(&self, account: Address) -> Result<SignerHandle, WalletError> {
		let accounts = self.accounts().await?;
		if !accounts.contains(&account) {
			return Err(WalletError::Signer(format!(
				"account {account} is not managed by the wallet"
			)));
		}

		// The wallet signs eth_sendTransaction requests carrying this `from`
		Ok(SignerHandle {
			address: account,
			provider: self.provider.clone(),
		})
	}

	fn subscribe(&self) -> broadcast::Receiver<WalletEvent> {
		let receiver = self.events.subscribe();
		self.ensure_poller();
		receiver
	}
}

/// Factory function to create an RPC wallet from settings.
pub fn create_wallet(settings: &WalletSettings) -> Result<Box<dyn WalletInterface>, WalletError> {
	Ok(Box::new(RpcWallet::new(
		&settings.rpc_url,
		settings.poll_interval,
	)?))
}

/// Registry for the RPC wallet implementation.
pub struct Registry;

impl auction_types::ImplementationRegistry for Registry {
	const NAME: &'static str = "rpc";
	type Factory = crate::WalletFactory;

	fn factory() -> Self::Factory {
		create_wallet
	}
}

#[cfg(test)]
mod tests {
	use super::*;
	use alloy_primitives::{address, U64};
	use alloy_transport::mock::Asserter;

	const ALICE: Address = address!("0x70997970C51812dc3A010C7d01b50e0d17dc79C8");
	const BOB: Address = address!("0x3C44CdDdB6a900fa2b585dd299e03d12FA4293BC");

	fn answer(asserter: &Asserter, accounts: &[Address], chain_id: u64) {
		asserter.push_success(&accounts.to_vec());
		asserter.push_success(&U64::from(chain_id));
	}

	#[tokio::test]
	async fn test_poller_emits_only_changes() {
		let asserter = Asserter::new();
		let provider = ProviderBuilder::new()
			.connect_mocked_client(asserter.clone())
			.erased();

		// Initial state, then one unchanged poll, an account switch and a chain switch
		answer(&asserter, &[ALICE], 1);
		answer(&asserter, &[ALICE], 1);
		answer(&asserter, &[BOB], 1);
		answer(&asserter, &[BOB], 5);

		let (events, mut receiver) = broadcast::channel(EVENT_CHANNEL_CAPACITY);
		let poller = tokio::spawn(poll_changes(provider, events, Duration::from_millis(10)));

		let wait = Duration::from_secs(2);
		let first = tokio::time::timeout(wait, receiver.recv()).await.unwrap().unwrap();
		assert_eq!(first, WalletEvent::AccountsChanged(vec![BOB]));

		let second = tokio::time::timeout(wait, receiver.recv()).await.unwrap().unwrap();
		assert_eq!(second, WalletEvent::ChainChanged(5));

		// Failed polls after the script runs out change nothing
		assert!(tokio::time::timeout(Duration::from_millis(50), receiver.recv())
			.await
			.is_err());

		drop(receiver);
		tokio::time::timeout(wait, poller)
			.await
			.expect("poller keeps running without subscribers")
			.unwrap();
	}

	#[test]
	fn test_rejects_invalid_settings() {
		assert!(matches!(
			RpcWallet::new("not a url", Duration::from_secs(1)),
			Err(WalletError::Configuration(_))
		));
		assert!(matches!(
			RpcWallet::new("http://localhost:8545", Duration::ZERO),
			Err(WalletError::Configuration(_))
		));
	}

	#[tokio::test]
	async fn test_subscription_starts_single_poller() {
		let wallet = RpcWallet::new("http://127.0.0.1:9", Duration::from_secs(3600)).unwrap();
		let _first = wallet.subscribe();
		let _second = wallet.subscribe();
		assert_eq!(wallet.events.receiver_count(), 2);
		assert!(wallet.poller.lock().unwrap().is_some());
	}
}
