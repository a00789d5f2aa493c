//! The wallet session adapter.
//!
//! [`WalletSession`] owns the single [`Session`] of the client. It is cheap to
//! clone and every clone drives the same session. Callers read the state
//! through [`WalletSession::snapshot`]; only the adapter mutates it.
//!
//! The connected account and the wallet-kind tag are persisted so that the
//! next run can reconnect without prompting the user.

use crate::{SignerHandle, WalletError, WalletEvent, WalletInterface};
use alloy_primitives::Address;
use alloy_provider::DynProvider;
use auction_storage::StorageInterface;
use auction_types::{parse_address, short_address, CallResult, WalletKind};
use futures::future::{BoxFuture, FutureExt, Shared};
use std::fmt;
use std::sync::{Arc, Mutex as StdMutex, Weak};
use tokio::sync::{broadcast, Mutex, RwLock};
use tokio::task::JoinHandle;

/// Storage key of the connected account address.
pub const ACCOUNT_KEY: &str = "connectedAccount";
/// Storage key of the wallet-kind tag.
pub const WALLET_TYPE_KEY: &str = "walletType";
/// Message returned when no wallet provider answers.
pub const NO_WALLET_MESSAGE: &str = "Please install MetaMask or use a Web3-compatible browser!";

/// Connection state of the client.
#[derive(Clone, Default)]
pub struct Session {
	pub provider: Option<DynProvider>,
	/// Present once connected, except for Brave wallets that refused one.
	pub signer: Option<SignerHandle>,
	pub account: Option<Address>,
	/// True while a connect attempt is in flight.
	pub connecting: bool,
	pub wallet_kind: Option<WalletKind>,
	pub chain_id: Option<u64>,
}

impl Session {
	pub fn is_connected(&self) -> bool {
		self.account.is_some()
	}
}

impl fmt::Debug for Session {
	fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
		f.debug_struct("Session")
			.field("provider", &self.provider.is_some())
			.field("signer", &self.signer)
			.field("account", &self.account)
			.field("connecting", &self.connecting)
			.field("wallet_kind", &self.wallet_kind)
			.field("chain_id", &self.chain_id)
			.finish()
	}
}

type ConnectAttempt = Shared<BoxFuture<'static, CallResult>>;

struct SessionInner {
	wallet: Arc<dyn WalletInterface>,
	storage: Arc<dyn StorageInterface>,
	state: RwLock<Session>,
	/// In-flight connect attempt that concurrent callers join.
	pending_connect: Mutex<Option<ConnectAttempt>>,
	/// Task forwarding wallet events to the session.
	listener: StdMutex<Option<JoinHandle<()>>>,
}

impl Drop for SessionInner {
	fn drop(&mut self) {
		if let Some(handle) = self.listener.get_mut().ok().and_then(Option::take) {
			handle.abort();
		}
	}
}

/// Binds the client to one wallet account.
#[derive(Clone)]
pub struct WalletSession {
	inner: Arc<SessionInner>,
}

impl WalletSession {
	/// Creates a disconnected session.
	pub fn new(wallet: Arc<dyn WalletInterface>, storage: Arc<dyn StorageInterface>) -> Self {
		Self {
			inner: Arc::new(SessionInner {
				wallet,
				storage,
				state: RwLock::new(Session::default()),
				pending_connect: Mutex::new(None),
				listener: StdMutex::new(None),
			}),
		}
	}

	/// Returns a copy of the current session state.
	pub async fn snapshot(&self) -> Session {
		self.inner.state.read().await.clone()
	}

	/// Returns the active account, if any.
	pub async fn account(&self) -> Option<Address> {
		self.inner.state.read().await.account
	}

	/// Read-only provider of the underlying wallet.
	///
	/// Available whether or not an account is connected.
	pub fn read_provider(&self) -> DynProvider {
		self.inner.wallet.provider()
	}

	/// Connects to the wallet, prompting the user for account access.
	///
	/// Concurrent calls share one attempt, so the user sees a single prompt.
	/// The attempt runs as its own task and finishes even if every caller
	/// stops waiting. Expected failures are reported in the returned
	/// [`CallResult`] and leave the session as it was before the call.
	pub async fn connect(&self) -> CallResult {
		let attempt = {
			let mut pending = self.inner.pending_connect.lock().await;
			match pending.as_ref() {
				Some(attempt) => {
					tracing::debug!("Joining in-flight wallet connection");
					attempt.clone()
				},
				None => {
					let task = tokio::spawn(self.clone().connect_once());
					let attempt = async move {
						task.await.unwrap_or_else(|e| {
							CallResult::failure(format!("Failed to connect wallet: {e}"))
						})
					}
					.boxed()
					.shared();
					*pending = Some(attempt.clone());
					attempt
				},
			}
		};

		attempt.await
	}

	async fn connect_once(self) -> CallResult {
		self.inner.state.write().await.connecting = true;
		let result = self.establish().await;
		self.inner.state.write().await.connecting = false;
		// Only one attempt is in flight, so the slot still holds this one
		*self.inner.pending_connect.lock().await = None;
		result
	}

	async fn establish(&self) -> CallResult {
		let capabilities = self.inner.wallet.capabilities().await;
		let Some(kind) = WalletKind::detect(&capabilities) else {
			tracing::warn!("No wallet provider detected");
			return CallResult::failure(NO_WALLET_MESSAGE);
		};

		let account = match self.inner.wallet.request_accounts().await {
			Ok(accounts) => match accounts.first() {
				Some(account) => *account,
				None => return self.connect_failed(WalletError::NoAccounts),
			},
			Err(e) => return self.connect_failed(e),
		};

		let signer = match self.acquire_signer(kind, account).await {
			Ok(signer) => signer,
			Err(e) => return self.connect_failed(e),
		};

		self.install(kind, account, signer).await;
		self.persist(kind, account).await;
		self.register_listener();

		tracing::info!(account = %account, wallet = %kind, "Wallet connected");
		CallResult::success(format!("Connected {}", short_address(&account)))
	}

	fn connect_failed(&self, error: WalletError) -> CallResult {
		tracing::warn!(error = %error, "Wallet connection failed");
		CallResult::failure(format!("Failed to connect wallet: {error}"))
	}

	/// Restores the persisted account without prompting the user.
	///
	/// Only already-authorized accounts are restored. A missing wallet, a
	/// changed wallet kind, a revoked account or any error clears both the
	/// session and the persisted state. Returns true when a session was
	/// restored.
	pub async fn reconnect_silently(&self) -> bool {
		match self.try_reconnect().await {
			Ok(restored) => restored,
			Err(e) => {
				tracing::warn!(error = %e, "Silent reconnect failed, clearing session");
				self.reset().await;
				false
			},
		}
	}

	async fn try_reconnect(&self) -> Result<bool, WalletError> {
		let Some(saved) = self.inner.storage.get(ACCOUNT_KEY).await? else {
			return Ok(false);
		};

		let saved_account = match parse_address(&saved) {
			Ok(account) => account,
			Err(e) => {
				tracing::warn!(error = %e, "Discarding unreadable saved account");
				self.reset().await;
				return Ok(false);
			},
		};

		let capabilities = self.inner.wallet.capabilities().await;
		let Some(kind) = WalletKind::detect(&capabilities) else {
			tracing::info!("No wallet provider detected, forgetting saved account");
			self.reset().await;
			return Ok(false);
		};

		if let Some(saved_kind) = self.inner.storage.get(WALLET_TYPE_KEY).await? {
			if saved_kind.parse::<WalletKind>().ok() != Some(kind) {
				tracing::info!(saved = %saved_kind, detected = %kind, "Wallet type changed, forgetting saved account");
				self.reset().await;
				return Ok(false);
			}
		}

		// Address equality is byte-wise, so checksum casing does not matter
		let accounts = self.inner.wallet.accounts().await?;
		if !accounts.contains(&saved_account) {
			tracing::info!(account = %saved_account, "Saved account is no longer authorized");
			self.reset().await;
			return Ok(false);
		}

		let signer = self.acquire_signer(kind, saved_account).await?;
		self.install(kind, saved_account, signer).await;
		self.persist(kind, saved_account).await;
		self.register_listener();

		tracing::info!(account = %saved_account, wallet = %kind, "Wallet session restored");
		Ok(true)
	}

	/// Clears the session and the persisted state and stops listening for
	/// wallet events.
	pub async fn disconnect(&self) {
		self.reset().await;
		tracing::info!("Wallet disconnected");
	}

	/// Applies a change of the wallet's authorized accounts.
	///
	/// An empty list disconnects. Otherwise the first account becomes the
	/// active one and is persisted.
	pub async fn on_accounts_changed(&self, accounts: Vec<Address>) {
		let Some(next) = accounts.first().copied() else {
			tracing::info!("Wallet revoked all accounts");
			self.disconnect().await;
			return;
		};

		let (current, kind) = {
			let state = self.inner.state.read().await;
			(state.account, state.wallet_kind)
		};
		let Some(current) = current else {
			return;
		};
		if current == next {
			return;
		}

		let kind = kind.unwrap_or(WalletKind::Other);
		match self.acquire_signer(kind, next).await {
			Ok(signer) => {
				{
					let mut state = self.inner.state.write().await;
					state.account = Some(next);
					state.signer = signer;
				}
				self.persist(kind, next).await;
				tracing::info!(from = %current, to = %next, "Active account switched");
			},
			Err(e) => {
				tracing::warn!(account = %next, error = %e, "Could not switch account");
				self.disconnect().await;
			},
		}
	}

	/// Reloads the session after the wallet switched networks.
	///
	/// Provider, signer and chain id are all re-acquired for the current
	/// account. If the account is no longer authorized the session ends.
	pub async fn on_chain_changed(&self, chain_id: u64) {
		let (account, kind) = {
			let state = self.inner.state.read().await;
			(state.account, state.wallet_kind)
		};
		let Some(account) = account else {
			return;
		};

		tracing::info!(chain_id, "Wallet network changed, reloading session");

		let authorized = match self.inner.wallet.accounts().await {
			Ok(accounts) => accounts.contains(&account),
			Err(e) => {
				tracing::warn!(error = %e, "Could not list accounts after network change");
				false
			},
		};
		if !authorized {
			self.disconnect().await;
			return;
		}

		match self
			.acquire_signer(kind.unwrap_or(WalletKind::Other), account)
			.await
		{
			Ok(signer) => {
				let provider = self.inner.wallet.provider();
				let mut state = self.inner.state.write().await;
				state.provider = Some(provider);
				state.signer = signer;
				state.chain_id = Some(chain_id);
			},
			Err(e) => {
				tracing::warn!(error = %e, "Could not reload signer after network change");
				self.disconnect().await;
			},
		}
	}

	/// Current chain id as reported by the wallet.
	///
	/// None when disconnected or when the wallet cannot be reached.
	pub async fn chain_id(&self) -> Option<u64> {
		if self.inner.state.read().await.account.is_none() {
			return None;
		}

		match self.inner.wallet.chain_id().await {
			Ok(chain_id) => {
				self.inner.state.write().await.chain_id = Some(chain_id);
				Some(chain_id)
			},
			Err(e) => {
				tracing::debug!(error = %e, "Failed to query chain id");
				None
			},
		}
	}

	/// Gets a signer for `account`.
	///
	/// Brave may refuse a signer for an account it did authorize; the session
	/// then keeps the account without one.
	async fn acquire_signer(
		&self,
		kind: WalletKind,
		account: Address,
	) -> Result<Option<SignerHandle>, WalletError> {
		match self.inner.wallet.signer(account).await {
			Ok(signer) => Ok(Some(signer)),
			Err(e) if kind == WalletKind::Brave => {
				tracing::warn!(account = %account, error = %e, "Brave wallet did not provide a signer, continuing without one");
				Ok(None)
			},
			Err(e) => Err(e),
		}
	}

	async fn install(&self, kind: WalletKind, account: Address, signer: Option<SignerHandle>) {
		let chain_id = match self.inner.wallet.chain_id().await {
			Ok(chain_id) => Some(chain_id),
			Err(e) => {
				tracing::warn!(error = %e, "Failed to query chain id");
				None
			},
		};
		let provider = self.inner.wallet.provider();

		let mut state = self.inner.state.write().await;
		state.provider = Some(provider);
		state.signer = signer;
		state.account = Some(account);
		state.wallet_kind = Some(kind);
		state.chain_id = chain_id;
	}

	async fn persist(&self, kind: WalletKind, account: Address) {
		if let Err(e) = self
			.inner
			.storage
			.set(ACCOUNT_KEY, &account.to_string())
			.await
		{
			tracing::warn!(error = %e, "Failed to persist connected account");
		}
		if let Err(e) = self.inner.storage.set(WALLET_TYPE_KEY, kind.as_str()).await {
			tracing::warn!(error = %e, "Failed to persist wallet type");
		}
	}

	async fn clear_state(&self) {
		let mut state = self.inner.state.write().await;
		let connecting = state.connecting;
		*state = Session {
			connecting,
			..Session::default()
		};
	}

	async fn reset(&self) {
		self.clear_state().await;
		for key in [ACCOUNT_KEY, WALLET_TYPE_KEY] {
			if let Err(e) = self.inner.storage.delete(key).await {
				tracing::warn!(key, error = %e, "Failed to clear persisted session");
			}
		}
		// Last, since the listener itself may be the caller
		self.remove_listener();
	}

	/// Starts forwarding wallet events, replacing any previous listener.
	fn register_listener(&self) {
		let mut events = self.inner.wallet.subscribe();
		let session: Weak<SessionInner> = Arc::downgrade(&self.inner);

		let handle = tokio::spawn(async move {
			loop {
				let event = match events.recv().await {
					Ok(event) => event,
					Err(broadcast::error::RecvError::Lagged(skipped)) => {
						tracing::warn!(skipped, "Missed wallet events");
						continue;
					},
					Err(broadcast::error::RecvError::Closed) => break,
				};

				let Some(inner) = session.upgrade() else {
					break;
				};
				let session = WalletSession { inner };
				match event {
					WalletEvent::AccountsChanged(accounts) => {
						session.on_accounts_changed(accounts).await
					},
					WalletEvent::ChainChanged(chain_id) => session.on_chain_changed(chain_id).await,
				}
			}
		});

		let previous = self
			.inner
			.listener
			.lock()
			.unwrap_or_else(|e| e.into_inner())
			.replace(handle);
		if let Some(previous) = previous {
			previous.abort();
		}
	}

	fn remove_listener(&self) {
		let handle = self
			.inner
			.listener
			.lock()
			.unwrap_or_else(|e| e.into_inner())
			.take();
		if let Some(handle) = handle {
			handle.abort();
		}
	}

	#[cfg(test)]
	fn has_listener(&self) -> bool {
		self.inner
			.listener
			.lock()
			.map(|listener| listener.is_some())
			.unwrap_or(false)
	}
}
