//! Wallet session operations

use crate::Context;
use auction_types::CallResult;
use auction_wallet::Session;
use std::sync::Arc;
use tracing::instrument;

pub struct WalletOps {
	ctx: Arc<Context>,
}

impl WalletOps {
	pub fn new(ctx: Arc<Context>) -> Self {
		Self { ctx }
	}

	/// Prompts the wallet for accounts and remembers the first one.
	#[instrument(skip(self))]
	pub async fn connect(&self) -> CallResult {
		let result = self.ctx.session.connect().await;
		if result.success {
			self.ctx.check_chain().await;
		}
		result
	}

	/// Forgets the remembered account.
	#[instrument(skip(self))]
	pub async fn disconnect(&self) {
		self.ctx.session.disconnect().await;
	}

	/// Current in-memory session.
	pub async fn session(&self) -> Session {
		self.ctx.session.snapshot().await
	}

	/// Current session, restored silently from storage when possible.
	pub async fn status(&self) -> Session {
		self.ctx.restore_session().await;
		self.ctx.session.snapshot().await
	}

	/// Follows account and chain changes until Ctrl+C.
	///
	/// `on_change` is called with the initial session and again whenever the
	/// account, chain or signer availability changes. The session's own
	/// listener applies the wallet events; this loop only observes the result
	/// at the wallet's poll interval.
	pub async fn watch<F>(&self, mut on_change: F) -> anyhow::Result<()>
	where
		F: FnMut(&Session),
	{
		if !self.ctx.restore_session().await {
			return Err(anyhow::anyhow!(
				"No wallet connected. Run 'auction wallet connect' first"
			));
		}

		let mut last = self.ctx.session.snapshot().await;
		on_change(&last);

		let mut ticker = tokio::time::interval(self.ctx.config.wallet.poll_interval());
		let shutdown = tokio::signal::ctrl_c();
		tokio::pin!(shutdown);

		loop {
			tokio::select! {
				result = &mut shutdown => {
					result?;
					tracing::info!("Stopped watching wallet");
					return Ok(());
				},
				_ = ticker.tick() => {
					let current = self.ctx.session.snapshot().await;
					if session_changed(&last, &current) {
						on_change(&current);
						if !current.is_connected() {
							return Ok(());
						}
						last = current;
					}
				},
			}
		}
	}
}

fn session_changed(previous: &Session, current: &Session) -> bool {
	previous.account != current.account
		|| previous.chain_id != current.chain_id
		|| previous.signer.is_some() != current.signer.is_some()
}
