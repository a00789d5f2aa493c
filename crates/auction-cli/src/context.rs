//! Application context shared by every command
//!
//! Builds the storage backend, wallet provider and wallet session from the
//! configuration. The contract client is created on demand because only
//! contract commands need a configured address.

use crate::logging::operation_warning;
use anyhow::{Context as _, Result};
use auction_config::Config;
use auction_contract::{
	implementations::evm::alloy::AlloyAuctionBackend, AuctionClient, ClientSettings,
};
use auction_wallet::{WalletSession, WalletSettings};
use serde_json::json;
use std::path::Path;
use std::sync::Arc;

pub struct Context {
	pub config: Config,
	pub session: WalletSession,
}

impl Context {
	/// Loads the configuration at `path` and builds the context from it.
	pub async fn load(path: &Path) -> Result<Self> {
		let config = Config::from_file(path)
			.await
			.with_context(|| format!("Failed to load configuration from {}", path.display()))?;
		Self::from_config(config)
	}

	/// Builds storage, wallet and session without touching the network.
	pub fn from_config(config: Config) -> Result<Self> {
		let storage = auction_storage::create_storage(
			&config.storage.implementation,
			&json!({ "path": config.storage.path }),
		)
		.context("Failed to create session storage")?;

		let settings = WalletSettings {
			rpc_url: config.network.rpc_url.clone(),
			private_key: config.wallet.private_key.clone(),
			poll_interval: config.wallet.poll_interval(),
		};
		let wallet = auction_wallet::create_wallet(&config.wallet.implementation, &settings)
			.context("Failed to create wallet provider")?;

		tracing::debug!(
			wallet = %config.wallet.implementation,
			storage = %config.storage.implementation,
			"Context initialized"
		);

		Ok(Self {
			session: WalletSession::new(Arc::from(wallet), Arc::from(storage)),
			config,
		})
	}

	/// Restores a remembered connection, warning about an unexpected chain.
	///
	/// Returns true when a session was restored.
	pub async fn restore_session(&self) -> bool {
		let restored = self.session.reconnect_silently().await;
		if restored {
			self.check_chain().await;
		}
		restored
	}

	/// Warns when the wallet is on another chain than the configured one.
	pub async fn check_chain(&self) {
		let Some(expected) = self.config.network.chain_id else {
			return;
		};
		if let Some(actual) = self.session.chain_id().await {
			if actual != expected {
				operation_warning(
					"chain check",
					&format!("Wallet is on chain {actual}, configuration expects chain {expected}"),
					&self.config.network.rpc_url,
				);
			}
		}
	}

	/// Contract client for the configured auction contract.
	pub fn client(&self) -> Result<AuctionClient> {
		let address = self.config.contract_address()?;
		let backend = AlloyAuctionBackend::new(
			self.session.read_provider(),
			address,
			self.config.client.confirmation_timeout(),
		);

		Ok(AuctionClient::new(
			Arc::new(backend),
			ClientSettings {
				read_batch_size: self.config.client.read_batch_size,
				bid_gas_limit: self.config.client.bid_gas_limit,
			},
		))
	}
}
