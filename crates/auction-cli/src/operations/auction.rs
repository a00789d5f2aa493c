//! Auction operations
//!
//! Thin layer over [`AuctionClient`]: restores the wallet session for writes
//! and account-scoped reads, and supplies a reference time for rendering.

use crate::Context;
use anyhow::{anyhow, Result};
use auction_contract::AuctionClient;
use auction_types::{Address, AuctionView, CallResult, UserBid};
use std::sync::Arc;
use tracing::instrument;

/// Contract owner and stop flag.
#[derive(Debug, Clone)]
pub struct ContractInfo {
	pub address: Address,
	pub owner: Address,
	pub stopped: bool,
	pub auction_count: u64,
}

pub struct AuctionOps {
	ctx: Arc<Context>,
	client: AuctionClient,
}

impl AuctionOps {
	/// # Errors
	/// Returns error when no contract address is configured
	pub fn new(ctx: Arc<Context>) -> Result<Self> {
		let client = ctx.client()?;
		Ok(Self { ctx, client })
	}

	/// Chain time, falling back to the local clock when the node is unreachable.
	pub async fn now(&self) -> u64 {
		match self.client.chain_time().await {
			Ok(time) => time,
			Err(e) => {
				tracing::debug!(error = %e, "Using local clock");
				u64::try_from(chrono::Utc::now().timestamp()).unwrap_or_default()
			},
		}
	}

	#[instrument(skip(self))]
	pub async fn list(&self) -> Result<Vec<AuctionView>> {
		Ok(self.client.list_auctions().await?)
	}

	#[instrument(skip(self))]
	pub async fn show(&self, id: u64) -> Result<Option<AuctionView>> {
		Ok(self.client.auction_details(id).await?)
	}

	pub async fn count(&self) -> Result<u64> {
		Ok(self.client.auction_count().await?)
	}

	pub async fn info(&self) -> Result<ContractInfo> {
		let (owner, stopped, auction_count) = tokio::try_join!(
			self.client.owner(),
			self.client.is_stopped(),
			self.client.auction_count()
		)?;
		Ok(ContractInfo {
			address: self.ctx.config.contract_address()?,
			owner,
			stopped,
			auction_count,
		})
	}

	#[instrument(skip(self, description))]
	pub async fn create(
		&self,
		name: &str,
		price_eth: &str,
		description: &str,
		duration_seconds: u64,
	) -> CallResult {
		let session = self.session().await;
		self.client
			.create_auction(&session, name, price_eth, description, duration_seconds)
			.await
	}

	#[instrument(skip(self))]
	pub async fn bid(&self, id: u64, amount_eth: &str) -> CallResult {
		let session = self.session().await;
		self.client.place_bid(&session, id, amount_eth).await
	}

	#[instrument(skip(self))]
	pub async fn end(&self, id: u64) -> CallResult {
		let session = self.session().await;
		self.client.end_auction(&session, id).await
	}

	#[instrument(skip(self))]
	pub async fn withdraw(&self) -> CallResult {
		let session = self.session().await;
		self.client.withdraw_funds(&session).await
	}

	#[instrument(skip(self))]
	pub async fn my_bids(&self, account: Option<Address>) -> Result<(Address, Vec<UserBid>)> {
		let account = self.resolve_account(account).await?;
		Ok((account, self.client.user_bids(account).await?))
	}

	#[instrument(skip(self))]
	pub async fn pending(&self, account: Option<Address>) -> Result<(Address, String)> {
		let account = self.resolve_account(account).await?;
		Ok((account, self.client.pending_return(account).await?))
	}

	/// The remembered account, when it is still authorized.
	pub async fn connected_account(&self) -> Option<Address> {
		self.ctx.restore_session().await;
		self.ctx.session.account().await
	}

	async fn session(&self) -> auction_wallet::Session {
		self.ctx.restore_session().await;
		self.ctx.session.snapshot().await
	}

	async fn resolve_account(&self, account: Option<Address>) -> Result<Address> {
		if let Some(account) = account {
			return Ok(account);
		}
		self.ctx.restore_session().await;
		self.ctx.session.account().await.ok_or_else(|| {
			anyhow!("No wallet connected. Pass --account or run 'auction wallet connect'")
		})
	}
}
