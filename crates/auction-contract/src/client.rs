//! High-level auction operations.
//!
//! [`AuctionClient`] is what the front end calls. Reads return data or a
//! [`ContractError`]; writes always return a [`CallResult`].

use crate::validation::{self, PreflightError};
use crate::{normalize_error, AuctionBackend, ContractError, TxOutcome};
use alloy_primitives::{Address, U256};
use auction_types::{format_ether, parse_ether, AuctionView, CallResult, UserBid};
use auction_wallet::{Session, SignerHandle};
use futures::future::join_all;
use std::sync::Arc;

pub const UNKNOWN_FAILURE_MESSAGE: &str = "Transaction failed for unknown reason.";
pub const AUCTION_CREATED_MESSAGE: &str = "Auction created successfully!";
pub const BID_PLACED_MESSAGE: &str = "Bid placed successfully!";
pub const AUCTION_ENDED_MESSAGE: &str = "Auction ended successfully!";
pub const FUNDS_WITHDRAWN_MESSAGE: &str = "Funds withdrawn successfully!";

/// Reason recorded for bid entries whose auction id is unknown.
pub const MISSING_AUCTION_REASON: &str = "Auction does not exist";

/// Tunables of the client.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ClientSettings {
	/// Number of auctions fetched concurrently.
	pub read_batch_size: usize,
	/// Gas limit attached to bids.
	pub bid_gas_limit: u64,
}

impl Default for ClientSettings {
	fn default() -> Self {
		Self {
			read_batch_size: 10,
			bid_gas_limit: 500_000,
		}
	}
}

/// Contract call adapter.
#[derive(Clone)]
pub struct AuctionClient {
	backend: Arc<dyn AuctionBackend>,
	settings: ClientSettings,
}

impl AuctionClient {
	pub fn new(backend: Arc<dyn AuctionBackend>, settings: ClientSettings) -> Self {
		Self {
			backend,
			settings: ClientSettings {
				read_batch_size: settings.read_batch_size.max(1),
				..settings
			},
		}
	}

	/// Number of auctions created so far.
	pub async fn auction_count(&self) -> Result<u64, ContractError> {
		self.backend.auction_counter().await
	}

	/// Details of one auction, or `None` if the id was never created.
	pub async fn auction_details(&self, id: u64) -> Result<Option<AuctionView>, ContractError> {
		let record = self.backend.get_auction(id).await?;
		Ok(record.exists().then(|| record.to_view(id)))
	}

	/// All existing auctions in id order.
	///
	/// Auctions are fetched in concurrent batches. An auction that fails to
	/// load is logged and left out instead of failing the whole listing.
	pub async fn list_auctions(&self) -> Result<Vec<AuctionView>, ContractError> {
		let count = self.backend.auction_counter().await?;
		let ids: Vec<u64> = (0..count).collect();
		let mut auctions = Vec::with_capacity(ids.len());

		for batch in ids.chunks(self.settings.read_batch_size) {
			let results = join_all(batch.iter().map(|&id| self.backend.get_auction(id))).await;
			for (&id, result) in batch.iter().zip(results) {
				match result {
					Ok(record) if record.exists() => auctions.push(record.to_view(id)),
					Ok(_) => tracing::debug!(auction_id = id, "Skipping missing auction"),
					Err(e) => tracing::warn!(auction_id = id, error = %e, "Failed to load auction"),
				}
			}
		}

		Ok(auctions)
	}

	/// Auctions `account` has bid on, one entry per recorded id.
	///
	/// Entries that cannot be loaded become [`UserBid::Unavailable`], so the
	/// result always has as many entries as the contract reported ids.
	pub async fn user_bids(&self, account: Address) -> Result<Vec<UserBid>, ContractError> {
		let ids = self.backend.get_user_bids(account).await?;
		let mut bids = Vec::with_capacity(ids.len());

		for batch in ids.chunks(self.settings.read_batch_size) {
			let results = join_all(batch.iter().map(|&id| self.backend.get_auction(id))).await;
			for (&id, result) in batch.iter().zip(results) {
				let entry = match result {
					Ok(record) if record.exists() => UserBid::Auction(record.to_view(id)),
					Ok(_) => UserBid::Unavailable {
						id,
						reason: MISSING_AUCTION_REASON.to_string(),
					},
					Err(e) => {
						tracing::warn!(auction_id = id, error = %e, "Failed to load bid auction");
						UserBid::Unavailable {
							id,
							reason: e.to_string(),
						}
					},
				};
				bids.push(entry);
			}
		}

		Ok(bids)
	}

	/// Amount waiting to be withdrawn by `account`, in ETH.
	pub async fn pending_return(&self, account: Address) -> Result<String, ContractError> {
		Ok(format_ether(self.backend.get_pending_return(account).await?))
	}

	pub async fn is_stopped(&self) -> Result<bool, ContractError> {
		self.backend.stopped().await
	}

	pub async fn owner(&self) -> Result<Address, ContractError> {
		self.backend.owner().await
	}

	/// Timestamp of the latest block.
	pub async fn chain_time(&self) -> Result<u64, ContractError> {
		self.backend.latest_timestamp().await
	}

	/// Creates an auction with a starting price given in ETH.
	pub async fn create_auction(
		&self,
		session: &Session,
		name: &str,
		starting_price_eth: &str,
		description: &str,
		duration_seconds: u64,
	) -> CallResult {
		let signer = match require_signer(session) {
			Ok(signer) => signer,
			Err(result) => return result,
		};

		let starting_price = match parse_ether(starting_price_eth) {
			Ok(price) => price,
			Err(e) => {
				tracing::debug!(error = %e, "Rejected starting price");
				return refused(PreflightError::InvalidStartingPrice);
			},
		};
		if let Err(e) =
			validation::check_new_auction(name, description, starting_price, duration_seconds)
		{
			return refused(e);
		}

		tracing::info!(name, starting_price = %starting_price, duration_seconds, "Creating auction");
		let result = self
			.backend
			.create_auction(
				signer,
				name.trim(),
				starting_price,
				description.trim(),
				duration_seconds,
			)
			.await;
		finish(result, AUCTION_CREATED_MESSAGE)
	}

	/// Bids `bid_eth` ETH on auction `id`.
	///
	/// Obvious losers are refused locally. If the state needed for that check
	/// cannot be read, the bid is submitted anyway and the contract decides.
	pub async fn place_bid(&self, session: &Session, id: u64, bid_eth: &str) -> CallResult {
		let signer = match require_signer(session) {
			Ok(signer) => signer,
			Err(result) => return result,
		};

		let bid = match parse_ether(bid_eth) {
			Ok(bid) if !bid.is_zero() => bid,
			_ => return refused(PreflightError::InvalidBidAmount),
		};

		match self.bid_preflight(id, signer.address, bid).await {
			Ok(Ok(())) => {},
			Ok(Err(e)) => return refused(e),
			Err(e) => {
				tracing::warn!(auction_id = id, error = %e, "Bid pre-flight check unavailable, submitting anyway");
			},
		}

		tracing::info!(auction_id = id, bid = %format_ether(bid), "Placing bid");
		let result = self
			.backend
			.place_bid(signer, id, bid, self.settings.bid_gas_limit)
			.await;
		finish(result, BID_PLACED_MESSAGE)
	}

	async fn bid_preflight(
		&self,
		id: u64,
		bidder: Address,
		bid: U256,
	) -> Result<Result<(), PreflightError>, ContractError> {
		let (auction, now) =
			futures::try_join!(self.backend.get_auction(id), self.backend.latest_timestamp())?;
		Ok(validation::check_bid(&auction, bidder, bid, now))
	}

	/// Ends auction `id`, paying out the seller.
	pub async fn end_auction(&self, session: &Session, id: u64) -> CallResult {
		let signer = match require_signer(session) {
			Ok(signer) => signer,
			Err(result) => return result,
		};

		match self.end_preflight(id, signer.address).await {
			Ok(Ok(())) => {},
			Ok(Err(e)) => return refused(e),
			Err(e) => {
				tracing::warn!(auction_id = id, error = %e, "End pre-flight check unavailable, submitting anyway");
			},
		}

		tracing::info!(auction_id = id, "Ending auction");
		let result = self.backend.end_auction(signer, id).await;
		finish(result, AUCTION_ENDED_MESSAGE)
	}

	async fn end_preflight(
		&self,
		id: u64,
		caller: Address,
	) -> Result<Result<(), PreflightError>, ContractError> {
		let (auction, owner, now) = futures::try_join!(
			self.backend.get_auction(id),
			self.backend.owner(),
			self.backend.latest_timestamp()
		)?;
		Ok(validation::check_end(&auction, caller, owner, now))
	}

	/// Withdraws the caller's outbid funds.
	pub async fn withdraw_funds(&self, session: &Session) -> CallResult {
		let signer = match require_signer(session) {
			Ok(signer) => signer,
			Err(result) => return result,
		};

		match self.backend.get_pending_return(signer.address).await {
			Ok(pending) => {
				if let Err(e) = validation::check_withdraw(pending) {
					return refused(e);
				}
				tracing::info!(amount = %format_ether(pending), "Withdrawing funds");
			},
			Err(e) => {
				tracing::warn!(error = %e, "Withdraw pre-flight check unavailable, submitting anyway");
			},
		}

		let result = self.backend.withdraw(signer).await;
		finish(result, FUNDS_WITHDRAWN_MESSAGE)
	}
}

fn require_signer(session: &Session) -> Result<&SignerHandle, CallResult> {
	session
		.signer
		.as_ref()
		.ok_or_else(|| refused(PreflightError::NotConnected))
}

fn refused(reason: PreflightError) -> CallResult {
	tracing::info!(reason = %reason, "Call refused before submission");
	CallResult::failure(reason.to_string())
}

fn finish(result: Result<TxOutcome, ContractError>, success_message: &str) -> CallResult {
	match result {
		Ok(outcome) if outcome.success => {
			CallResult::success(success_message).with_tx_hash(outcome.hash)
		},
		Ok(outcome) => {
			tracing::warn!(tx_hash = %outcome.hash, "Transaction mined with failed status");
			CallResult::failure(UNKNOWN_FAILURE_MESSAGE).with_tx_hash(outcome.hash)
		},
		Err(e) => {
			let message = normalize_error(&e.to_failure());
			tracing::warn!(error = %e, message = %message, "Transaction failed");
			CallResult::failure(message)
		},
	}
}

#[cfg(test)]
mod tests {
	use super::*;
	use crate::{MockAuctionBackend, ProviderFailure};
	use alloy_primitives::{address, B256};
	use alloy_provider::{Provider, ProviderBuilder};
	use auction_types::AuctionRecord;

	const SELLER: Address = address!("0x70997970C51812dc3A010C7d01b50e0d17dc79C8");
	const BIDDER: Address = address!("0x3C44CdDdB6a900fa2b585dd299e03d12FA4293BC");
	const OWNER: Address = address!("0xf39Fd6e51aad88F6F4ce6aB8827279cffFb92266");
	const NOW: u64 = 1_700_000_000;

	fn eth(amount: &str) -> U256 {
		parse_ether(amount).unwrap()
	}

	fn record(starting: &str, highest: &str) -> AuctionRecord {
		AuctionRecord {
			seller: SELLER,
			name: "Vintage clock".into(),
			description: "Brass, 1920s".into(),
			starting_price: eth(starting),
			highest_bid: eth(highest),
			highest_bidder: Address::ZERO,
			end_time: NOW + 3_600,
			ended: false,
		}
	}

	fn missing() -> AuctionRecord {
		AuctionRecord {
			seller: Address::ZERO,
			name: String::new(),
			description: String::new(),
			starting_price: U256::ZERO,
			highest_bid: U256::ZERO,
			highest_bidder: Address::ZERO,
			end_time: 0,
			ended: false,
		}
	}

	fn session(account: Address) -> Session {
		let provider = ProviderBuilder::new()
			.connect_http("http://localhost:8545".parse().unwrap())
			.erased();
		Session {
			provider: Some(provider.clone()),
			signer: Some(SignerHandle {
				address: account,
				provider,
			}),
			account: Some(account),
			..Session::default()
		}
	}

	fn mined(success: bool) -> TxOutcome {
		TxOutcome {
			hash: B256::repeat_byte(0xab),
			success,
			contract_address: None,
		}
	}

	fn client(backend: MockAuctionBackend) -> AuctionClient {
		AuctionClient::new(Arc::new(backend), ClientSettings::default())
	}

	fn with_auction(backend: &mut MockAuctionBackend, auction: AuctionRecord) {
		backend
			.expect_get_auction()
			.returning(move |_| {
				let auction = auction.clone();
				Box::pin(async move { Ok(auction) })
			});
		backend
			.expect_latest_timestamp()
			.returning(|| Box::pin(async { Ok(NOW) }));
	}

	#[tokio::test]
	async fn test_details_of_unknown_auction_is_none() {
		let mut backend = MockAuctionBackend::new();
		backend
			.expect_get_auction()
			.returning(|_| Box::pin(async { Ok(missing()) }));

		assert_eq!(client(backend).auction_details(42).await.unwrap(), None);
	}

	#[tokio::test]
	async fn test_details_are_formatted() {
		let mut backend = MockAuctionBackend::new();
		backend
			.expect_get_auction()
			.returning(|_| Box::pin(async { Ok(record("1.0", "1.5")) }));

		let view = client(backend).auction_details(3).await.unwrap().unwrap();
		assert_eq!(view.id, 3);
		assert_eq!(view.starting_price, "1.0");
		assert_eq!(view.highest_bid, "1.5");
	}

	#[tokio::test]
	async fn test_user_bids_keeps_one_entry_per_id() {
		let mut backend = MockAuctionBackend::new();
		backend
			.expect_get_user_bids()
			.returning(|_| Box::pin(async { Ok(vec![0, 1, 2, 3]) }));
		backend.expect_get_auction().returning(|id| {
			Box::pin(async move {
				match id {
					1 => Err(ContractError::Network("timeout".into())),
					3 => Ok(missing()),
					_ => Ok(record("1.0", "0")),
				}
			})
		});

		let client = AuctionClient::new(
			Arc::new(backend),
			ClientSettings {
				read_batch_size: 3,
				..ClientSettings::default()
			},
		);
		let bids = client.user_bids(BIDDER).await.unwrap();

		assert_eq!(bids.len(), 4);
		assert_eq!(bids.iter().map(UserBid::id).collect::<Vec<_>>(), vec![0, 1, 2, 3]);
		assert!(bids[0].is_available());
		assert_eq!(
			bids[1],
			UserBid::Unavailable {
				id: 1,
				reason: "Network error: timeout".into()
			}
		);
		assert!(bids[2].is_available());
		assert_eq!(
			bids[3],
			UserBid::Unavailable {
				id: 3,
				reason: MISSING_AUCTION_REASON.into()
			}
		);
	}

	#[tokio::test]
	async fn test_list_auctions_skips_missing_and_failed() {
		let mut backend = MockAuctionBackend::new();
		backend
			.expect_auction_counter()
			.returning(|| Box::pin(async { Ok(5) }));
		backend.expect_get_auction().times(5).returning(|id| {
			Box::pin(async move {
				match id {
					1 => Ok(missing()),
					3 => Err(ContractError::Decode("bad tuple".into())),
					_ => Ok(record("1.0", "0")),
				}
			})
		});

		let client = AuctionClient::new(
			Arc::new(backend),
			ClientSettings {
				read_batch_size: 2,
				..ClientSettings::default()
			},
		);
		let ids: Vec<u64> = client
			.list_auctions()
			.await
			.unwrap()
			.into_iter()
			.map(|view| view.id)
			.collect();
		assert_eq!(ids, vec![0, 2, 4]);
	}

	#[tokio::test]
	async fn test_list_auctions_propagates_count_failure() {
		let mut backend = MockAuctionBackend::new();
		backend
			.expect_auction_counter()
			.returning(|| Box::pin(async { Err(ContractError::Network("down".into())) }));

		assert!(matches!(
			client(backend).list_auctions().await,
			Err(ContractError::Network(_))
		));
	}

	#[tokio::test]
	async fn test_writes_require_signer() {
		let mut backend = MockAuctionBackend::new();
		backend.expect_place_bid().never();
		backend.expect_withdraw().never();
		let client = client(backend);
		let session = Session::default();

		for result in [
			client.place_bid(&session, 0, "1.0").await,
			client.withdraw_funds(&session).await,
			client.end_auction(&session, 0).await,
			client
				.create_auction(&session, "Lamp", "1.0", "Art deco", 60)
				.await,
		] {
			assert!(!result.success);
			assert_eq!(result.message, "Please connect your wallet!");
		}
	}

	#[tokio::test]
	async fn test_bid_below_highest_is_refused_locally() {
		let mut backend = MockAuctionBackend::new();
		with_auction(&mut backend, record("1.0", "1.5"));
		backend.expect_place_bid().never();

		let result = client(backend)
			.place_bid(&session(BIDDER), 0, "1.2")
			.await;
		assert!(!result.success);
		assert_eq!(
			result.message,
			"Your bid must be higher than the current highest bid of 1.5 ETH"
		);
		assert!(result.message.contains("1.5"));
	}

	#[tokio::test]
	async fn test_bid_local_refusals() {
		let cases = [
			(record("1.0", "0"), BIDDER, "0.5", "Bid must be at least 1.0 ETH"),
			(record("1.0", "0"), SELLER, "2.0", "Seller cannot bid on own auction"),
			(
				AuctionRecord {
					ended: true,
					..record("1.0", "0")
				},
				BIDDER,
				"2.0",
				"Auction has ended or does not exist",
			),
			(
				AuctionRecord {
					end_time: NOW,
					..record("1.0", "0")
				},
				BIDDER,
				"2.0",
				"Auction has expired",
			),
		];

		for (auction, bidder, amount, expected) in cases {
			let mut backend = MockAuctionBackend::new();
			with_auction(&mut backend, auction);
			backend.expect_place_bid().never();

			let result = client(backend).place_bid(&session(bidder), 0, amount).await;
			assert!(!result.success);
			assert_eq!(result.message, expected);
		}
	}

	#[tokio::test]
	async fn test_invalid_bid_amount() {
		let mut backend = MockAuctionBackend::new();
		backend.expect_get_auction().never();
		backend.expect_place_bid().never();
		let client = client(backend);

		for amount in ["0", "-1", "abc", ""] {
			let result = client.place_bid(&session(BIDDER), 0, amount).await;
			assert_eq!(result.message, "Bid must be a positive ETH amount");
		}
	}

	#[tokio::test]
	async fn test_bid_submitted_in_wei_with_gas_limit() {
		let mut backend = MockAuctionBackend::new();
		with_auction(&mut backend, record("1.0", "1.5"));
		backend
			.expect_place_bid()
			.withf(|signer, id, value, gas_limit| {
				signer.address == BIDDER
					&& *id == 7 && *value == U256::from(1_600_000_000_000_000_000u128)
					&& *gas_limit == 500_000
			})
			.times(1)
			.returning(|_, _, _, _| Box::pin(async { Ok(mined(true)) }));

		let result = client(backend).place_bid(&session(BIDDER), 7, "1.6").await;
		assert!(result.success);
		assert_eq!(result.message, BID_PLACED_MESSAGE);
		assert_eq!(result.tx_hash, Some(B256::repeat_byte(0xab)));
	}

	#[tokio::test]
	async fn test_bid_submitted_when_preflight_reads_fail() {
		let mut backend = MockAuctionBackend::new();
		backend
			.expect_get_auction()
			.returning(|_| Box::pin(async { Err(ContractError::Network("down".into())) }));
		backend
			.expect_latest_timestamp()
			.returning(|| Box::pin(async { Ok(NOW) }));
		backend
			.expect_place_bid()
			.times(1)
			.returning(|_, _, _, _| Box::pin(async { Ok(mined(true)) }));

		let result = client(backend).place_bid(&session(BIDDER), 0, "1.0").await;
		assert!(result.success);
	}

	#[tokio::test]
	async fn test_revert_reason_is_normalized() {
		let mut backend = MockAuctionBackend::new();
		with_auction(&mut backend, record("1.0", "0"));
		backend.expect_place_bid().returning(|_, _, _, _| {
			Box::pin(async {
				Err(ContractError::Rejected(ProviderFailure::from_message(
					"execution reverted: Auction has ended",
				)))
			})
		});

		let result = client(backend).place_bid(&session(BIDDER), 0, "1.0").await;
		assert!(!result.success);
		assert_eq!(result.message, "Auction has ended");
	}

	#[tokio::test]
	async fn test_failed_receipt_status() {
		let mut backend = MockAuctionBackend::new();
		backend
			.expect_get_pending_return()
			.returning(|_| Box::pin(async { Ok(U256::from(5)) }));
		backend
			.expect_withdraw()
			.returning(|_| Box::pin(async { Ok(mined(false)) }));

		let result = client(backend).withdraw_funds(&session(BIDDER)).await;
		assert!(!result.success);
		assert_eq!(result.message, UNKNOWN_FAILURE_MESSAGE);
		assert!(result.tx_hash.is_some());
	}

	#[tokio::test]
	async fn test_withdraw_without_pending_return() {
		let mut backend = MockAuctionBackend::new();
		backend
			.expect_get_pending_return()
			.returning(|_| Box::pin(async { Ok(U256::ZERO) }));
		backend.expect_withdraw().never();

		let result = client(backend).withdraw_funds(&session(BIDDER)).await;
		assert_eq!(result.message, "No funds available to withdraw");
	}

	#[tokio::test]
	async fn test_end_auction_checks() {
		let mut expired = record("1.0", "0");
		expired.end_time = NOW - 1;

		let mut backend = MockAuctionBackend::new();
		with_auction(&mut backend, expired);
		backend
			.expect_owner()
			.returning(|| Box::pin(async { Ok(OWNER) }));
		backend
			.expect_end_auction()
			.withf(|signer, id| signer.address == OWNER && *id == 2)
			.times(1)
			.returning(|_, _| Box::pin(async { Ok(mined(true)) }));
		let client = client(backend);

		let refused = client.end_auction(&session(BIDDER), 2).await;
		assert_eq!(
			refused.message,
			"Only the seller or contract owner can end this auction"
		);

		let ended = client.end_auction(&session(OWNER), 2).await;
		assert!(ended.success);
		assert_eq!(ended.message, AUCTION_ENDED_MESSAGE);
	}

	#[tokio::test]
	async fn test_end_before_end_time() {
		let mut backend = MockAuctionBackend::new();
		with_auction(&mut backend, record("1.0", "0"));
		backend
			.expect_owner()
			.returning(|| Box::pin(async { Ok(OWNER) }));
		backend.expect_end_auction().never();

		let result = client(backend).end_auction(&session(SELLER), 0).await;
		assert_eq!(result.message, "Auction has not reached its end time yet");
	}

	#[tokio::test]
	async fn test_create_auction() {
		let mut backend = MockAuctionBackend::new();
		backend
			.expect_create_auction()
			.withf(|_, name, price, description, duration| {
				name == "Lamp"
					&& *price == U256::from(250_000_000_000_000_000u128)
					&& description == "Art deco" && *duration == 3_600
			})
			.times(1)
			.returning(|_, _, _, _, _| Box::pin(async { Ok(mined(true)) }));
		let client = client(backend);
		let session = session(SELLER);

		let result = client
			.create_auction(&session, " Lamp ", "0.25", "Art deco", 3_600)
			.await;
		assert!(result.success);
		assert_eq!(result.message, AUCTION_CREATED_MESSAGE);

		let result = client
			.create_auction(&session, "Lamp", "0", "Art deco", 3_600)
			.await;
		assert_eq!(result.message, "Starting price must be a positive ETH amount");

		let result = client
			.create_auction(&session, "Lamp", "1", "Art deco", 0)
			.await;
		assert_eq!(result.message, "Duration must be greater than 0");
	}
}
