//! Auction data as it crosses the contract boundary.
//!
//! [`AuctionRecord`] is the raw tuple returned by `getAuction`, with amounts
//! in Wei. [`AuctionView`] is the projection handed to callers: amounts are
//! decimal ETH strings and derived state (expired, endable) is computed on
//! demand. Views are created fresh on every fetch and never mutated.

use crate::utils::units::format_ether;
use alloy_primitives::{Address, U256};
use chrono::DateTime;
use serde::{Deserialize, Serialize};

/// Decoded `getAuction` return values.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AuctionRecord {
	pub seller: Address,
	pub name: String,
	pub description: String,
	/// Starting price in Wei.
	pub starting_price: U256,
	/// Highest bid in Wei, zero when nobody has bid yet.
	pub highest_bid: U256,
	pub highest_bidder: Address,
	/// Unix timestamp in seconds.
	pub end_time: u64,
	pub ended: bool,
}

impl AuctionRecord {
	/// Returns false for ids that were never created.
	///
	/// The contract answers unknown ids with a zeroed struct, so a zero
	/// seller is the only reliable marker of a missing auction.
	pub fn exists(&self) -> bool {
		!self.seller.is_zero()
	}

	/// Builds the read-only projection for this record.
	pub fn to_view(&self, id: u64) -> AuctionView {
		AuctionView {
			id,
			seller: self.seller,
			name: self.name.clone(),
			description: self.description.clone(),
			starting_price: format_ether(self.starting_price),
			highest_bid: format_ether(self.highest_bid),
			highest_bidder: self.highest_bidder,
			end_time: self.end_time,
			ended: self.ended,
		}
	}
}

/// Read-only projection of one on-chain auction.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AuctionView {
	pub id: u64,
	pub seller: Address,
	pub name: String,
	pub description: String,
	/// Starting price as a decimal ETH string.
	pub starting_price: String,
	/// Highest bid as a decimal ETH string.
	pub highest_bid: String,
	pub highest_bidder: Address,
	/// Unix timestamp in seconds.
	pub end_time: u64,
	pub ended: bool,
}

impl AuctionView {
	/// True once `now` is strictly past the end time.
	pub fn is_expired(&self, now: u64) -> bool {
		now > self.end_time
	}

	/// True when `caller` is the seller of an expired auction that has not
	/// been ended yet.
	pub fn can_end(&self, now: u64, caller: Option<Address>) -> bool {
		self.is_expired(now) && !self.ended && caller == Some(self.seller)
	}

	/// True when `account` currently holds the highest bid.
	pub fn is_highest_bidder(&self, account: Address) -> bool {
		!self.highest_bidder.is_zero() && self.highest_bidder == account
	}

	/// End time rendered as UTC, or "Unknown" for a zero timestamp.
	pub fn end_time_display(&self) -> String {
		if self.end_time == 0 {
			return "Unknown".to_string();
		}
		i64::try_from(self.end_time)
			.ok()
			.and_then(|secs| DateTime::from_timestamp(secs, 0))
			.map(|dt| dt.format("%Y-%m-%d %H:%M:%S UTC").to_string())
			.unwrap_or_else(|| "Unknown".to_string())
	}
}

/// One entry of an account's bid history.
///
/// Fetch failures for a single id degrade to [`UserBid::Unavailable`] so that
/// one bad id never hides the rest of the list.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "status", rename_all = "camelCase")]
pub enum UserBid {
	Auction(AuctionView),
	Unavailable { id: u64, reason: String },
}

impl UserBid {
	pub fn id(&self) -> u64 {
		match self {
			UserBid::Auction(view) => view.id,
			UserBid::Unavailable { id, .. } => *id,
		}
	}

	pub fn is_available(&self) -> bool {
		matches!(self, UserBid::Auction(_))
	}
}
