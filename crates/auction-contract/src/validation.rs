//! Local checks run before a transaction is submitted.
//!
//! The contract remains authoritative; these checks only catch the common
//! mistakes early with a clear message and without spending gas. All amount
//! comparisons are done in Wei.

use alloy_primitives::{Address, U256};
use auction_types::{format_ether, AuctionRecord};
use thiserror::Error;

/// Reasons a call is refused before submission.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum PreflightError {
	#[error("Please connect your wallet!")]
	NotConnected,
	#[error("Auction name is required")]
	MissingName,
	#[error("Auction description is required")]
	MissingDescription,
	#[error("Starting price must be a positive ETH amount")]
	InvalidStartingPrice,
	#[error("Duration must be greater than 0")]
	InvalidDuration,
	#[error("Bid must be a positive ETH amount")]
	InvalidBidAmount,
	#[error("Auction has ended or does not exist")]
	AuctionUnavailable,
	#[error("Auction has expired")]
	AuctionExpired,
	#[error("Seller cannot bid on own auction")]
	SellerBid,
	#[error("Bid must be at least {0} ETH")]
	BelowStartingPrice(String),
	#[error("Your bid must be higher than the current highest bid of {0} ETH")]
	NotHighestBid(String),
	#[error("Auction has already ended")]
	AlreadyEnded,
	#[error("Only the seller or contract owner can end this auction")]
	NotSellerOrOwner,
	#[error("Auction has not reached its end time yet")]
	NotYetEnded,
	#[error("No funds available to withdraw")]
	NothingToWithdraw,
}

/// Checks the arguments of a new auction.
pub fn check_new_auction(
	name: &str,
	description: &str,
	starting_price: U256,
	duration: u64,
) -> Result<(), PreflightError> {
	if name.trim().is_empty() {
		return Err(PreflightError::MissingName);
	}
	if description.trim().is_empty() {
		return Err(PreflightError::MissingDescription);
	}
	if starting_price.is_zero() {
		return Err(PreflightError::InvalidStartingPrice);
	}
	if duration == 0 {
		return Err(PreflightError::InvalidDuration);
	}
	Ok(())
}

/// Checks a bid of `bid` Wei by `bidder` against the current auction state.
///
/// `now` is the chain time of the latest block.
pub fn check_bid(
	auction: &AuctionRecord,
	bidder: Address,
	bid: U256,
	now: u64,
) -> Result<(), PreflightError> {
	if !auction.exists() || auction.ended {
		return Err(PreflightError::AuctionUnavailable);
	}
	if now >= auction.end_time {
		return Err(PreflightError::AuctionExpired);
	}
	if bidder == auction.seller {
		return Err(PreflightError::SellerBid);
	}
	if bid < auction.starting_price {
		return Err(PreflightError::BelowStartingPrice(format_ether(
			auction.starting_price,
		)));
	}
	if !auction.highest_bid.is_zero() && bid <= auction.highest_bid {
		return Err(PreflightError::NotHighestBid(format_ether(auction.highest_bid)));
	}
	Ok(())
}

/// Checks that `caller` may end the auction at chain time `now`.
pub fn check_end(
	auction: &AuctionRecord,
	caller: Address,
	owner: Address,
	now: u64,
) -> Result<(), PreflightError> {
	if auction.ended {
		return Err(PreflightError::AlreadyEnded);
	}
	if caller != auction.seller && caller != owner {
		return Err(PreflightError::NotSellerOrOwner);
	}
	if now < auction.end_time {
		return Err(PreflightError::NotYetEnded);
	}
	Ok(())
}

/// Checks that there is something to withdraw.
pub fn check_withdraw(pending: U256) -> Result<(), PreflightError> {
	if pending.is_zero() {
		return Err(PreflightError::NothingToWithdraw);
	}
	Ok(())
}
