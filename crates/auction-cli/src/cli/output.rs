//! Colored terminal output for the `auction` command.
//!
//! Status lines carry a symbol (✓ ✗ ⚠ ℹ), details are indented `key: value`
//! pairs and each command opens with an underlined header.

use auction_types::{short_address, AuctionView, CallResult};
use colored::Colorize;

pub struct Display;

impl Display {
	pub fn header(text: &str) {
		println!("\n{}", text.bold().cyan());
		println!("{}", "─".repeat(text.chars().count()).cyan());
	}

	pub fn success(message: &str) {
		println!("{} {}", "✓".green().bold(), message);
	}

	/// Written to stderr.
	pub fn error(message: &str) {
		eprintln!("{} {}", "✗".red().bold(), message.red());
	}

	pub fn warning(message: &str) {
		println!("{} {}", "⚠".yellow().bold(), message.yellow());
	}

	pub fn info(message: &str) {
		println!("{} {}", "ℹ".blue().bold(), message);
	}

	pub fn kv(key: &str, value: &str) {
		println!("  {} {}", format!("{key}:").bold(), value);
	}

	pub fn section(title: &str) {
		println!("\n{}", format!("▸ {title}").bold());
	}

	/// Numbered follow-up commands under a "Next Steps" section.
	pub fn next_steps(steps: &[&str]) {
		Self::section("Next Steps");
		for (i, step) in steps.iter().enumerate() {
			println!("  {}. {}", i + 1, step);
		}
	}

	/// Successes go to stdout, failures to stderr. The transaction hash is
	/// shown whenever one was sent, including for mined failures.
	pub fn call_result(result: &CallResult) {
		if result.success {
			Self::success(&result.message);
		} else {
			Self::error(&result.message);
		}
		if let Some(hash) = result.tx_hash {
			Self::kv("Transaction", &hash.to_string());
		}
	}

	/// Prints one auction as a titled block; `now` decides the status line.
	pub fn auction(auction: &AuctionView, now: u64) {
		Self::section(&format!("#{} {}", auction.id, auction.name));
		Self::kv("Description", &auction.description);
		Self::kv("Seller", &auction.seller.to_string());
		Self::kv("Starting price", &format!("{} ETH", auction.starting_price));
		if auction.highest_bidder.is_zero() {
			Self::kv("Highest bid", "No bids yet");
		} else {
			Self::kv(
				"Highest bid",
				&format!(
					"{} ETH by {}",
					auction.highest_bid,
					short_address(&auction.highest_bidder)
				),
			);
		}
		Self::kv("Ends", &auction.end_time_display());
		Self::kv("Status", auction_status(auction, now));
	}
}

/// Human-readable state of an auction at `now`.
pub fn auction_status(auction: &AuctionView, now: u64) -> &'static str {
	if auction.ended {
		"Ended"
	} else if auction.is_expired(now) {
		"Expired, waiting to be ended"
	} else {
		"Active"
	}
}
