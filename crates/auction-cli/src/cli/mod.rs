//! Command-line interface definitions and parsing
//!
//! Defines the CLI structure using clap: the top-level parser with its global
//! flags and one subcommand enum per command group.

pub mod output;

use auction_types::Address;
use clap::{Parser, Subcommand};
use std::path::PathBuf;

/// Default location of the configuration file.
pub const DEFAULT_CONFIG_PATH: &str = "config/auction.toml";

/// Main CLI application structure for the auction client
#[derive(Parser, Debug)]
#[command(name = "auction")]
#[command(about = "Auction dApp client - connect a wallet, browse auctions, bid and withdraw")]
#[command(version)]
pub struct Cli {
	#[command(subcommand)]
	pub command: Commands,

	/// Enable debug logging
	#[arg(global = true, long, env = "AUCTION_DEBUG")]
	pub debug: bool,

	/// Config file path (can be set via AUCTION_CONFIG env var)
	#[arg(global = true, long, env = "AUCTION_CONFIG", default_value = DEFAULT_CONFIG_PATH)]
	pub config: PathBuf,
}

/// Available CLI subcommands
#[derive(Subcommand, Debug)]
pub enum Commands {
	/// Wallet session management
	Wallet {
		#[command(subcommand)]
		command: WalletCommand,
	},

	/// Auction operations
	Auction {
		#[command(subcommand)]
		command: AuctionCommand,
	},

	/// Deploy the auction contract from a compiled artifact
	Deploy {
		/// Hardhat or Foundry artifact JSON (defaults to deploy.artifact)
		#[arg(long)]
		artifact: Option<PathBuf>,
	},
}

#[derive(Subcommand, Debug)]
pub enum WalletCommand {
	/// Request accounts from the wallet and remember the first one
	Connect,
	/// Forget the connected account
	Disconnect,
	/// Show the current session
	Status,
	/// Follow account and network changes until interrupted
	Watch,
}

#[derive(Subcommand, Debug)]
pub enum AuctionCommand {
	/// List every existing auction
	List,
	/// Show a single auction
	Show {
		/// Auction id
		id: u64,
	},
	/// Print the number of auctions created so far
	Count,
	/// Contract owner and emergency-stop state
	Info,
	/// Create a new auction
	Create {
		#[arg(long)]
		name: String,
		/// Starting price in ETH, e.g. 0.5
		#[arg(long)]
		price: String,
		#[arg(long)]
		description: String,
		/// Duration in seconds
		#[arg(long)]
		duration: u64,
	},
	/// Place a bid
	Bid {
		/// Auction id
		id: u64,
		/// Bid amount in ETH, e.g. 1.25
		amount: String,
	},
	/// End an expired auction
	End {
		/// Auction id
		id: u64,
	},
	/// Withdraw outbid funds
	Withdraw,
	/// Auctions an account has bid on
	MyBids {
		/// Account to inspect (defaults to the connected account)
		#[arg(long)]
		account: Option<Address>,
	},
	/// Funds waiting to be withdrawn
	Pending {
		/// Account to inspect (defaults to the connected account)
		#[arg(long)]
		account: Option<Address>,
	},
}
