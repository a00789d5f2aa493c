//! Main binary entry point for the auction CLI
//!
//! Handles argument parsing and logging setup, builds the shared context and
//! dispatches commands to their operation handlers.

use anyhow::Result;
use auction_cli::{
	cli::{output::Display, AuctionCommand, Cli, Commands, WalletCommand},
	logging::{call_outcome, init_logging, operation_error},
	operations::{AuctionOps, DeployOps, WalletOps},
	Context,
};
use auction_types::{short_address, UserBid};
use auction_wallet::Session;
use clap::Parser;
use std::path::PathBuf;
use std::sync::Arc;
use tracing::{info, instrument};

#[tokio::main]
async fn main() -> Result<()> {
	// Load environment variables from .env file if it exists
	let _ = dotenvy::dotenv();

	let cli = Cli::parse();
	let _ = init_logging(cli.debug);

	let ctx = match Context::load(&cli.config).await {
		Ok(ctx) => Arc::new(ctx),
		Err(e) => {
			operation_error("Loading configuration", &e);
			Display::next_steps(&[
				"Copy config/auction.example.toml to config/auction.toml",
				"Or point --config / AUCTION_CONFIG at an existing file",
			]);
			std::process::exit(1);
		},
	};

	let outcome = match cli.command {
		Commands::Wallet { command } => handle_wallet(ctx, command).await,
		Commands::Auction { command } => handle_auction(ctx, command).await,
		Commands::Deploy { artifact } => handle_deploy(ctx, artifact).await,
	};

	if let Err(e) = outcome {
		operation_error("Command", &e);
		std::process::exit(1);
	}
	Ok(())
}

#[instrument(skip(ctx))]
async fn handle_wallet(ctx: Arc<Context>, command: WalletCommand) -> Result<()> {
	let ops = WalletOps::new(ctx);

	match command {
		WalletCommand::Connect => {
			Display::header("Connecting Wallet");
			let result = ops.connect().await;
			call_outcome("connect", &result);
			if result.success {
				print_session(&ops.session().await);
			}
		},
		WalletCommand::Disconnect => {
			ops.disconnect().await;
			Display::success("Wallet disconnected");
		},
		WalletCommand::Status => {
			Display::header("Wallet Status");
			let session = ops.status().await;
			print_session(&session);
			if !session.is_connected() {
				Display::next_steps(&["Connect a wallet with 'auction wallet connect'"]);
			}
		},
		WalletCommand::Watch => {
			Display::header("Watching Wallet");
			Display::info("Press Ctrl+C to stop");
			ops.watch(|session| {
				let time = chrono::Local::now().format("%H:%M:%S");
				if session.is_connected() {
					Display::section(&format!("{time} session"));
					print_session(session);
				} else {
					Display::warning(&format!("{time} wallet disconnected"));
				}
			})
			.await?;
		},
	}

	Ok(())
}

#[instrument(skip(ctx))]
async fn handle_auction(ctx: Arc<Context>, command: AuctionCommand) -> Result<()> {
	let ops = AuctionOps::new(ctx)?;

	match command {
		AuctionCommand::List => {
			Display::header("Auctions");
			let auctions = ops.list().await?;
			if auctions.is_empty() {
				Display::info("No auctions yet");
				return Ok(());
			}
			let now = ops.now().await;
			for auction in &auctions {
				Display::auction(auction, now);
			}
			info!(count = auctions.len(), "Listed auctions");
		},
		AuctionCommand::Show { id } => {
			Display::header(&format!("Auction #{id}"));
			let Some(auction) = ops.show(id).await? else {
				Display::warning(&format!("Auction {id} does not exist"));
				return Ok(());
			};
			let now = ops.now().await;
			Display::auction(&auction, now);

			if let Some(account) = ops.connected_account().await {
				if auction.is_highest_bidder(account) {
					Display::success("You are the highest bidder");
				}
				if auction.can_end(now, Some(account)) {
					Display::next_steps(&[&format!("End it with 'auction auction end {id}'")]);
				}
			}
		},
		AuctionCommand::Count => {
			Display::kv("Auctions", &ops.count().await?.to_string());
		},
		AuctionCommand::Info => {
			Display::header("Auction Contract");
			let info = ops.info().await?;
			Display::kv("Address", &info.address.to_string());
			Display::kv("Owner", &info.owner.to_string());
			Display::kv("Auctions", &info.auction_count.to_string());
			if info.stopped {
				Display::warning("The contract is stopped");
			} else {
				Display::kv("Status", "Running");
			}
		},
		AuctionCommand::Create {
			name,
			price,
			description,
			duration,
		} => {
			Display::header("Creating Auction");
			let result = ops.create(&name, &price, &description, duration).await;
			call_outcome("create auction", &result);
		},
		AuctionCommand::Bid { id, amount } => {
			Display::header(&format!("Bidding {amount} ETH on #{id}"));
			let result = ops.bid(id, &amount).await;
			call_outcome("place bid", &result);
		},
		AuctionCommand::End { id } => {
			Display::header(&format!("Ending Auction #{id}"));
			let result = ops.end(id).await;
			call_outcome("end auction", &result);
		},
		AuctionCommand::Withdraw => {
			Display::header("Withdrawing Funds");
			let result = ops.withdraw().await;
			call_outcome("withdraw", &result);
		},
		AuctionCommand::MyBids { account } => {
			let (account, bids) = ops.my_bids(account).await?;
			Display::header(&format!("Bids of {}", short_address(&account)));
			if bids.is_empty() {
				Display::info("No bids yet");
				return Ok(());
			}
			let now = ops.now().await;
			for bid in &bids {
				match bid {
					UserBid::Auction(auction) => {
						Display::auction(auction, now);
						if auction.is_highest_bidder(account) {
							Display::success("Highest bidder");
						}
					},
					UserBid::Unavailable { id, reason } => {
						Display::section(&format!("#{id}"));
						Display::warning(&format!("Unavailable: {reason}"));
					},
				}
			}
		},
		AuctionCommand::Pending { account } => {
			let (account, amount) = ops.pending(account).await?;
			Display::kv("Account", &account.to_string());
			Display::kv("Pending return", &format!("{amount} ETH"));
			if amount != "0.0" {
				Display::next_steps(&["Withdraw with 'auction auction withdraw'"]);
			}
		},
	}

	Ok(())
}

#[instrument(skip(ctx))]
async fn handle_deploy(ctx: Arc<Context>, artifact: Option<PathBuf>) -> Result<()> {
	let ops = DeployOps::new(ctx);
	let artifact = ops.artifact_path(artifact)?;

	Display::header("Deploying Auction Contract");
	Display::kv("Artifact", &artifact.display().to_string());

	let deployment = ops.deploy(&artifact).await?;
	call_outcome("deploy", &deployment.result);
	if let Some(address) = deployment.address {
		Display::next_steps(&[&format!(
			"Set [contract] address = \"{address}\" in your configuration"
		)]);
	}
	Ok(())
}

fn print_session(session: &Session) {
	match session.account {
		Some(account) => Display::kv("Account", &account.to_string()),
		None => Display::kv("Account", "Not connected"),
	}
	if let Some(kind) = session.wallet_kind {
		Display::kv("Wallet", kind.as_str());
	}
	if let Some(chain_id) = session.chain_id {
		Display::kv("Chain", &chain_id.to_string());
	}
	if session.is_connected() && session.signer.is_none() {
		Display::warning("No signer available; transactions cannot be sent");
	}
}
