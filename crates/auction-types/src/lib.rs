//! Common types for the auction contract client.
//!
//! This crate holds the value types shared by the wallet session, the
//! contract call adapter and the command-line front end, so that each of
//! them agrees on what an auction, a call result or a wallet kind looks like.

/// Auction records as decoded from the contract and their read-only views.
pub mod auction;
/// Registry trait for self-registering implementations.
pub mod registry;
/// Uniform result of every state-changing contract call.
pub mod result;
/// Secure string type for handling private keys.
pub mod secret_string;
/// Utility functions for unit conversion and address formatting.
pub mod utils;
/// Wallet kinds and provider capability probing.
pub mod wallet;

pub use auction::{AuctionRecord, AuctionView, UserBid};
pub use registry::ImplementationRegistry;
pub use result::CallResult;
pub use secret_string::SecretString;
pub use utils::{
	address::{is_zero_address, parse_address, short_address},
	units::{format_ether, parse_ether, UnitsError},
};
pub use wallet::{WalletCapabilities, WalletKind};

pub use alloy_primitives::{Address, B256, U256};
