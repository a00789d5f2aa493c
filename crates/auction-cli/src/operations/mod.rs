//! Operation handlers behind each CLI command group
//!
//! Handlers return data and call results; rendering is left to the binary.

pub mod auction;
pub mod deploy;
pub mod wallet;

pub use auction::AuctionOps;
pub use deploy::{DeployOps, Deployment};
pub use wallet::WalletOps;
