//! Command-line front end for the auction dApp.
//!
//! Wires configuration, session storage, the wallet session and the
//! contract client together, and exposes one operations handler per command
//! group. The `auction` binary only parses arguments and dispatches.

pub mod cli;
pub mod context;
pub mod logging;
pub mod operations;

pub use context::Context;
