//! Utility functions shared across the client crates.

pub mod address;
pub mod units;
