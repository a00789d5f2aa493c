//! Storage module for the auction client.
//!
//! Holds the few string entries that must survive between runs, most
//! importantly the connected account address and the wallet-kind tag used
//! to reconnect silently. Backends are selected by name from configuration.

use async_trait::async_trait;
use thiserror::Error;

/// Re-export implementations
pub mod implementations {
	pub mod file;
	pub mod memory;
}

/// Errors that can occur during storage operations.
#[derive(Debug, Error)]
pub enum StorageError {
	/// Error that occurs during serialization/deserialization.
	#[error("Serialization error: {0}")]
	Serialization(String),
	/// Error that occurs in the storage backend.
	#[error("Backend error: {0}")]
	Backend(String),
	/// Error that occurs during configuration validation.
	#[error("Configuration error: {0}")]
	Configuration(String),
}

/// Trait defining the interface for storage backends.
///
/// Values are plain strings. A missing key is `Ok(None)`, not an error.
#[async_trait]
#[cfg_attr(feature = "testing", mockall::automock)]
pub trait StorageInterface: Send + Sync {
	/// Retrieves the value stored under `key`.
	async fn get(&self, key: &str) -> Result<Option<String>, StorageError>;

	/// Stores `value` under `key`, replacing any previous value.
	async fn set(&self, key: &str, value: &str) -> Result<(), StorageError>;

	/// Removes `key`. Removing a missing key is not an error.
	async fn delete(&self, key: &str) -> Result<(), StorageError>;

	/// Lists every stored key.
	async fn keys(&self) -> Result<Vec<String>, StorageError>;
}

/// Type alias for storage factory functions.
pub type StorageFactory = fn(&serde_json::Value) -> Result<Box<dyn StorageInterface>, StorageError>;

/// Get all registered storage implementations.
///
/// Returns a vector of (name, factory) tuples for all available storage implementations.
pub fn get_all_implementations() -> Vec<(&'static str, StorageFactory)> {
	use auction_types::ImplementationRegistry;
	use implementations::{file, memory};

	vec![
		(file::Registry::NAME, file::Registry::factory()),
		(memory::Registry::NAME, memory::Registry::factory()),
	]
}

/// Builds the storage implementation registered under `name`.
pub fn create_storage(
	name: &str,
	config: &serde_json::Value,
) -> Result<Box<dyn StorageInterface>, StorageError> {
	let factory = get_all_implementations()
		.into_iter()
		.find(|(registered, _)| *registered == name)
		.map(|(_, factory)| factory)
		.ok_or_else(|| {
			StorageError::Configuration(format!("Unknown storage implementation: {name}"))
		})?;

	tracing::debug!(implementation = name, "Creating storage backend");
	factory(config)
}
