//! In-memory storage backend.
//!
//! Data is lost when the process exits. Used by tests and by sessions that
//! should not remember the connected account.

use crate::{StorageError, StorageInterface};
use async_trait::async_trait;
use std::collections::HashMap;
use std::sync::Arc;
use tokio::sync::RwLock;

/// In-memory storage implementation.
#[derive(Clone, Default)]
pub struct MemoryStorage {
	store: Arc<RwLock<HashMap<String, String>>>,
}

impl MemoryStorage {
	pub fn new() -> Self {
		Self::default()
	}
}

#[async_trait]
impl StorageInterface for MemoryStorage {
	async fn get(&self, key: &str) -> Result<Option<String>, StorageError> {
		Ok(self.store.read().await.get(key).cloned())
	}

	async fn set(&self, key: &str, value: &str) -> Result<(), StorageError> {
		self.store
			.write()
			.await
			.insert(key.to_string(), value.to_string());
		Ok(())
	}

	async fn delete(&self, key: &str) -> Result<(), StorageError> {
		self.store.write().await.remove(key);
		Ok(())
	}

	async fn keys(&self) -> Result<Vec<String>, StorageError> {
		let mut keys: Vec<String> = self.store.read().await.keys().cloned().collect();
		keys.sort();
		Ok(keys)
	}
}

/// Factory function to create a memory storage backend from configuration.
///
/// Memory storage takes no configuration.
pub fn create_storage(_config: &serde_json::Value) -> Result<Box<dyn StorageInterface>, StorageError> {
	Ok(Box::new(MemoryStorage::new()))
}

/// Registry for the memory storage implementation.
pub struct Registry;

impl auction_types::ImplementationRegistry for Registry {
	const NAME: &'static str = "memory";
	type Factory = crate::StorageFactory;

	fn factory() -> Self::Factory {
		create_storage
	}
}
