//! File-backed storage.
//!
//! All entries live in a single JSON object on disk. Every write rewrites the
//! whole document through a temp file and a rename, so a crash mid-write
//! leaves the previous document intact.

use crate::{StorageError, StorageInterface};
use async_trait::async_trait;
use std::collections::BTreeMap;
use std::path::PathBuf;
use tokio::fs;
use tokio::sync::Mutex;

/// Default location of the session document.
pub const DEFAULT_PATH: &str = "./data/session.json";

/// Storage backed by one JSON document.
pub struct FileStorage {
	path: PathBuf,
	/// Serializes read-modify-write cycles within this process.
	lock: Mutex<()>,
}

impl FileStorage {
	pub fn new(path: PathBuf) -> Self {
		Self {
			path,
			lock: Mutex::new(()),
		}
	}

	async fn load(&self) -> Result<BTreeMap<String, String>, StorageError> {
		let data = match fs::read(&self.path).await {
			Ok(data) => data,
			Err(e) if e.kind() == std::io::ErrorKind::NotFound => return Ok(BTreeMap::new()),
			Err(e) => return Err(StorageError::Backend(e.to_string())),
		};

		if data.is_empty() {
			return Ok(BTreeMap::new());
		}

		serde_json::from_slice(&data).map_err(|e| {
			StorageError::Serialization(format!("{}: {e}", self.path.display()))
		})
	}

	async fn store(&self, entries: &BTreeMap<String, String>) -> Result<(), StorageError> {
		if let Some(parent) = self.path.parent() {
			if !parent.as_os_str().is_empty() {
				fs::create_dir_all(parent)
					.await
					.map_err(|e| StorageError::Backend(e.to_string()))?;
			}
		}

		let bytes = serde_json::to_vec_pretty(entries)
			.map_err(|e| StorageError::Serialization(e.to_string()))?;

		// Write atomically by writing to temp file then renaming
		let temp_path = self.path.with_extension("tmp");
		fs::write(&temp_path, bytes)
			.await
			.map_err(|e| StorageError::Backend(e.to_string()))?;
		fs::rename(&temp_path, &self.path)
			.await
			.map_err(|e| StorageError::Backend(e.to_string()))
	}
}

#[async_trait]
impl StorageInterface for FileStorage {
	async fn get(&self, key: &str) -> Result<Option<String>, StorageError> {
		let _guard = self.lock.lock().await;
		Ok(self.load().await?.remove(key))
	}

	async fn set(&self, key: &str, value: &str) -> Result<(), StorageError> {
		let _guard = self.lock.lock().await;
		let mut entries = self.load().await?;
		entries.insert(key.to_string(), value.to_string());
		self.store(&entries).await
	}

	async fn delete(&self, key: &str) -> Result<(), StorageError> {
		let _guard = self.lock.lock().await;
		let mut entries = self.load().await?;
		if entries.remove(key).is_none() {
			return Ok(());
		}
		self.store(&entries).await
	}

	async fn keys(&self) -> Result<Vec<String>, StorageError> {
		let _guard = self.lock.lock().await;
		Ok(self.load().await?.into_keys().collect())
	}
}

/// Factory function to create a file storage backend from configuration.
///
/// Configuration parameters:
/// - `path`: Location of the JSON document (default: "./data/session.json")
pub fn create_storage(config: &serde_json::Value) -> Result<Box<dyn StorageInterface>, StorageError> {
	let path = match config.get("path") {
		None | Some(serde_json::Value::Null) => DEFAULT_PATH,
		Some(serde_json::Value::String(path)) if !path.trim().is_empty() => path.as_str(),
		Some(other) => {
			return Err(StorageError::Configuration(format!(
				"path must be a non-empty string, got {other}"
			)))
		},
	};

	Ok(Box::new(FileStorage::new(PathBuf::from(path))))
}

/// Registry for the file storage implementation.
pub struct Registry;

impl auction_types::ImplementationRegistry for Registry {
	const NAME: &'static str = "file";
	type Factory = crate::StorageFactory;

	fn factory() -> Self::Factory {
		create_storage
	}
}
