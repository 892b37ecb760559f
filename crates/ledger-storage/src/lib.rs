//! Storage module for the permit ledger.
//!
//! Ledger snapshots and event histories are persisted through a small
//! key-value abstraction so the command-line service can run against an
//! in-memory store in tests and a file store in normal use.

use async_trait::async_trait;
use ledger_types::StorageKey;
use serde::{de::DeserializeOwned, Serialize};
use thiserror::Error;

pub mod implementations {
	pub mod file;
	pub mod memory;
}

/// Errors that can occur during storage operations.
#[derive(Debug, Error)]
pub enum StorageError {
	/// Error that occurs when a requested item is not found.
	#[error("Not found")]
	NotFound,
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

/// Low-level interface for storage backends.
#[async_trait]
pub trait StorageInterface: Send + Sync {
	/// Retrieves raw bytes for the given key.
	async fn get_bytes(&self, key: &str) -> Result<Vec<u8>, StorageError>;

	/// Stores raw bytes, replacing any previous value.
	async fn set_bytes(&self, key: &str, value: Vec<u8>) -> Result<(), StorageError>;

	/// Deletes the value associated with the given key. Deleting a missing
	/// key is not an error.
	async fn delete(&self, key: &str) -> Result<(), StorageError>;

	/// Checks if a key exists in storage.
	async fn exists(&self, key: &str) -> Result<bool, StorageError>;
}

/// Signature of the factory every backend exposes.
pub type StorageFactory = fn(&toml::Value) -> Result<Box<dyn StorageInterface>, StorageError>;

/// Typed operations over a storage backend.
///
/// Values are stored as JSON under `"{namespace}:{id}"`.
pub struct StorageService {
	backend: Box<dyn StorageInterface>,
}

impl StorageService {
	pub fn new(backend: Box<dyn StorageInterface>) -> Self {
		Self { backend }
	}

	fn key(namespace: StorageKey, id: &str) -> String {
		format!("{}:{}", namespace.as_str(), id)
	}

	/// Stores a serializable value, creating or overwriting it.
	pub async fn store<T: Serialize>(
		&self,
		namespace: StorageKey,
		id: &str,
		data: &T,
	) -> Result<(), StorageError> {
		let bytes =
			serde_json::to_vec(data).map_err(|e| StorageError::Serialization(e.to_string()))?;
		self.backend.set_bytes(&Self::key(namespace, id), bytes).await
	}

	/// Retrieves and deserializes a value.
	pub async fn retrieve<T: DeserializeOwned>(
		&self,
		namespace: StorageKey,
		id: &str,
	) -> Result<T, StorageError> {
		let bytes = self.backend.get_bytes(&Self::key(namespace, id)).await?;
		serde_json::from_slice(&bytes).map_err(|e| StorageError::Serialization(e.to_string()))
	}

	/// Retrieves a value, mapping a missing key to `None`.
	pub async fn retrieve_optional<T: DeserializeOwned>(
		&self,
		namespace: StorageKey,
		id: &str,
	) -> Result<Option<T>, StorageError> {
		match self.retrieve(namespace, id).await {
			Ok(value) => Ok(Some(value)),
			Err(StorageError::NotFound) => Ok(None),
			Err(e) => Err(e),
		}
	}

	pub async fn exists(&self, namespace: StorageKey, id: &str) -> Result<bool, StorageError> {
		self.backend.exists(&Self::key(namespace, id)).await
	}
}

#[cfg(test)]
mod tests {
	use super::*;
	use crate::implementations::memory::MemoryStorage;
	use serde::Deserialize;

	#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
	struct Entry {
		name: String,
		value: u64,
	}

	fn service() -> StorageService {
		StorageService::new(Box::new(MemoryStorage::new()))
	}

	#[tokio::test]
	async fn test_store_and_retrieve() {
		let storage = service();
		let entry = Entry {
			name: "a".into(),
			value: 7,
		};

		storage
			.store(StorageKey::Ledgers, "0xabc", &entry)
			.await
			.unwrap();
		let loaded: Entry = storage.retrieve(StorageKey::Ledgers, "0xabc").await.unwrap();
		assert_eq!(loaded, entry);
		assert!(storage.exists(StorageKey::Ledgers, "0xabc").await.unwrap());
		assert!(!storage.exists(StorageKey::Ledgers, "0xdef").await.unwrap());
	}

	#[tokio::test]
	async fn test_retrieve_optional() {
		let storage = service();
		let missing: Option<Entry> = storage
			.retrieve_optional(StorageKey::Ledgers, "nope")
			.await
			.unwrap();
		assert!(missing.is_none());

		storage
			.store(StorageKey::Ledgers, "x", &Entry { name: "x".into(), value: 1 })
			.await
			.unwrap();
		let present: Option<Entry> = storage
			.retrieve_optional(StorageKey::Ledgers, "x")
			.await
			.unwrap();
		assert_eq!(present.map(|e| e.value), Some(1));
		assert!(matches!(
			storage.retrieve::<Entry>(StorageKey::Ledgers, "y").await,
			Err(StorageError::NotFound)
		));
	}

	#[tokio::test]
	async fn test_corrupt_value_is_a_serialization_error() {
		let backend = MemoryStorage::new();
		backend
			.set_bytes("ledgers:bad", b"not json".to_vec())
			.await
			.unwrap();
		let storage = StorageService::new(Box::new(backend));

		assert!(matches!(
			storage.retrieve::<Entry>(StorageKey::Ledgers, "bad").await,
			Err(StorageError::Serialization(_))
		));
	}
}
