//! Storage module for the bridge router.
//!
//! Backs the response cache. Backends implement a small byte-oriented
//! key-value interface with optional time-to-live; [`StorageService`] layers
//! namespaced keys and JSON serialization on top of it.

use async_trait::async_trait;
use router_types::{ConfigSchema, ImplementationRegistry};
use serde::{de::DeserializeOwned, Serialize};
use std::time::Duration;
use thiserror::Error;

/// Re-export implementations
pub mod implementations {
	pub mod memory;
	pub mod redis;
}

/// Errors that can occur during storage operations.
#[derive(Debug, Error)]
pub enum StorageError {
	/// The key is absent or its entry has expired.
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

	/// Stores raw bytes with optional time-to-live.
	async fn set_bytes(
		&self,
		key: &str,
		value: Vec<u8>,
		ttl: Option<Duration>,
	) -> Result<(), StorageError>;

	/// Deletes the value associated with the given key.
	async fn delete(&self, key: &str) -> Result<(), StorageError>;

	/// Checks if a live (non-expired) key exists.
	async fn exists(&self, key: &str) -> Result<bool, StorageError>;

	/// Returns the configuration schema for validation.
	fn config_schema(&self) -> Box<dyn ConfigSchema>;

	/// Removes expired entries, returning how many were dropped.
	async fn cleanup_expired(&self) -> Result<usize, StorageError> {
		Ok(0)
	}
}

/// Type alias for storage factory functions.
pub type StorageFactory = fn(&toml::Value) -> Result<Box<dyn StorageInterface>, StorageError>;

/// Registry trait for storage implementations.
pub trait StorageRegistry: ImplementationRegistry<Factory = StorageFactory> {}

/// Get all registered storage implementations.
///
/// Returns a vector of (name, factory) tuples used to build the backend
/// named by `cache.primary`.
pub fn get_all_implementations() -> Vec<(&'static str, StorageFactory)> {
	use implementations::{memory, redis};

	vec![
		(memory::Registry::NAME, memory::Registry::factory()),
		(redis::Registry::NAME, redis::Registry::factory()),
	]
}

/// Typed storage on top of a byte backend.
///
/// Keys are formed as `namespace:id` and values are stored as JSON.
pub struct StorageService {
	backend: Box<dyn StorageInterface>,
}

impl StorageService {
	/// Creates a new StorageService with the specified backend.
	pub fn new(backend: Box<dyn StorageInterface>) -> Self {
		Self { backend }
	}

	fn key(namespace: &str, id: &str) -> String {
		format!("{}:{}", namespace, id)
	}

	/// Stores a serializable value with optional time-to-live.
	pub async fn store_with_ttl<T: Serialize>(
		&self,
		namespace: &str,
		id: &str,
		data: &T,
		ttl: Option<Duration>,
	) -> Result<(), StorageError> {
		let bytes =
			serde_json::to_vec(data).map_err(|e| StorageError::Serialization(e.to_string()))?;
		self.backend
			.set_bytes(&Self::key(namespace, id), bytes, ttl)
			.await
	}

	/// Stores a serializable value without time-to-live.
	pub async fn store<T: Serialize>(
		&self,
		namespace: &str,
		id: &str,
		data: &T,
	) -> Result<(), StorageError> {
		self.store_with_ttl(namespace, id, data, None).await
	}

	/// Retrieves and deserializes a value.
	pub async fn retrieve<T: DeserializeOwned>(
		&self,
		namespace: &str,
		id: &str,
	) -> Result<T, StorageError> {
		let bytes = self.backend.get_bytes(&Self::key(namespace, id)).await?;
		serde_json::from_slice(&bytes).map_err(|e| StorageError::Serialization(e.to_string()))
	}

	/// Retrieves a value, mapping a miss to `None`.
	pub async fn retrieve_optional<T: DeserializeOwned>(
		&self,
		namespace: &str,
		id: &str,
	) -> Result<Option<T>, StorageError> {
		match self.retrieve(namespace, id).await {
			Ok(value) => Ok(Some(value)),
			Err(StorageError::NotFound) => Ok(None),
			Err(e) => Err(e),
		}
	}

	/// Removes a value from storage.
	pub async fn remove(&self, namespace: &str, id: &str) -> Result<(), StorageError> {
		self.backend.delete(&Self::key(namespace, id)).await
	}

	/// Checks if a value exists in storage.
	pub async fn exists(&self, namespace: &str, id: &str) -> Result<bool, StorageError> {
		self.backend.exists(&Self::key(namespace, id)).await
	}

	/// Removes expired entries from storage.
	pub async fn cleanup_expired(&self) -> Result<usize, StorageError> {
		self.backend.cleanup_expired().await
	}
}

#[cfg(test)]
mod tests {
	use super::*;
	use implementations::memory::MemoryStorage;
	use serde::Deserialize;

	#[derive(Debug, PartialEq, Serialize, Deserialize)]
	struct Cached {
		status: String,
		total: u64,
	}

	fn service() -> StorageService {
		StorageService::new(Box::new(MemoryStorage::new()))
	}

	#[tokio::test]
	async fn test_store_and_retrieve_round_trip() {
		let storage = service();
		let value = Cached {
			status: "bridged".to_string(),
			total: 60,
		};
		storage.store("bridge-route", "abc", &value).await.unwrap();

		let loaded: Cached = storage.retrieve("bridge-route", "abc").await.unwrap();
		assert_eq!(loaded, value);
		assert!(storage.exists("bridge-route", "abc").await.unwrap());
		assert!(!storage.exists("other", "abc").await.unwrap());
	}

	#[tokio::test]
	async fn test_retrieve_optional_miss() {
		let storage = service();
		let loaded: Option<Cached> = storage.retrieve_optional("bridge-route", "nope").await.unwrap();
		assert!(loaded.is_none());
	}

	#[tokio::test]
	async fn test_retrieve_wrong_shape_is_serialization_error() {
		let storage = service();
		storage.store("bridge-route", "abc", &"plain").await.unwrap();
		let result: Result<Cached, _> = storage.retrieve("bridge-route", "abc").await;
		assert!(matches!(result, Err(StorageError::Serialization(_))));
	}

	#[tokio::test]
	async fn test_remove() {
		let storage = service();
		storage.store("ns", "id", &1u64).await.unwrap();
		storage.remove("ns", "id").await.unwrap();
		assert!(!storage.exists("ns", "id").await.unwrap());
	}

	#[test]
	fn test_memory_is_registered() {
		let names: Vec<_> = get_all_implementations()
			.into_iter()
			.map(|(name, _)| name)
			.collect();
		assert_eq!(names, vec!["memory"]);
	}
}
