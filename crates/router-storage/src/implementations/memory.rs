//! In-memory storage backend.
//!
//! Entries carry an optional expiry instant. Expired entries are invisible to
//! reads immediately and are physically dropped by `cleanup_expired`.

use crate::{StorageError, StorageFactory, StorageInterface, StorageRegistry};
use async_trait::async_trait;
use router_types::{
	ConfigSchema, Field, FieldType, ImplementationRegistry, Schema, ValidationError,
};
use std::collections::HashMap;
use std::time::Duration;
use tokio::sync::RwLock;
use tokio::time::Instant;

struct Entry {
	value: Vec<u8>,
	expires_at: Option<Instant>,
}

impl Entry {
	fn is_expired(&self, now: Instant) -> bool {
		self.expires_at.is_some_and(|at| at <= now)
	}
}

/// In-memory storage with per-entry time-to-live.
pub struct MemoryStorage {
	store: RwLock<HashMap<String, Entry>>,
	/// Upper bound on stored entries; `None` is unbounded.
	max_entries: Option<usize>,
}

impl MemoryStorage {
	/// Creates an unbounded MemoryStorage.
	pub fn new() -> Self {
		Self {
			store: RwLock::new(HashMap::new()),
			max_entries: None,
		}
	}

	/// Creates a MemoryStorage holding at most `max_entries` entries.
	pub fn with_capacity_limit(max_entries: usize) -> Self {
		Self {
			store: RwLock::new(HashMap::new()),
			max_entries: Some(max_entries),
		}
	}
}

impl Default for MemoryStorage {
	fn default() -> Self {
		Self::new()
	}
}

/// Makes room for one more entry: expired entries go first, then the one
/// closest to expiry (entries without TTL last).
fn evict_for_insert(store: &mut HashMap<String, Entry>, limit: usize, now: Instant) {
	if store.len() < limit {
		return;
	}
	store.retain(|_, entry| !entry.is_expired(now));
	while store.len() >= limit {
		let victim = store
			.iter()
			.min_by_key(|(_, entry)| (entry.expires_at.is_none(), entry.expires_at))
			.map(|(key, _)| key.clone());
		match victim {
			Some(key) => {
				tracing::debug!(key = %key, "Evicting cache entry");
				store.remove(&key);
			},
			None => break,
		}
	}
}

#[async_trait]
impl StorageInterface for MemoryStorage {
	async fn get_bytes(&self, key: &str) -> Result<Vec<u8>, StorageError> {
		let store = self.store.read().await;
		match store.get(key) {
			Some(entry) if !entry.is_expired(Instant::now()) => Ok(entry.value.clone()),
			_ => Err(StorageError::NotFound),
		}
	}

	async fn set_bytes(
		&self,
		key: &str,
		value: Vec<u8>,
		ttl: Option<Duration>,
	) -> Result<(), StorageError> {
		let now = Instant::now();
		let mut store = self.store.write().await;
		if let Some(limit) = self.max_entries {
			if !store.contains_key(key) {
				evict_for_insert(&mut store, limit, now);
			}
		}
		store.insert(
			key.to_string(),
			Entry {
				value,
				expires_at: ttl.map(|ttl| now + ttl),
			},
		);
		Ok(())
	}

	async fn delete(&self, key: &str) -> Result<(), StorageError> {
		let mut store = self.store.write().await;
		store.remove(key);
		Ok(())
	}

	async fn exists(&self, key: &str) -> Result<bool, StorageError> {
		let store = self.store.read().await;
		Ok(store
			.get(key)
			.is_some_and(|entry| !entry.is_expired(Instant::now())))
	}

	fn config_schema(&self) -> Box<dyn ConfigSchema> {
		Box::new(MemoryStorageSchema)
	}

	async fn cleanup_expired(&self) -> Result<usize, StorageError> {
		let now = Instant::now();
		let mut store = self.store.write().await;
		let before = store.len();
		store.retain(|_, entry| !entry.is_expired(now));
		Ok(before - store.len())
	}
}

/// Configuration schema for MemoryStorage.
pub struct MemoryStorageSchema;

impl ConfigSchema for MemoryStorageSchema {
	fn validate(&self, config: &toml::Value) -> Result<(), ValidationError> {
		let schema = Schema::new(
			vec![],
			vec![Field::new(
				"max_entries",
				FieldType::Integer {
					min: Some(1),
					max: None,
				},
			)],
		);
		schema.validate(config)
	}
}

/// Factory function to create a memory storage backend from configuration.
///
/// Configuration parameters:
/// - `max_entries` (optional): cap on cached entries
pub fn create_storage(config: &toml::Value) -> Result<Box<dyn StorageInterface>, StorageError> {
	MemoryStorageSchema
		.validate(config)
		.map_err(|e| StorageError::Configuration(e.to_string()))?;

	let storage = match config.get("max_entries").and_then(|v| v.as_integer()) {
		Some(limit) => MemoryStorage::with_capacity_limit(limit as usize),
		None => MemoryStorage::new(),
	};
	Ok(Box::new(storage))
}

/// Registry for the memory storage implementation.
pub struct Registry;

impl ImplementationRegistry for Registry {
	const NAME: &'static str = "memory";
	type Factory = StorageFactory;

	fn factory() -> Self::Factory {
		create_storage
	}
}

impl StorageRegistry for Registry {}

#[cfg(test)]
mod tests {
	use super::*;

	#[tokio::test]
	async fn test_basic_operations() {
		let storage = MemoryStorage::new();

		let key = "test_key";
		let value = b"test_value".to_vec();
		storage.set_bytes(key, value.clone(), None).await.unwrap();
		assert_eq!(storage.get_bytes(key).await.unwrap(), value);
		assert!(storage.exists(key).await.unwrap());

		storage.delete(key).await.unwrap();
		assert!(!storage.exists(key).await.unwrap());
		assert!(matches!(
			storage.get_bytes(key).await,
			Err(StorageError::NotFound)
		));
	}

	#[tokio::test(start_paused = true)]
	async fn test_entry_expires_after_ttl() {
		let storage = MemoryStorage::new();
		storage
			.set_bytes("k", b"v".to_vec(), Some(Duration::from_secs(10)))
			.await
			.unwrap();

		tokio::time::advance(Duration::from_secs(9)).await;
		assert!(storage.exists("k").await.unwrap());

		tokio::time::advance(Duration::from_secs(1)).await;
		assert!(!storage.exists("k").await.unwrap());
		assert!(matches!(
			storage.get_bytes("k").await,
			Err(StorageError::NotFound)
		));
	}

	#[tokio::test(start_paused = true)]
	async fn test_cleanup_expired_counts_removed() {
		let storage = MemoryStorage::new();
		storage
			.set_bytes("short", b"1".to_vec(), Some(Duration::from_secs(5)))
			.await
			.unwrap();
		storage
			.set_bytes("long", b"2".to_vec(), Some(Duration::from_secs(500)))
			.await
			.unwrap();
		storage.set_bytes("forever", b"3".to_vec(), None).await.unwrap();

		tokio::time::advance(Duration::from_secs(6)).await;
		assert_eq!(storage.cleanup_expired().await.unwrap(), 1);
		assert_eq!(storage.cleanup_expired().await.unwrap(), 0);
		assert!(storage.exists("long").await.unwrap());
		assert!(storage.exists("forever").await.unwrap());
	}

	#[tokio::test]
	async fn test_overwrite_resets_ttl() {
		let storage = MemoryStorage::new();
		storage
			.set_bytes("k", b"old".to_vec(), Some(Duration::from_secs(1)))
			.await
			.unwrap();
		storage.set_bytes("k", b"new".to_vec(), None).await.unwrap();
		assert_eq!(storage.get_bytes("k").await.unwrap(), b"new".to_vec());
	}

	#[tokio::test(start_paused = true)]
	async fn test_capacity_limit_evicts_soonest_expiry() {
		let storage = MemoryStorage::with_capacity_limit(2);
		storage
			.set_bytes("a", b"1".to_vec(), Some(Duration::from_secs(100)))
			.await
			.unwrap();
		storage
			.set_bytes("b", b"2".to_vec(), Some(Duration::from_secs(10)))
			.await
			.unwrap();
		storage
			.set_bytes("c", b"3".to_vec(), Some(Duration::from_secs(50)))
			.await
			.unwrap();

		assert!(storage.exists("a").await.unwrap());
		assert!(!storage.exists("b").await.unwrap());
		assert!(storage.exists("c").await.unwrap());
	}

	#[test]
	fn test_factory_validates_config() {
		let bad: toml::Value = toml::from_str("max_entries = 0").unwrap();
		assert!(matches!(
			create_storage(&bad),
			Err(StorageError::Configuration(_))
		));

		let good: toml::Value = toml::from_str("max_entries = 100").unwrap();
		assert!(create_storage(&good).is_ok());
	}
}
