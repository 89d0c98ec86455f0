//! Redis storage backend.
//!
//! Lets several router instances share one response cache. Expiry is left to
//! Redis itself (`SET .. EX`), so `cleanup_expired` has nothing to do. The
//! connection is opened on first use and re-established by the connection
//! manager after failures.

use crate::{StorageError, StorageFactory, StorageInterface, StorageRegistry};
use async_trait::async_trait;
use redis::aio::ConnectionManager;
use redis::AsyncCommands;
use router_types::{
	ConfigSchema, Field, FieldType, ImplementationRegistry, Schema, ValidationError,
};
use std::time::Duration;
use tokio::sync::OnceCell;

/// Redis-backed storage.
pub struct RedisStorage {
	client: redis::Client,
	connection: OnceCell<ConnectionManager>,
	/// Prepended to every key as `prefix:key`.
	key_prefix: Option<String>,
}

impl RedisStorage {
	/// Creates a RedisStorage for `url`. No connection is made yet.
	pub fn new(url: &str, key_prefix: Option<String>) -> Result<Self, StorageError> {
		let client = redis::Client::open(url)
			.map_err(|e| StorageError::Configuration(format!("Invalid redis url: {}", e)))?;
		Ok(Self {
			client,
			connection: OnceCell::new(),
			key_prefix,
		})
	}

	fn key(&self, key: &str) -> String {
		match &self.key_prefix {
			Some(prefix) => format!("{}:{}", prefix, key),
			None => key.to_string(),
		}
	}

	async fn connection(&self) -> Result<ConnectionManager, StorageError> {
		self.connection
			.get_or_try_init(|| async {
				tracing::debug!("Opening redis connection");
				self.client.get_connection_manager().await
			})
			.await
			.cloned()
			.map_err(backend_error)
	}
}

fn backend_error(err: redis::RedisError) -> StorageError {
	StorageError::Backend(err.to_string())
}

/// Whole seconds for `SET .. EX`, rounded up. Redis rejects an expiry of zero.
fn expiry_seconds(ttl: Duration) -> u64 {
	let secs = ttl.as_secs() + u64::from(ttl.subsec_nanos() > 0);
	secs.max(1)
}

#[async_trait]
impl StorageInterface for RedisStorage {
	async fn get_bytes(&self, key: &str) -> Result<Vec<u8>, StorageError> {
		let mut conn = self.connection().await?;
		let value: Option<Vec<u8>> = conn.get(self.key(key)).await.map_err(backend_error)?;
		value.ok_or(StorageError::NotFound)
	}

	async fn set_bytes(
		&self,
		key: &str,
		value: Vec<u8>,
		ttl: Option<Duration>,
	) -> Result<(), StorageError> {
		let mut conn = self.connection().await?;
		let key = self.key(key);
		match ttl {
			Some(ttl) => conn
				.set_ex::<_, _, ()>(key, value, expiry_seconds(ttl))
				.await
				.map_err(backend_error),
			None => conn.set::<_, _, ()>(key, value).await.map_err(backend_error),
		}
	}

	async fn delete(&self, key: &str) -> Result<(), StorageError> {
		let mut conn = self.connection().await?;
		conn.del::<_, ()>(self.key(key)).await.map_err(backend_error)
	}

	async fn exists(&self, key: &str) -> Result<bool, StorageError> {
		let mut conn = self.connection().await?;
		conn.exists::<_, bool>(self.key(key))
			.await
			.map_err(backend_error)
	}

	fn config_schema(&self) -> Box<dyn ConfigSchema> {
		Box::new(RedisStorageSchema)
	}
}

/// Configuration schema for RedisStorage.
pub struct RedisStorageSchema;

impl ConfigSchema for RedisStorageSchema {
	fn validate(&self, config: &toml::Value) -> Result<(), ValidationError> {
		let schema = Schema::new(
			vec![Field::new("url", FieldType::String).with_validator(|value| {
				let url = value.as_str().unwrap_or_default();
				if url.starts_with("redis://") || url.starts_with("rediss://") {
					Ok(())
				} else {
					Err("must start with redis:// or rediss://".to_string())
				}
			})],
			vec![Field::new("key_prefix", FieldType::String)],
		);
		schema.validate(config)
	}
}

/// Factory function to create a redis storage backend from configuration.
///
/// Configuration parameters:
/// - `url` (required): `redis://` or `rediss://` connection url
/// - `key_prefix` (optional): namespace prepended to every key
pub fn create_storage(config: &toml::Value) -> Result<Box<dyn StorageInterface>, StorageError> {
	RedisStorageSchema
		.validate(config)
		.map_err(|e| StorageError::Configuration(e.to_string()))?;

	let url = config
		.get("url")
		.and_then(|v| v.as_str())
		.ok_or_else(|| StorageError::Configuration("url is required".to_string()))?;
	let key_prefix = config
		.get("key_prefix")
		.and_then(|v| v.as_str())
		.map(str::to_string);

	Ok(Box::new(RedisStorage::new(url, key_prefix)?))
}

/// Registry for the redis storage implementation.
pub struct Registry;

impl ImplementationRegistry for Registry {
	const NAME: &'static str = "redis";
	type Factory = StorageFactory;

	fn factory() -> Self::Factory {
		create_storage
	}
}

impl StorageRegistry for Registry {}

#[cfg(test)]
mod tests {
	use super::*;

	fn parse(input: &str) -> toml::Value {
		toml::Value::Table(toml::from_str(input).unwrap())
	}

	#[test]
	fn test_schema_requires_redis_url() {
		assert!(RedisStorageSchema
			.validate(&parse(r#"key_prefix = "router""#))
			.is_err());

		let err = RedisStorageSchema
			.validate(&parse(r#"url = "http://localhost:6379""#))
			.unwrap_err();
		assert!(err.to_string().contains("url"));

		assert!(RedisStorageSchema
			.validate(&parse(r#"url = "rediss://cache.internal:6380""#))
			.is_ok());
	}

	#[test]
	fn test_factory_does_not_connect() {
		let config = parse(
			r#"
url = "redis://127.0.0.1:6379"
key_prefix = "bridge-router"
"#,
		);
		assert!(create_storage(&config).is_ok());
		assert!(create_storage(&parse("key_prefix = \"x\"")).is_err());
	}

	#[test]
	fn test_keys_are_prefixed() {
		let storage =
			RedisStorage::new("redis://127.0.0.1:6379", Some("bridge-router".to_string()))
				.unwrap();
		assert_eq!(storage.key("bridge-route:abc"), "bridge-router:bridge-route:abc");

		let bare = RedisStorage::new("redis://127.0.0.1:6379", None).unwrap();
		assert_eq!(bare.key("bridge-route:abc"), "bridge-route:abc");
	}

	#[test]
	fn test_expiry_rounds_up() {
		assert_eq!(expiry_seconds(Duration::from_secs(3600)), 3600);
		assert_eq!(expiry_seconds(Duration::from_millis(1500)), 2);
		assert_eq!(expiry_seconds(Duration::ZERO), 1);
	}

	#[test]
	fn test_registry_name() {
		assert_eq!(Registry::NAME, "redis");
	}
}
