//! Configuration module for the bridge router.
//!
//! This module provides structures and utilities for managing router
//! configuration. It supports loading configuration from TOML files,
//! resolving `${VAR}` / `${VAR:-default}` environment references, and
//! validating that every referenced implementation is configured.
//!
//! ## Modular Configuration Support
//!
//! Configurations can be split into multiple files:
//! - Use `include = ["provider.toml", "cache.toml"]` to include other files
//! - Each top-level section must be unique across all files

mod loader;

use regex::Regex;
use router_types::OverflowStrategy;
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::path::Path;
use std::str::FromStr;
use thiserror::Error;

pub use loader::ConfigLoader;

/// Highest accepted optimizer ceiling.
pub const MAX_CANDIDATES_LIMIT: usize = 30;

/// Errors that can occur during configuration operations.
#[derive(Debug, Error)]
pub enum ConfigError {
	/// Error that occurs during file I/O operations.
	#[error("IO error: {0}")]
	Io(#[from] std::io::Error),
	/// Error that occurs when parsing TOML configuration.
	#[error("Configuration error: {0}")]
	Parse(String),
	/// Error that occurs when configuration validation fails.
	#[error("Validation error: {0}")]
	Validation(String),
}

impl From<toml::de::Error> for ConfigError {
	fn from(err: toml::de::Error) -> Self {
		// Keep the message, drop the echoed input
		ConfigError::Parse(err.message().to_string())
	}
}

/// Main configuration structure for the bridge router.
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct Config {
	/// Identity of this router instance.
	pub service: ServiceConfig,
	/// Destination token defaults.
	#[serde(default)]
	pub router: RouterConfig,
	/// Balance and quote provider configuration.
	pub provider: ProviderConfig,
	/// Route combination optimizer limits.
	#[serde(default)]
	pub optimizer: OptimizerConfig,
	/// Response cache configuration.
	pub cache: CacheConfig,
	/// Configuration for the HTTP API server.
	pub api: Option<ApiConfig>,
}

/// Identity of this router instance.
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct ServiceConfig {
	/// Unique identifier used in logs.
	pub id: String,
}

/// Defaults used when the destination token cannot be identified from balances.
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct RouterConfig {
	/// Chain-agnostic identity of the destination token when the user holds none of it.
	#[serde(default = "default_symbol")]
	pub default_symbol: String,
	/// Decimals of the destination token when the user holds none of it.
	#[serde(default = "default_decimals")]
	pub default_decimals: u32,
}

fn default_symbol() -> String {
	"USDC".to_string()
}

fn default_decimals() -> u32 {
	6
}

impl Default for RouterConfig {
	fn default() -> Self {
		Self {
			default_symbol: default_symbol(),
			default_decimals: default_decimals(),
		}
	}
}

/// Configuration of the balance/quote provider.
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct ProviderConfig {
	/// Which implementation to use as primary.
	pub primary: String,
	/// Map of provider implementation names to their configurations.
	pub implementations: HashMap<String, toml::Value>,
	/// Per-call timeout for outbound provider requests, in seconds.
	#[serde(default = "default_provider_timeout")]
	pub timeout_seconds: u64,
	/// Maximum number of quote requests in flight per route request.
	#[serde(default = "default_max_concurrent_requests")]
	pub max_concurrent_requests: usize,
}

fn default_provider_timeout() -> u64 {
	30
}

fn default_max_concurrent_requests() -> usize {
	8
}

/// Limits of the route combination optimizer.
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct OptimizerConfig {
	/// Largest candidate set searched exhaustively.
	#[serde(default = "default_max_candidates")]
	pub max_candidates: usize,
	/// Behaviour when the candidate set is larger than `max_candidates`.
	#[serde(default)]
	pub overflow_strategy: OverflowStrategy,
	/// Greedy fallback ignores routes moving this much or less.
	#[serde(default = "default_greedy_min_from_amount")]
	pub greedy_min_from_amount: Decimal,
	/// Branches the exhaustive search may visit before the overflow strategy applies.
	#[serde(default = "default_max_search_nodes")]
	pub max_search_nodes: u64,
}

fn default_max_candidates() -> usize {
	24
}

fn default_greedy_min_from_amount() -> Decimal {
	Decimal::new(1, 2) // 0.01
}

fn default_max_search_nodes() -> u64 {
	1_000_000
}

impl Default for OptimizerConfig {
	fn default() -> Self {
		Self {
			max_candidates: default_max_candidates(),
			overflow_strategy: OverflowStrategy::default(),
			greedy_min_from_amount: default_greedy_min_from_amount(),
			max_search_nodes: default_max_search_nodes(),
		}
	}
}

/// Configuration of the response cache.
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct CacheConfig {
	/// Which storage implementation backs the cache.
	pub primary: String,
	/// Map of storage implementation names to their configurations.
	pub implementations: HashMap<String, toml::Value>,
	/// Time-to-live of cached responses in seconds.
	#[serde(default = "default_cache_ttl")]
	pub ttl_seconds: u64,
	/// Interval in seconds for purging expired entries.
	#[serde(default = "default_cleanup_interval")]
	pub cleanup_interval_seconds: u64,
}

fn default_cache_ttl() -> u64 {
	3600
}

fn default_cleanup_interval() -> u64 {
	60
}

/// Configuration for the HTTP API server.
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct ApiConfig {
	/// Whether the API server is enabled.
	#[serde(default = "default_api_enabled")]
	pub enabled: bool,
	/// Host address to bind the server to.
	#[serde(default = "default_api_host")]
	pub host: String,
	/// Port to bind the server to.
	#[serde(default = "default_api_port")]
	pub port: u16,
	/// Upper bound on planning a single request, in seconds.
	#[serde(default = "default_api_timeout")]
	pub timeout_seconds: u64,
	/// CORS configuration; permissive when absent.
	pub cors: Option<CorsConfig>,
}

/// CORS configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct CorsConfig {
	/// Allowed origins for CORS.
	pub allowed_origins: Vec<String>,
}

fn default_api_enabled() -> bool {
	true
}

fn default_api_host() -> String {
	"127.0.0.1".to_string()
}

fn default_api_port() -> u16 {
	3000
}

fn default_api_timeout() -> u64 {
	30
}

impl Default for ApiConfig {
	fn default() -> Self {
		Self {
			enabled: default_api_enabled(),
			host: default_api_host(),
			port: default_api_port(),
			timeout_seconds: default_api_timeout(),
			cors: None,
		}
	}
}

/// Resolves environment variables in a string.
///
/// Replaces ${VAR_NAME} with the value of the environment variable VAR_NAME.
/// Supports default values with ${VAR_NAME:-default_value}.
///
/// Input strings are limited to 1MB.
pub(crate) fn resolve_env_vars(input: &str) -> Result<String, ConfigError> {
	const MAX_INPUT_SIZE: usize = 1024 * 1024;
	if input.len() > MAX_INPUT_SIZE {
		return Err(ConfigError::Validation(format!(
			"Configuration file too large: {} bytes (max: {} bytes)",
			input.len(),
			MAX_INPUT_SIZE
		)));
	}

	let re = Regex::new(r"\$\{([A-Z_][A-Z0-9_]{0,127})(?::-([^}]{0,256}))?\}")
		.map_err(|e| ConfigError::Parse(format!("Regex error: {}", e)))?;

	let mut missing = None;
	let resolved = re.replace_all(input, |caps: &regex::Captures| {
		let var_name = &caps[1];
		match (std::env::var(var_name), caps.get(2)) {
			(Ok(value), _) => value,
			(Err(_), Some(default)) => default.as_str().to_string(),
			(Err(_), None) => {
				missing.get_or_insert_with(|| var_name.to_string());
				String::new()
			},
		}
	});

	if let Some(var_name) = missing {
		return Err(ConfigError::Validation(format!(
			"Environment variable '{}' not found",
			var_name
		)));
	}

	Ok(resolved.into_owned())
}

impl Config {
	/// Loads configuration from a file, following `include` directives.
	pub async fn from_file(path: &str) -> Result<Self, ConfigError> {
		let path_buf = Path::new(path);
		let base_dir = path_buf.parent().unwrap_or_else(|| Path::new("."));

		let mut loader = ConfigLoader::new(base_dir);
		let file_name = path_buf
			.file_name()
			.ok_or_else(|| ConfigError::Validation(format!("Invalid path: {}", path)))?;
		loader.load_config(file_name).await
	}

	/// Minimal valid configuration backed by the mock provider and memory cache.
	#[cfg(any(test, feature = "testing"))]
	pub fn for_testing() -> Self {
		let mut provider_impls = HashMap::new();
		provider_impls.insert(
			"mock".to_string(),
			toml::Value::Table(toml::map::Map::new()),
		);
		let mut cache_impls = HashMap::new();
		cache_impls.insert(
			"memory".to_string(),
			toml::Value::Table(toml::map::Map::new()),
		);

		Self {
			service: ServiceConfig {
				id: "test-router".to_string(),
			},
			router: RouterConfig::default(),
			provider: ProviderConfig {
				primary: "mock".to_string(),
				implementations: provider_impls,
				timeout_seconds: default_provider_timeout(),
				max_concurrent_requests: default_max_concurrent_requests(),
			},
			optimizer: OptimizerConfig::default(),
			cache: CacheConfig {
				primary: "memory".to_string(),
				implementations: cache_impls,
				ttl_seconds: default_cache_ttl(),
				cleanup_interval_seconds: default_cleanup_interval(),
			},
			api: Some(ApiConfig::default()),
		}
	}

	/// Validates cross-field constraints that serde cannot express.
	fn validate(&self) -> Result<(), ConfigError> {
		if self.service.id.is_empty() {
			return Err(ConfigError::Validation("Service ID cannot be empty".into()));
		}

		// Router defaults
		if self.router.default_symbol.trim().is_empty() {
			return Err(ConfigError::Validation(
				"router.default_symbol cannot be empty".into(),
			));
		}
		if self.router.default_decimals > 28 {
			return Err(ConfigError::Validation(
				"router.default_decimals cannot exceed 28".into(),
			));
		}

		// Provider
		if self.provider.implementations.is_empty() {
			return Err(ConfigError::Validation(
				"At least one provider implementation must be configured".into(),
			));
		}
		if !self
			.provider
			.implementations
			.contains_key(&self.provider.primary)
		{
			return Err(ConfigError::Validation(format!(
				"Primary provider '{}' not found in implementations",
				self.provider.primary
			)));
		}
		if self.provider.timeout_seconds == 0 {
			return Err(ConfigError::Validation(
				"provider.timeout_seconds must be greater than 0".into(),
			));
		}
		if self.provider.max_concurrent_requests == 0 {
			return Err(ConfigError::Validation(
				"provider.max_concurrent_requests must be at least 1".into(),
			));
		}

		// Optimizer
		if self.optimizer.max_candidates == 0 {
			return Err(ConfigError::Validation(
				"optimizer.max_candidates must be at least 1".into(),
			));
		}
		if self.optimizer.max_candidates > MAX_CANDIDATES_LIMIT {
			return Err(ConfigError::Validation(format!(
				"optimizer.max_candidates cannot exceed {}",
				MAX_CANDIDATES_LIMIT
			)));
		}
		if self.optimizer.max_search_nodes == 0 {
			return Err(ConfigError::Validation(
				"optimizer.max_search_nodes must be at least 1".into(),
			));
		}
		if self.optimizer.greedy_min_from_amount < Decimal::ZERO {
			return Err(ConfigError::Validation(
				"optimizer.greedy_min_from_amount cannot be negative".into(),
			));
		}

		// Cache
		if !self.cache.implementations.contains_key(&self.cache.primary) {
			return Err(ConfigError::Validation(format!(
				"Primary cache '{}' not found in implementations",
				self.cache.primary
			)));
		}
		if self.cache.cleanup_interval_seconds == 0 {
			return Err(ConfigError::Validation(
				"cache.cleanup_interval_seconds must be greater than 0".into(),
			));
		}
		if self.cache.cleanup_interval_seconds > 86400 {
			return Err(ConfigError::Validation(
				"cache.cleanup_interval_seconds cannot exceed 86400 (24 hours)".into(),
			));
		}

		// API
		if let Some(ref api) = self.api {
			if api.enabled && api.timeout_seconds == 0 {
				return Err(ConfigError::Validation(
					"api.timeout_seconds must be greater than 0".into(),
				));
			}
		}

		Ok(())
	}
}

/// Parses a TOML string, resolving environment variables and validating the result.
impl FromStr for Config {
	type Err = ConfigError;

	fn from_str(s: &str) -> Result<Self, Self::Err> {
		let resolved = resolve_env_vars(s)?;
		let config: Config = toml::from_str(&resolved)?;
		config.validate()?;
		Ok(config)
	}
}
