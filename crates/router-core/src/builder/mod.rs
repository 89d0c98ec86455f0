//! Builder for constructing a router engine from configuration.
//!
//! Implementations of the gateway and cache are looked up by name in the
//! supplied factory maps, so the binary decides which implementations exist
//! and the configuration decides which one is used.

use crate::{PlannerSettings, RoutePlanner, RouterEngine};
use router_config::Config;
use router_gateway::{GatewayError, QuoteGateway};
use router_storage::{StorageError, StorageInterface, StorageService};
use std::collections::HashMap;
use std::sync::Arc;
use thiserror::Error;

/// Errors that can occur during engine construction.
#[derive(Debug, Error)]
pub enum BuilderError {
	#[error("Configuration error: {0}")]
	Config(String),
}

/// Factory functions available to the builder, keyed by implementation name.
pub struct RouterFactories<GF, SF> {
	pub gateway_factories: HashMap<String, GF>,
	pub storage_factories: HashMap<String, SF>,
}

/// Builds a [`RouterEngine`] from configuration.
pub struct RouterBuilder {
	config: Config,
}

impl RouterBuilder {
	/// Creates a new RouterBuilder with the given configuration.
	pub fn new(config: Config) -> Self {
		Self { config }
	}

	/// Instantiates the primary gateway and cache and wires the planner.
	pub fn build<GF, SF>(
		self,
		factories: RouterFactories<GF, SF>,
	) -> Result<RouterEngine, BuilderError>
	where
		GF: Fn(&toml::Value) -> Result<Box<dyn QuoteGateway>, GatewayError>,
		SF: Fn(&toml::Value) -> Result<Box<dyn StorageInterface>, StorageError>,
	{
		let gateway = self.build_gateway(&factories.gateway_factories)?;
		let cache = self.build_cache(&factories.storage_factories)?;

		let settings = PlannerSettings::from(&self.config);
		let planner = Arc::new(RoutePlanner::new(Arc::from(gateway), settings));

		Ok(RouterEngine::new(
			self.config,
			planner,
			Arc::new(StorageService::new(cache)),
		))
	}

	fn build_gateway<GF>(
		&self,
		factories: &HashMap<String, GF>,
	) -> Result<Box<dyn QuoteGateway>, BuilderError>
	where
		GF: Fn(&toml::Value) -> Result<Box<dyn QuoteGateway>, GatewayError>,
	{
		let name = &self.config.provider.primary;
		let factory = factories.get(name).ok_or_else(|| {
			BuilderError::Config(format!("Unknown provider implementation '{}'", name))
		})?;
		let mut table = self
			.config
			.provider
			.implementations
			.get(name)
			.cloned()
			.ok_or_else(|| BuilderError::Config(format!("Provider '{}' is not configured", name)))?;

		// The provider-wide timeout applies unless the implementation sets its own.
		if let Some(table) = table.as_table_mut() {
			if !table.contains_key("timeout_seconds") {
				table.insert(
					"timeout_seconds".to_string(),
					toml::Value::Integer(self.config.provider.timeout_seconds as i64),
				);
			}
		}

		match factory(&table) {
			Ok(gateway) => {
				tracing::info!(component = "provider", implementation = %name, "Loaded");
				Ok(gateway)
			},
			Err(e) => {
				tracing::error!(
					component = "provider",
					implementation = %name,
					error = %e,
					"Failed to create provider implementation"
				);
				Err(BuilderError::Config(format!(
					"Failed to create provider implementation '{}': {}",
					name, e
				)))
			},
		}
	}

	fn build_cache<SF>(
		&self,
		factories: &HashMap<String, SF>,
	) -> Result<Box<dyn StorageInterface>, BuilderError>
	where
		SF: Fn(&toml::Value) -> Result<Box<dyn StorageInterface>, StorageError>,
	{
		let name = &self.config.cache.primary;
		let factory = factories.get(name).ok_or_else(|| {
			BuilderError::Config(format!("Unknown cache implementation '{}'", name))
		})?;
		let table = self
			.config
			.cache
			.implementations
			.get(name)
			.ok_or_else(|| BuilderError::Config(format!("Cache '{}' is not configured", name)))?;

		match factory(table) {
			Ok(cache) => {
				tracing::info!(component = "cache", implementation = %name, "Loaded");
				Ok(cache)
			},
			Err(e) => {
				tracing::error!(
					component = "cache",
					implementation = %name,
					error = %e,
					"Failed to create cache implementation"
				);
				Err(BuilderError::Config(format!(
					"Failed to create cache implementation '{}': {}",
					name, e
				)))
			},
		}
	}
}
