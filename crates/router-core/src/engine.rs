//! Assembled router components.

use crate::RoutePlanner;
use router_config::Config;
use router_storage::StorageService;
use std::sync::Arc;
use std::time::Duration;
use tokio::task::JoinHandle;

/// Planner, response cache and the configuration they were built from.
pub struct RouterEngine {
	config: Config,
	planner: Arc<RoutePlanner>,
	cache: Arc<StorageService>,
}

impl RouterEngine {
	pub fn new(config: Config, planner: Arc<RoutePlanner>, cache: Arc<StorageService>) -> Self {
		Self {
			config,
			planner,
			cache,
		}
	}

	/// Returns a reference to the configuration.
	pub fn config(&self) -> &Config {
		&self.config
	}

	/// Returns the route planner.
	pub fn planner(&self) -> &Arc<RoutePlanner> {
		&self.planner
	}

	/// Returns the response cache.
	pub fn cache(&self) -> &Arc<StorageService> {
		&self.cache
	}

	/// Spawns the periodic purge of expired cache entries.
	///
	/// The task runs until the returned handle is aborted.
	pub fn spawn_cache_cleanup(&self) -> JoinHandle<()> {
		let cache = self.cache.clone();
		let period = Duration::from_secs(self.config.cache.cleanup_interval_seconds);
		tokio::spawn(async move {
			let mut interval = tokio::time::interval(period);
			loop {
				interval.tick().await;
				match cache.cleanup_expired().await {
					Ok(0) => {},
					Ok(count) => {
						tracing::debug!(removed = count, "Cache cleanup");
					},
					Err(e) => {
						tracing::warn!(error = %e, "Cache cleanup failed");
					},
				}
			}
		})
	}
}
