//! Main entry point for the bridge router service.
//!
//! This binary loads the router configuration, wires the configured quote
//! provider and response cache into a route planner, and serves bridge
//! route requests over HTTP until interrupted.

use clap::Parser;
use router_config::Config;
use router_core::{BuilderError, RouterBuilder, RouterEngine, RouterFactories};
use std::path::PathBuf;
use std::sync::Arc;

mod apis;
mod server;

use router_gateway::implementations::mock::create_gateway as create_mock_gateway;
use router_gateway::implementations::socket::create_gateway as create_socket_gateway;
use router_storage::implementations::memory::create_storage as create_memory_storage;
use router_storage::implementations::redis::create_storage as create_redis_storage;

/// Command-line arguments for the bridge router.
#[derive(Parser, Debug)]
#[command(author, version, about, long_about = None)]
struct Args {
	/// Path to configuration file
	#[arg(short, long, default_value = "config.toml")]
	config: PathBuf,

	/// Log level (trace, debug, info, warn, error)
	#[arg(short, long, default_value = "info")]
	log_level: String,
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
	let args = Args::parse();

	use tracing_subscriber::{fmt, EnvFilter};

	// RUST_LOG takes precedence over --log-level
	let env_filter =
		EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(&args.log_level));

	fmt()
		.with_env_filter(env_filter)
		.with_thread_ids(true)
		.with_target(true)
		.init();

	tracing::info!("Started bridge router");

	let config = Config::from_file(&args.config.to_string_lossy()).await?;
	tracing::info!("Loaded configuration [{}]", config.service.id);

	let engine = Arc::new(build_router(config.clone())?);
	let cleanup = engine.spawn_cache_cleanup();

	let result = match config.api.clone().filter(|api| api.enabled) {
		Some(api_config) => {
			tokio::select! {
				result = server::start_server(api_config, Arc::clone(&engine)) => {
					tracing::info!("API server finished");
					result
				}
				_ = tokio::signal::ctrl_c() => {
					tracing::info!("Received shutdown signal");
					Ok(())
				}
			}
		},
		None => {
			tracing::warn!("API server is disabled; nothing to serve");
			Ok(())
		},
	};

	cleanup.abort();
	tracing::info!("Stopped bridge router");
	result
}

/// Macro to create a factory HashMap with the appropriate type aliases
macro_rules! create_factory_map {
    ($interface:path, $error:path, $( $name:literal => $factory:expr ),* $(,)?) => {{
        let mut factories = std::collections::HashMap::new();
        $(
            factories.insert(
                $name.to_string(),
                $factory as fn(&toml::Value) -> Result<Box<dyn $interface>, $error>
            );
        )*
        factories
    }};
}

/// Builds the router engine with every available implementation.
///
/// The configuration selects which provider and cache are instantiated.
fn build_router(config: Config) -> Result<RouterEngine, BuilderError> {
	let gateway_factories = create_factory_map!(
		router_gateway::QuoteGateway,
		router_gateway::GatewayError,
		"socket" => create_socket_gateway,
		"mock" => create_mock_gateway,
	);

	let storage_factories = create_factory_map!(
		router_storage::StorageInterface,
		router_storage::StorageError,
		"memory" => create_memory_storage,
		"redis" => create_redis_storage,
	);

	RouterBuilder::new(config).build(RouterFactories {
		gateway_factories,
		storage_factories,
	})
}
