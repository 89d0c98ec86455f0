//! Quote gateway module for the bridge router.
//!
//! The gateway is the only component that talks to the outside world. It
//! fetches a user's token balances and asks a bridge aggregator for priced
//! routes, returning both as validated domain types. Implementations are
//! selected by name from `[provider.implementations]`.

use async_trait::async_trait;
use router_types::{Balance, ConfigSchema, ImplementationRegistry, Quote, QuoteRequest};
use thiserror::Error;

/// Re-export implementations
pub mod implementations {
	pub mod mock;
	pub mod socket;
}

/// Errors that can occur while talking to a provider.
#[derive(Debug, Error)]
pub enum GatewayError {
	/// The request could not be sent or the connection failed.
	#[error("Network error: {0}")]
	Network(String),
	/// The provider answered with a non-success HTTP status.
	#[error("Provider returned HTTP {status}: {body}")]
	Http { status: u16, body: String },
	/// The provider reported failure in an otherwise well-formed body.
	#[error("Provider error: {0}")]
	Provider(String),
	/// The body could not be parsed or violates an invariant.
	#[error("Invalid response: {0}")]
	InvalidResponse(String),
	/// Error that occurs when configuration is invalid.
	#[error("Configuration error: {0}")]
	Configuration(String),
}

impl From<reqwest::Error> for GatewayError {
	fn from(err: reqwest::Error) -> Self {
		if err.is_decode() {
			GatewayError::InvalidResponse(err.to_string())
		} else {
			GatewayError::Network(err.to_string())
		}
	}
}

/// Outbound balance and route quoting.
///
/// Implementations must be callable concurrently; the candidate builder
/// issues one `get_quotes` per source balance in parallel.
#[async_trait]
pub trait QuoteGateway: Send + Sync {
	/// Returns the configuration schema for this implementation.
	fn config_schema(&self) -> Box<dyn ConfigSchema>;

	/// Fetches every token balance held by `user_address`.
	async fn fetch_user_balances(&self, user_address: &str) -> Result<Vec<Balance>, GatewayError>;

	/// Fetches bridge routes for moving `request.from_amount` to the destination.
	///
	/// Returned quotes are normalized to human units and already validated.
	async fn get_quotes(&self, request: &QuoteRequest) -> Result<Vec<Quote>, GatewayError>;
}

/// Type alias for gateway factory functions.
pub type GatewayFactory = fn(&toml::Value) -> Result<Box<dyn QuoteGateway>, GatewayError>;

/// Registry trait for gateway implementations.
pub trait GatewayRegistry: ImplementationRegistry<Factory = GatewayFactory> {}

/// Get all registered gateway implementations.
///
/// Returns a vector of (name, factory) tuples for all available gateways.
pub fn get_all_implementations() -> Vec<(&'static str, GatewayFactory)> {
	use implementations::{mock, socket};

	vec![
		(socket::Registry::NAME, socket::Registry::factory()),
		(mock::Registry::NAME, mock::Registry::factory()),
	]
}
