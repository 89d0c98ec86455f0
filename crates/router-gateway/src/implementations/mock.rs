//! Mock gateway for development and testing.
//!
//! Serves balances and routes from configuration instead of the network.
//! A route's output is derived from the requested amount through a fixed
//! `output_ratio`, so the same config produces sensible quotes for any
//! shortfall.

use crate::{GatewayError, GatewayFactory, GatewayRegistry, QuoteGateway};
use async_trait::async_trait;
use router_types::{
	from_smallest_units, Balance, ConfigSchema, ImplementationRegistry, Quote, QuoteRequest,
	ValidationError,
};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

/// A balance served by the mock gateway.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MockBalance {
	pub chain_id: u64,
	pub token_address: String,
	pub chain_agnostic_symbol: String,
	pub amount: Decimal,
	pub decimals: u32,
}

/// A bridge route offered from `from_chain_id`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MockRoute {
	pub from_chain_id: u64,
	pub route_id: String,
	pub bridge_name: String,
	/// Fraction of the sent amount that arrives.
	#[serde(default = "default_output_ratio")]
	pub output_ratio: Decimal,
	pub fee_usd: Decimal,
}

fn default_output_ratio() -> Decimal {
	Decimal::ONE
}

/// Configuration for the mock gateway.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct MockGatewayConfig {
	#[serde(default)]
	pub balances: Vec<MockBalance>,
	#[serde(default)]
	pub routes: Vec<MockRoute>,
	/// Source chains whose quote requests fail.
	#[serde(default)]
	pub failing_chains: Vec<u64>,
}

impl ConfigSchema for MockGatewayConfig {
	fn validate(&self, _config: &toml::Value) -> Result<(), ValidationError> {
		if let Some(route) = self
			.routes
			.iter()
			.find(|r| r.fee_usd < Decimal::ZERO || r.output_ratio < Decimal::ZERO)
		{
			return Err(ValidationError::InvalidValue {
				field: format!("routes.{}", route.route_id),
				message: "fee_usd and output_ratio must be non-negative".to_string(),
			});
		}
		Ok(())
	}
}

/// Gateway answering from static configuration.
pub struct MockGateway {
	config: MockGatewayConfig,
}

impl MockGateway {
	pub fn new(config: MockGatewayConfig) -> Self {
		Self { config }
	}
}

#[async_trait]
impl QuoteGateway for MockGateway {
	fn config_schema(&self) -> Box<dyn ConfigSchema> {
		Box::new(self.config.clone())
	}

	async fn fetch_user_balances(&self, _user_address: &str) -> Result<Vec<Balance>, GatewayError> {
		Ok(self
			.config
			.balances
			.iter()
			.map(|b| Balance {
				chain_id: b.chain_id,
				token_address: b.token_address.clone(),
				chain_agnostic_symbol: b.chain_agnostic_symbol.clone(),
				symbol: Some(b.chain_agnostic_symbol.clone()),
				amount: b.amount,
				decimals: b.decimals,
			})
			.collect())
	}

	async fn get_quotes(&self, request: &QuoteRequest) -> Result<Vec<Quote>, GatewayError> {
		if self.config.failing_chains.contains(&request.from_chain_id) {
			return Err(GatewayError::Provider(format!(
				"Quotes unavailable from chain {}",
				request.from_chain_id
			)));
		}

		let from_amount = from_smallest_units(request.from_amount, request.from_decimals)
			.ok_or_else(|| GatewayError::InvalidResponse("Amount cannot be scaled".into()))?;

		self.config
			.routes
			.iter()
			.filter(|route| route.from_chain_id == request.from_chain_id)
			.map(|route| {
				let to_amount = from_amount
					.checked_mul(route.output_ratio)
					.ok_or_else(|| GatewayError::InvalidResponse("Output overflow".into()))?;
				let quote = Quote {
					from_chain_id: request.from_chain_id,
					to_chain_id: request.to_chain_id,
					route_id: route.route_id.clone(),
					from_amount,
					to_amount: to_amount.normalize(),
					bridge_name: route.bridge_name.clone(),
					fee_usd: route.fee_usd,
				};
				quote
					.validate()
					.map_err(|e| GatewayError::InvalidResponse(e.to_string()))?;
				Ok(quote)
			})
			.collect()
	}
}

/// Factory function to create a mock gateway from configuration.
pub fn create_gateway(config: &toml::Value) -> Result<Box<dyn QuoteGateway>, GatewayError> {
	let mock_config: MockGatewayConfig = config
		.clone()
		.try_into()
		.map_err(|e: toml::de::Error| GatewayError::Configuration(e.to_string()))?;
	mock_config
		.validate(config)
		.map_err(|e| GatewayError::Configuration(e.to_string()))?;

	Ok(Box::new(MockGateway::new(mock_config)))
}

/// Registry for the mock gateway implementation.
pub struct Registry;

impl ImplementationRegistry for Registry {
	const NAME: &'static str = "mock";
	type Factory = GatewayFactory;

	fn factory() -> Self::Factory {
		create_gateway
	}
}

impl GatewayRegistry for Registry {}
