//! Socket bridge aggregator gateway.
//!
//! Talks to the Socket v2 REST API: `/balances` for the user's holdings and
//! `/quote` for bridge routes. Provider bodies are parsed into private wire
//! structs and converted into domain types, rejecting anything that breaks a
//! quote invariant.

use crate::{GatewayError, GatewayFactory, GatewayRegistry, QuoteGateway};
use async_trait::async_trait;
use router_types::{
	from_smallest_units, Balance, ConfigSchema, Field, FieldType, ImplementationRegistry, Quote,
	QuoteRequest, Schema, SecretString, ValidationError,
};
use rust_decimal::Decimal;
use serde::Deserialize;
use std::time::Duration;

const API_KEY_HEADER: &str = "API-KEY";

/// Longest provider error body echoed into a `GatewayError`.
const MAX_ERROR_BODY: usize = 512;

/// Configuration of the Socket gateway.
#[derive(Debug, Clone, Deserialize)]
pub struct SocketConfig {
	/// API root, e.g. `https://api.socket.tech/v2`.
	pub base_url: String,
	/// Key sent in the `API-KEY` header; omitted when empty.
	#[serde(default)]
	pub api_key: Option<SecretString>,
	/// Per-call timeout in seconds.
	#[serde(default = "default_timeout_seconds")]
	pub timeout_seconds: u64,
}

fn default_timeout_seconds() -> u64 {
	30
}

/// Gateway backed by the Socket REST API.
pub struct SocketGateway {
	client: reqwest::Client,
	base_url: String,
	api_key: Option<SecretString>,
}

impl SocketGateway {
	/// Builds the HTTP client for the given configuration.
	pub fn new(config: SocketConfig) -> Result<Self, GatewayError> {
		let client = reqwest::Client::builder()
			.timeout(Duration::from_secs(config.timeout_seconds))
			.build()
			.map_err(|e| GatewayError::Configuration(format!("Failed to build client: {}", e)))?;

		Ok(Self {
			client,
			base_url: config.base_url.trim_end_matches('/').to_string(),
			api_key: config.api_key.filter(|key| !key.is_empty()),
		})
	}

	async fn get(&self, path: &str, query: &[(&str, String)]) -> Result<Vec<u8>, GatewayError> {
		let url = format!("{}/{}", self.base_url, path);
		let mut request = self.client.get(&url).query(query);
		if let Some(key) = &self.api_key {
			request = request.header(API_KEY_HEADER, key.expose_secret());
		}

		let response = request.send().await?;
		let status = response.status();
		let body = response.bytes().await?;

		if !status.is_success() {
			let text: String = String::from_utf8_lossy(&body)
				.chars()
				.take(MAX_ERROR_BODY)
				.collect();
			tracing::debug!(%url, status = status.as_u16(), "Provider request failed");
			return Err(GatewayError::Http {
				status: status.as_u16(),
				body: text,
			});
		}

		Ok(body.to_vec())
	}
}

#[derive(Debug, Deserialize)]
struct Envelope<T> {
	#[serde(default = "default_success")]
	success: bool,
	result: Option<T>,
	#[serde(default)]
	message: Option<String>,
}

fn default_success() -> bool {
	true
}

impl<T> Envelope<T> {
	fn into_result(self, what: &str) -> Result<T, GatewayError> {
		if !self.success {
			return Err(GatewayError::Provider(
				self.message
					.unwrap_or_else(|| format!("{} request reported failure", what)),
			));
		}
		self.result
			.ok_or_else(|| GatewayError::InvalidResponse(format!("{} response has no result", what)))
	}
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct WireBalance {
	chain_id: u64,
	address: String,
	#[serde(default)]
	chain_agnostic_id: Option<String>,
	#[serde(default)]
	symbol: Option<String>,
	decimals: u32,
	amount: Decimal,
}

impl WireBalance {
	fn into_balance(self) -> Result<Balance, GatewayError> {
		if self.amount < Decimal::ZERO {
			return Err(GatewayError::InvalidResponse(format!(
				"Negative balance {} for {} on chain {}",
				self.amount, self.address, self.chain_id
			)));
		}
		let chain_agnostic_symbol = self
			.chain_agnostic_id
			.clone()
			.or_else(|| self.symbol.clone())
			.unwrap_or_default();

		Ok(Balance {
			chain_id: self.chain_id,
			token_address: self.address,
			chain_agnostic_symbol,
			symbol: self.symbol,
			amount: self.amount,
			decimals: self.decimals,
		})
	}
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct WireQuoteResult {
	#[serde(default)]
	routes: Vec<WireRoute>,
	#[serde(default)]
	from_asset: Option<WireAsset>,
	#[serde(default)]
	to_asset: Option<WireAsset>,
}

#[derive(Debug, Deserialize)]
struct WireAsset {
	decimals: u32,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct WireRoute {
	route_id: String,
	from_amount: Decimal,
	to_amount: Decimal,
	#[serde(default)]
	used_bridge_names: Vec<String>,
	total_gas_fees_in_usd: Decimal,
}

/// Parses a `/balances` body into domain balances.
pub(crate) fn parse_balances(body: &[u8]) -> Result<Vec<Balance>, GatewayError> {
	let envelope: Envelope<Vec<WireBalance>> = serde_json::from_slice(body)
		.map_err(|e| GatewayError::InvalidResponse(format!("Malformed balances body: {}", e)))?;

	envelope
		.into_result("Balances")?
		.into_iter()
		.map(WireBalance::into_balance)
		.collect()
}

/// Parses a `/quote` body into normalized quotes for `request`.
///
/// Asset decimals reported by the provider take precedence over the ones
/// carried by the request.
pub(crate) fn parse_quotes(body: &[u8], request: &QuoteRequest) -> Result<Vec<Quote>, GatewayError> {
	let envelope: Envelope<WireQuoteResult> = serde_json::from_slice(body)
		.map_err(|e| GatewayError::InvalidResponse(format!("Malformed quote body: {}", e)))?;
	let result = envelope.into_result("Quote")?;

	let from_decimals = result
		.from_asset
		.map_or(request.from_decimals, |asset| asset.decimals);
	let to_decimals = result
		.to_asset
		.map_or(request.to_decimals, |asset| asset.decimals);

	result
		.routes
		.into_iter()
		.map(|route| {
			let scale_error = || {
				GatewayError::InvalidResponse(format!(
					"Route {} amounts cannot be scaled",
					route.route_id
				))
			};
			let quote = Quote {
				from_chain_id: request.from_chain_id,
				to_chain_id: request.to_chain_id,
				from_amount: from_smallest_units(route.from_amount, from_decimals)
					.ok_or_else(scale_error)?,
				to_amount: from_smallest_units(route.to_amount, to_decimals)
					.ok_or_else(scale_error)?,
				bridge_name: route.used_bridge_names.join(", "),
				fee_usd: route.total_gas_fees_in_usd,
				route_id: route.route_id,
			};
			quote
				.validate()
				.map_err(|e| GatewayError::InvalidResponse(e.to_string()))?;
			Ok(quote)
		})
		.collect()
}

/// Renders a smallest-unit amount as an integer string for the wire.
fn wire_amount(amount: Decimal) -> String {
	amount.trunc().normalize().to_string()
}

#[async_trait]
impl QuoteGateway for SocketGateway {
	fn config_schema(&self) -> Box<dyn ConfigSchema> {
		Box::new(SocketGatewaySchema)
	}

	async fn fetch_user_balances(&self, user_address: &str) -> Result<Vec<Balance>, GatewayError> {
		let body = self
			.get("balances", &[("userAddress", user_address.to_string())])
			.await?;
		let balances = parse_balances(&body)?;
		tracing::debug!(user = %user_address, count = balances.len(), "Fetched balances");
		Ok(balances)
	}

	async fn get_quotes(&self, request: &QuoteRequest) -> Result<Vec<Quote>, GatewayError> {
		let query = [
			("fromChainId", request.from_chain_id.to_string()),
			("fromTokenAddress", request.from_token_address.clone()),
			("toChainId", request.to_chain_id.to_string()),
			("toTokenAddress", request.to_token_address.clone()),
			("fromAmount", wire_amount(request.from_amount)),
			("userAddress", request.user_address.clone()),
			("uniqueRoutesPerBridge", "true".to_string()),
			("sort", "output".to_string()),
		];
		let body = self.get("quote", &query).await?;
		parse_quotes(&body, request)
	}
}

/// Configuration schema for the Socket gateway.
pub struct SocketGatewaySchema;

impl ConfigSchema for SocketGatewaySchema {
	fn validate(&self, config: &toml::Value) -> Result<(), ValidationError> {
		let schema = Schema::new(
			vec![Field::new("base_url", FieldType::Url)],
			vec![
				Field::new("api_key", FieldType::String),
				Field::new(
					"timeout_seconds",
					FieldType::Integer {
						min: Some(1),
						max: None,
					},
				),
			],
		);
		schema.validate(config)
	}
}

/// Factory function to create a Socket gateway from configuration.
///
/// Configuration parameters:
/// - `base_url`: API root
/// - `api_key` (optional): value of the `API-KEY` header
/// - `timeout_seconds` (optional): per-call timeout, default 30
pub fn create_gateway(config: &toml::Value) -> Result<Box<dyn QuoteGateway>, GatewayError> {
	SocketGatewaySchema
		.validate(config)
		.map_err(|e| GatewayError::Configuration(e.to_string()))?;

	let config: SocketConfig = config
		.clone()
		.try_into()
		.map_err(|e: toml::de::Error| GatewayError::Configuration(e.to_string()))?;

	Ok(Box::new(SocketGateway::new(config)?))
}

/// Registry for the Socket gateway implementation.
pub struct Registry;

impl ImplementationRegistry for Registry {
	const NAME: &'static str = "socket";
	type Factory = GatewayFactory;

	fn factory() -> Self::Factory {
		create_gateway
	}
}

impl GatewayRegistry for Registry {}
