//! Bridge Route API Implementation
//!
//! This module implements `GET /api/bridge-route`. The raw query string is
//! validated into a [`RouteQuery`], repeated requests are answered from the
//! response cache, and everything else goes through the route planner under
//! the request timeout.

use router_core::{PlannerError, RouterEngine};
use router_types::{normalize_address, truncate_id, APIError, RouteQuery, RouteResponse};
use rust_decimal::Decimal;
use serde::Deserialize;
use sha3::{Digest, Keccak256};
use std::str::FromStr;
use std::time::Duration;
use thiserror::Error;
use tracing::Instrument;
use uuid::Uuid;

/// Storage namespace of cached route responses.
pub const CACHE_NAMESPACE: &str = "bridge-route";

/// Query string of a bridge-route request, before validation.
#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RawRouteQuery {
	pub chain_id: Option<String>,
	pub token_address: Option<String>,
	pub amount: Option<String>,
	pub user_address: Option<String>,
	pub symbol: Option<String>,
}

/// Errors that can occur while serving a bridge-route request.
#[derive(Debug, Error)]
pub enum RouteError {
	#[error("Missing required parameters")]
	MissingParameters,
	#[error("Invalid parameter types")]
	InvalidParameterTypes,
	#[error("Invalid or missing amount")]
	InvalidAmount,
	#[error(transparent)]
	Planner(#[from] PlannerError),
	#[error("Route planning did not finish within {0} seconds")]
	Timeout(u64),
}

impl From<RouteError> for APIError {
	fn from(err: RouteError) -> Self {
		let message = err.to_string();
		match err {
			RouteError::MissingParameters => bad_request("MISSING_PARAMETERS", message),
			RouteError::InvalidParameterTypes => bad_request("INVALID_PARAMETER_TYPES", message),
			RouteError::InvalidAmount => bad_request("INVALID_AMOUNT", message),
			RouteError::Planner(PlannerError::InvalidInput(_)) => {
				bad_request("INVALID_INPUT", message)
			},
			RouteError::Planner(PlannerError::AmountOverflow(_)) => {
				bad_request("AMOUNT_OVERFLOW", message)
			},
			RouteError::Planner(PlannerError::BalanceProvider(_)) => APIError::BadGateway {
				error_type: "PROVIDER_ERROR".to_string(),
				message,
			},
			RouteError::Planner(PlannerError::TooManyCandidates { count, limit }) => {
				APIError::UnprocessableEntity {
					error_type: "TOO_MANY_CANDIDATES".to_string(),
					message,
					details: Some(serde_json::json!({ "count": count, "limit": limit })),
				}
			},
			RouteError::Planner(PlannerError::SearchBudgetExceeded { limit }) => {
				APIError::UnprocessableEntity {
					error_type: "SEARCH_BUDGET_EXCEEDED".to_string(),
					message,
					details: Some(serde_json::json!({ "limit": limit })),
				}
			},
			RouteError::Planner(PlannerError::Optimizer(_)) => APIError::InternalServerError {
				error_type: "OPTIMIZER_ERROR".to_string(),
				message,
			},
			RouteError::Planner(PlannerError::Internal(_)) => APIError::InternalServerError {
				error_type: "INTERNAL_ERROR".to_string(),
				message,
			},
			RouteError::Timeout(_) => APIError::GatewayTimeout {
				error_type: "TIMEOUT".to_string(),
				message,
				retry_after: None,
			},
		}
	}
}

fn bad_request(error_type: &str, message: String) -> APIError {
	APIError::BadRequest {
		error_type: error_type.to_string(),
		message,
		details: None,
	}
}

/// Processes a bridge-route request.
pub async fn process_route_request(
	raw: RawRouteQuery,
	engine: &RouterEngine,
	request_timeout: Duration,
) -> Result<RouteResponse, RouteError> {
	let query = parse_query(&raw)?;

	let span = tracing::info_span!(
		"bridge_route",
		request_id = %Uuid::new_v4(),
		chain_id = query.chain_id,
		user = %truncate_id(&query.user_address),
	);
	plan_cached(&query, engine, request_timeout)
		.instrument(span)
		.await
}

async fn plan_cached(
	query: &RouteQuery,
	engine: &RouterEngine,
	request_timeout: Duration,
) -> Result<RouteResponse, RouteError> {
	let key = cache_key(query);
	let cache = engine.cache();

	match cache
		.retrieve_optional::<RouteResponse>(CACHE_NAMESPACE, &key)
		.await
	{
		Ok(Some(response)) => {
			tracing::debug!(key = %truncate_id(&key), "Serving cached route");
			return Ok(response);
		},
		Ok(None) => {},
		Err(e) => {
			tracing::warn!(error = %e, "Cache lookup failed");
		},
	}

	let response = tokio::time::timeout(request_timeout, engine.planner().plan(query))
		.await
		.map_err(|_| RouteError::Timeout(request_timeout.as_secs()))??;

	let ttl = Duration::from_secs(engine.config().cache.ttl_seconds);
	if let Err(e) = cache
		.store_with_ttl(CACHE_NAMESPACE, &key, &response, Some(ttl))
		.await
	{
		tracing::warn!(error = %e, "Failed to cache route response");
	}

	Ok(response)
}

/// Validates the raw query string.
///
/// Empty values count as missing. `chainId` must be an unsigned integer and
/// `amount` a decimal number (plain or scientific notation) above zero.
pub fn parse_query(raw: &RawRouteQuery) -> Result<RouteQuery, RouteError> {
	let (Some(chain_id), Some(token_address), Some(amount), Some(user_address)) = (
		present(&raw.chain_id),
		present(&raw.token_address),
		present(&raw.amount),
		present(&raw.user_address),
	) else {
		return Err(RouteError::MissingParameters);
	};

	let chain_id = chain_id
		.parse::<u64>()
		.map_err(|_| RouteError::InvalidParameterTypes)?;
	let amount = Decimal::from_str(amount)
		.or_else(|_| Decimal::from_scientific(amount))
		.map_err(|_| RouteError::InvalidParameterTypes)?;
	if amount <= Decimal::ZERO {
		return Err(RouteError::InvalidAmount);
	}

	Ok(RouteQuery {
		chain_id,
		token_address: token_address.to_string(),
		amount,
		user_address: user_address.to_string(),
		symbol: present(&raw.symbol).map(str::to_string),
	})
}

fn present(value: &Option<String>) -> Option<&str> {
	value.as_deref().map(str::trim).filter(|v| !v.is_empty())
}

/// Cache id of a validated query: keccak256 over its normalized fields, hex encoded.
///
/// Addresses and the symbol are compared case-insensitively.
pub fn cache_key(query: &RouteQuery) -> String {
	let fingerprint = format!(
		"{}|{}|{}|{}|{}",
		query.chain_id,
		normalize_address(&query.token_address),
		query.amount.normalize(),
		normalize_address(&query.user_address),
		query
			.symbol
			.as_deref()
			.map(|symbol| symbol.trim().to_uppercase())
			.unwrap_or_default(),
	);
	hex::encode(Keccak256::digest(fingerprint.as_bytes()))
}
