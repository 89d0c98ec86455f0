//! API types for the bridge router HTTP API.
//!
//! This module defines the validated route query, the route response
//! returned by `GET /api/bridge-route`, and the structured error type that
//! maps failures onto HTTP status codes.

use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use std::fmt;

use crate::Quote;

/// Validated parameters of a bridge-route request.
#[derive(Debug, Clone, PartialEq)]
pub struct RouteQuery {
	/// Chain the user wants to hold the funds on.
	pub chain_id: u64,
	/// Token address on the destination chain.
	pub token_address: String,
	/// Requested amount on the destination chain, in smallest units.
	pub amount: Decimal,
	/// User whose balances are considered.
	pub user_address: String,
	/// Optional chain-agnostic identity override (e.g. "USDC").
	pub symbol: Option<String>,
}

/// Outcome of a route request.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RouteStatus {
	/// One or more routes were selected.
	Bridged,
	/// The destination balance already covers the requested amount.
	NoBridgingRequired,
	/// No combination of available routes covers the shortfall.
	InsufficientLiquidity,
}

/// Response body of `GET /api/bridge-route`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RouteResponse {
	/// Selected routes, in candidate order.
	pub best_route: Vec<Quote>,
	/// Total fee in USD (zero when nothing is bridged).
	#[serde(with = "rust_decimal::serde::float")]
	pub total_fee: Decimal,
	/// Total amount arriving on the destination chain, in human units.
	#[serde(with = "rust_decimal::serde::float")]
	pub total_bridged: Decimal,
	/// Outcome discriminator.
	pub status: RouteStatus,
	/// Human-readable explanation of the outcome.
	#[serde(default, skip_serializing_if = "Option::is_none")]
	pub message: Option<String>,
}

/// API error response.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ErrorResponse {
	/// Error type/code
	pub error: String,
	/// Human-readable description
	pub message: String,
	/// Additional error context
	#[serde(skip_serializing_if = "Option::is_none")]
	pub details: Option<serde_json::Value>,
	/// Suggested retry delay in seconds
	#[serde(rename = "retryAfter", skip_serializing_if = "Option::is_none")]
	pub retry_after: Option<u64>,
}

/// Structured API error type with HTTP status mapping.
#[derive(Debug)]
pub enum APIError {
	/// Invalid or missing request parameters (400)
	BadRequest {
		error_type: String,
		message: String,
		details: Option<serde_json::Value>,
	},
	/// Request understood but cannot be planned (422)
	UnprocessableEntity {
		error_type: String,
		message: String,
		details: Option<serde_json::Value>,
	},
	/// Upstream provider failed (502)
	BadGateway { error_type: String, message: String },
	/// Planning did not finish in time (504)
	GatewayTimeout {
		error_type: String,
		message: String,
		retry_after: Option<u64>,
	},
	/// Internal server error (500)
	InternalServerError { error_type: String, message: String },
}

impl APIError {
	/// Get the HTTP status code for this error.
	pub fn status_code(&self) -> u16 {
		match self {
			APIError::BadRequest { .. } => 400,
			APIError::UnprocessableEntity { .. } => 422,
			APIError::BadGateway { .. } => 502,
			APIError::GatewayTimeout { .. } => 504,
			APIError::InternalServerError { .. } => 500,
		}
	}

	/// Convert to ErrorResponse for JSON serialization.
	pub fn to_error_response(&self) -> ErrorResponse {
		match self {
			APIError::BadRequest {
				error_type,
				message,
				details,
			}
			| APIError::UnprocessableEntity {
				error_type,
				message,
				details,
			} => ErrorResponse {
				error: error_type.clone(),
				message: message.clone(),
				details: details.clone(),
				retry_after: None,
			},
			APIError::GatewayTimeout {
				error_type,
				message,
				retry_after,
			} => ErrorResponse {
				error: error_type.clone(),
				message: message.clone(),
				details: None,
				retry_after: *retry_after,
			},
			APIError::BadGateway {
				error_type,
				message,
			}
			| APIError::InternalServerError {
				error_type,
				message,
			} => ErrorResponse {
				error: error_type.clone(),
				message: message.clone(),
				details: None,
				retry_after: None,
			},
		}
	}
}

impl fmt::Display for APIError {
	fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
		match self {
			APIError::BadRequest { message, .. } => write!(f, "Bad Request: {}", message),
			APIError::UnprocessableEntity { message, .. } => {
				write!(f, "Unprocessable Entity: {}", message)
			},
			APIError::BadGateway { message, .. } => write!(f, "Bad Gateway: {}", message),
			APIError::GatewayTimeout { message, .. } => write!(f, "Gateway Timeout: {}", message),
			APIError::InternalServerError { message, .. } => {
				write!(f, "Internal Server Error: {}", message)
			},
		}
	}
}

impl std::error::Error for APIError {}

impl axum::response::IntoResponse for APIError {
	fn into_response(self) -> axum::response::Response {
		use axum::{http::StatusCode, response::Json};

		let status = StatusCode::from_u16(self.status_code())
			.unwrap_or(StatusCode::INTERNAL_SERVER_ERROR);
		(status, Json(self.to_error_response())).into_response()
	}
}
