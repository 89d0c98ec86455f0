//! Bridge quote types.
//!
//! A [`Quote`] is one priced option for moving funds from a source chain to
//! the destination chain. Quotes are produced by the Quote Gateway from raw
//! provider routes and are immutable once constructed.

use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Errors raised when a quote violates its invariants.
#[derive(Debug, Error, PartialEq)]
pub enum QuoteValidationError {
	/// Output amount must be non-negative.
	#[error("Quote {route_id} has negative output amount {amount}")]
	NegativeOutput { route_id: String, amount: Decimal },
	/// Fee must be non-negative.
	#[error("Quote {route_id} has negative fee {fee}")]
	NegativeFee { route_id: String, fee: Decimal },
}

/// One priced bridging option to the destination chain/token.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Quote {
	/// Source chain of the transfer.
	pub from_chain_id: u64,
	/// Destination chain of the transfer.
	pub to_chain_id: u64,
	/// Opaque provider route identifier.
	pub route_id: String,
	/// Amount leaving the source chain, in human units.
	#[serde(with = "rust_decimal::serde::float")]
	pub from_amount: Decimal,
	/// Amount arriving on the destination chain, in human units.
	#[serde(with = "rust_decimal::serde::float")]
	pub to_amount: Decimal,
	/// Bridge (or comma-joined list of bridges) used by the route.
	pub bridge_name: String,
	/// Total fee of the route in USD.
	#[serde(with = "rust_decimal::serde::float")]
	pub fee_usd: Decimal,
}

impl Quote {
	/// Checks that output and fee are non-negative.
	pub fn validate(&self) -> Result<(), QuoteValidationError> {
		if self.to_amount < Decimal::ZERO {
			return Err(QuoteValidationError::NegativeOutput {
				route_id: self.route_id.clone(),
				amount: self.to_amount,
			});
		}
		if self.fee_usd < Decimal::ZERO {
			return Err(QuoteValidationError::NegativeFee {
				route_id: self.route_id.clone(),
				fee: self.fee_usd,
			});
		}
		Ok(())
	}
}

/// Parameters of a single outbound quote request.
#[derive(Debug, Clone, PartialEq)]
pub struct QuoteRequest {
	/// Chain the funds leave from.
	pub from_chain_id: u64,
	/// Chain the funds arrive on.
	pub to_chain_id: u64,
	/// Token address on the source chain.
	pub from_token_address: String,
	/// Token address on the destination chain.
	pub to_token_address: String,
	/// Amount to move, in the source token's smallest units.
	pub from_amount: Decimal,
	/// Source token decimals, used to normalize `fromAmount` of returned routes.
	pub from_decimals: u32,
	/// Destination token decimals, used to normalize `toAmount` of returned routes.
	pub to_decimals: u32,
	/// User initiating the transfer.
	pub user_address: String,
}

#[cfg(test)]
mod tests {
	use super::*;

	fn quote(to_amount: &str, fee: &str) -> Quote {
		Quote {
			from_chain_id: 10,
			to_chain_id: 137,
			route_id: "route-1".to_string(),
			from_amount: to_amount.parse().unwrap(),
			to_amount: to_amount.parse().unwrap(),
			bridge_name: "stargate, hop".to_string(),
			fee_usd: fee.parse().unwrap(),
		}
	}

	#[test]
	fn test_validate_accepts_zero_values() {
		assert!(quote("0", "0").validate().is_ok());
		assert!(quote("50", "1.25").validate().is_ok());
	}

	#[test]
	fn test_validate_rejects_negative_fee() {
		let err = quote("50", "-0.5").validate().unwrap_err();
		assert!(matches!(err, QuoteValidationError::NegativeFee { .. }));
	}

	#[test]
	fn test_validate_rejects_negative_output() {
		let err = quote("-1", "1").validate().unwrap_err();
		assert!(matches!(err, QuoteValidationError::NegativeOutput { .. }));
	}

	#[test]
	fn test_serializes_amounts_as_numbers() {
		let value = serde_json::to_value(quote("60", "5")).unwrap();
		assert_eq!(value["toAmount"], serde_json::json!(60.0));
		assert_eq!(value["feeUsd"], serde_json::json!(5.0));
		assert_eq!(value["bridgeName"], "stargate, hop");
	}
}
