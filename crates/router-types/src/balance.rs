//! Balance types for the bridge router.

use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use crate::utils::{normalize_address, to_smallest_units};

/// One holding of a token on one chain for one user.
///
/// Balances are immutable snapshots fetched once per request from the
/// balance provider. Amounts are expressed in human units.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Balance {
	/// Chain the balance lives on.
	pub chain_id: u64,
	/// Token contract address on that chain.
	pub token_address: String,
	/// Identity used to match the same asset across chains (e.g. "USDC").
	pub chain_agnostic_symbol: String,
	/// Chain-local symbol, informational only.
	#[serde(default, skip_serializing_if = "Option::is_none")]
	pub symbol: Option<String>,
	/// Amount held, in human units.
	pub amount: Decimal,
	/// Decimal places of the token on this chain.
	pub decimals: u32,
}

impl Balance {
	/// Returns true when this balance is the given token on the given chain.
	///
	/// Token addresses are compared case-insensitively.
	pub fn is_token(&self, chain_id: u64, token_address: &str) -> bool {
		self.chain_id == chain_id
			&& normalize_address(&self.token_address) == normalize_address(token_address)
	}

	/// Returns true when this balance represents the given chain-agnostic asset.
	pub fn is_same_asset(&self, chain_agnostic_symbol: &str) -> bool {
		self.chain_agnostic_symbol
			.eq_ignore_ascii_case(chain_agnostic_symbol)
	}

	/// The balance expressed in the token's smallest units.
	///
	/// Returns `None` if the scaled value does not fit in a `Decimal`.
	pub fn smallest_units(&self) -> Option<Decimal> {
		to_smallest_units(self.amount, self.decimals)
	}
}
