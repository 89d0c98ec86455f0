//! Shortfall calculation.
//!
//! Compares what the user already holds on the destination chain with what
//! they asked for. The residual, in the destination token's smallest units,
//! is what has to be bridged in.

use crate::{PlannerError, PlannerSettings};
use router_types::{from_smallest_units, Balance, RouteQuery};
use rust_decimal::Decimal;

/// Identity and precision of the destination token.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DestinationProfile {
	/// Chain-agnostic symbol source balances must match.
	pub symbol: String,
	/// Decimals of the destination token.
	pub decimals: u32,
}

/// Result of comparing the destination balance with the requested amount.
#[derive(Debug, Clone, PartialEq)]
pub struct Shortfall {
	/// `requested - held`, in destination smallest units. May be negative.
	pub amount: Decimal,
	/// Destination token identity used to select and scale candidates.
	pub profile: DestinationProfile,
}

impl Shortfall {
	/// True when the destination balance does not already cover the request.
	pub fn requires_bridging(&self) -> bool {
		self.amount > Decimal::ZERO
	}

	/// The shortfall in human units, the optimizer's target.
	pub fn target(&self) -> Result<Decimal, PlannerError> {
		from_smallest_units(self.amount, self.profile.decimals).ok_or_else(|| {
			PlannerError::AmountOverflow(format!(
				"shortfall {} cannot be scaled by {} decimals",
				self.amount, self.profile.decimals
			))
		})
	}
}

/// Computes the shortfall for `query` against the user's balances.
///
/// The first balance on the destination chain whose token address matches
/// (case-insensitively) is the destination holding. When there is none the
/// whole requested amount is missing and the destination profile falls back
/// to the configured defaults. A `symbol` on the query overrides the
/// chain-agnostic identity in both cases.
pub fn calculate_shortfall(
	query: &RouteQuery,
	balances: &[Balance],
	settings: &PlannerSettings,
) -> Result<Shortfall, PlannerError> {
	let destination = balances
		.iter()
		.find(|balance| balance.is_token(query.chain_id, &query.token_address));

	let (held, mut profile) = match destination {
		Some(balance) => {
			let held = balance.smallest_units().ok_or_else(|| {
				PlannerError::AmountOverflow(format!(
					"destination balance {} with {} decimals is out of range",
					balance.amount, balance.decimals
				))
			})?;
			let profile = DestinationProfile {
				symbol: balance.chain_agnostic_symbol.clone(),
				decimals: balance.decimals,
			};
			(held, profile)
		},
		None => (
			Decimal::ZERO,
			DestinationProfile {
				symbol: settings.default_symbol.clone(),
				decimals: settings.default_decimals,
			},
		),
	};

	if let Some(symbol) = query.symbol.as_deref().map(str::trim).filter(|s| !s.is_empty()) {
		profile.symbol = symbol.to_string();
	}

	let amount = query.amount.checked_sub(held).ok_or_else(|| {
		PlannerError::AmountOverflow(format!(
			"requested amount {} minus held {} is out of range",
			query.amount, held
		))
	})?;

	Ok(Shortfall { amount, profile })
}
