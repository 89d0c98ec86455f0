//! Response assembly.

use router_types::{RouteResponse, RouteStatus, SearchStrategy, Selection};
use rust_decimal::Decimal;

pub const NO_BRIDGING_MESSAGE: &str = "No bridging required";
pub const INSUFFICIENT_LIQUIDITY_MESSAGE: &str =
	"Insufficient liquidity: no combination of routes covers the shortfall";
pub const APPROXIMATE_MESSAGE: &str =
	"Approximate selection: exhaustive search limit exceeded";

/// Response for a request the destination balance already covers.
pub fn no_bridging_required() -> RouteResponse {
	RouteResponse {
		best_route: Vec::new(),
		total_fee: Decimal::ZERO,
		total_bridged: Decimal::ZERO,
		status: RouteStatus::NoBridgingRequired,
		message: Some(NO_BRIDGING_MESSAGE.to_string()),
	}
}

/// Packages an optimizer outcome.
///
/// The infeasible sentinel becomes an empty route list with zero totals.
pub fn assemble(selection: Selection) -> RouteResponse {
	match selection {
		Selection::Feasible(selection) => RouteResponse {
			message: (selection.strategy == SearchStrategy::Greedy)
				.then(|| APPROXIMATE_MESSAGE.to_string()),
			best_route: selection.routes,
			total_fee: selection.total_fee,
			total_bridged: selection.total_bridged,
			status: RouteStatus::Bridged,
		},
		Selection::Infeasible => RouteResponse {
			best_route: Vec::new(),
			total_fee: Decimal::ZERO,
			total_bridged: Decimal::ZERO,
			status: RouteStatus::InsufficientLiquidity,
			message: Some(INSUFFICIENT_LIQUIDITY_MESSAGE.to_string()),
		},
	}
}

#[cfg(test)]
mod tests {
	use super::*;
	use router_types::{Quote, RouteSelection};

	fn selection(strategy: SearchStrategy) -> Selection {
		let quote = Quote {
			from_chain_id: 10,
			to_chain_id: 137,
			route_id: "r".to_string(),
			from_amount: Decimal::from(70),
			to_amount: Decimal::from(70),
			bridge_name: "cctp".to_string(),
			fee_usd: Decimal::from(4),
		};
		Selection::Feasible(RouteSelection {
			routes: vec![quote],
			total_fee: Decimal::from(4),
			total_bridged: Decimal::from(70),
			strategy,
		})
	}

	#[test]
	fn test_exhaustive_selection() {
		let response = assemble(selection(SearchStrategy::Exhaustive));
		assert_eq!(response.status, RouteStatus::Bridged);
		assert_eq!(response.best_route.len(), 1);
		assert_eq!(response.total_fee, Decimal::from(4));
		assert_eq!(response.total_bridged, Decimal::from(70));
		assert!(response.message.is_none());
	}

	#[test]
	fn test_greedy_selection_is_marked() {
		let response = assemble(selection(SearchStrategy::Greedy));
		assert_eq!(response.status, RouteStatus::Bridged);
		assert_eq!(response.message.as_deref(), Some(APPROXIMATE_MESSAGE));
	}

	#[test]
	fn test_infeasible_has_zero_totals() {
		let response = assemble(Selection::Infeasible);
		assert!(response.best_route.is_empty());
		assert_eq!(response.total_fee, Decimal::ZERO);
		assert_eq!(response.total_bridged, Decimal::ZERO);
		assert_eq!(response.status, RouteStatus::InsufficientLiquidity);
	}

	#[test]
	fn test_no_bridging() {
		let response = no_bridging_required();
		assert_eq!(response.status, RouteStatus::NoBridgingRequired);
		assert_eq!(response.message.as_deref(), Some(NO_BRIDGING_MESSAGE));
	}
}
