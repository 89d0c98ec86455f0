//! Optimizer output types.

use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use crate::Quote;

/// How a selection was produced.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SearchStrategy {
	/// Exhaustive include/skip search; the result is fee-optimal.
	Exhaustive,
	/// Greedy-by-fee approximation used above the candidate ceiling.
	Greedy,
}

/// A feasible combination of routes.
#[derive(Debug, Clone, PartialEq)]
pub struct RouteSelection {
	/// Selected quotes, in candidate-set order.
	pub routes: Vec<Quote>,
	/// Sum of selected fees in USD.
	pub total_fee: Decimal,
	/// Sum of selected output amounts in human units.
	pub total_bridged: Decimal,
	/// Strategy that produced this selection.
	pub strategy: SearchStrategy,
}

/// Result of running the optimizer over a candidate set.
#[derive(Debug, Clone, PartialEq)]
pub enum Selection {
	/// A combination covering the target was found.
	Feasible(RouteSelection),
	/// No combination of candidates reaches the target (fee is +infinity).
	Infeasible,
}

impl Selection {
	/// Returns true if a covering combination was found.
	pub fn is_feasible(&self) -> bool {
		matches!(self, Selection::Feasible(_))
	}

	/// Selected routes; empty for the infeasible sentinel.
	pub fn routes(&self) -> &[Quote] {
		match self {
			Selection::Feasible(selection) => &selection.routes,
			Selection::Infeasible => &[],
		}
	}

	/// Total fee, or `None` standing in for +infinity when infeasible.
	pub fn total_fee(&self) -> Option<Decimal> {
		match self {
			Selection::Feasible(selection) => Some(selection.total_fee),
			Selection::Infeasible => None,
		}
	}

	/// Total bridged amount; zero when infeasible.
	pub fn total_bridged(&self) -> Decimal {
		match self {
			Selection::Feasible(selection) => selection.total_bridged,
			Selection::Infeasible => Decimal::ZERO,
		}
	}
}

/// What the optimizer does when the candidate set exceeds its ceiling.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum OverflowStrategy {
	/// Fail with a "too many candidates" error.
	Reject,
	/// Fall back to the greedy-by-fee approximation.
	#[default]
	Greedy,
}
