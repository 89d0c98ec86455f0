//! Route combination optimizer.
//!
//! Picks the subset of candidate quotes whose combined output covers the
//! target at the lowest total fee. Small candidate sets are searched
//! exhaustively with a depth-first include/skip traversal; sets above the
//! configured ceiling, and searches that visit more than `max_search_nodes`
//! branches, are either rejected or handed to a greedy-by-fee approximation.
//!
//! Traversal order is part of the contract: including candidate `i` is
//! explored before skipping it, a branch stops as soon as it reaches the
//! target, and a later subset replaces the best one only with a strictly
//! lower fee. Equal-fee ties therefore resolve to the first subset found.

use router_types::{OverflowStrategy, Quote, RouteSelection, SearchStrategy, Selection};
use rust_decimal::Decimal;
use thiserror::Error;

/// Errors that can occur while selecting routes.
#[derive(Debug, Error, PartialEq)]
pub enum OptimizerError {
	/// The candidate set exceeds the exhaustive search ceiling.
	#[error("Too many candidates: {count} exceeds the limit of {limit}")]
	TooManyCandidates { count: usize, limit: usize },
	/// The exhaustive search visited more branches than allowed.
	#[error("Exhaustive search exceeded {limit} explored branches")]
	SearchBudgetExceeded { limit: u64 },
	/// A candidate has a negative output or fee.
	#[error("Invalid candidate {route_id}: {reason}")]
	InvalidCandidate { route_id: String, reason: String },
	/// Summed outputs or fees exceed the representable range.
	#[error("Candidate totals overflow")]
	Overflow,
}

/// Optimizer limits.
#[derive(Debug, Clone, PartialEq)]
pub struct OptimizerSettings {
	/// Largest candidate set searched exhaustively.
	pub max_candidates: usize,
	/// Behaviour above `max_candidates`.
	pub overflow_strategy: OverflowStrategy,
	/// Greedy fallback skips routes sending this much or less.
	pub greedy_min_from_amount: Decimal,
	/// Branches the exhaustive search may visit before giving up.
	pub max_search_nodes: u64,
}

impl Default for OptimizerSettings {
	fn default() -> Self {
		Self {
			max_candidates: 24,
			overflow_strategy: OverflowStrategy::Greedy,
			greedy_min_from_amount: Decimal::new(1, 2),
			max_search_nodes: 1_000_000,
		}
	}
}

/// Minimal-fee subset selection over a fixed candidate list.
#[derive(Debug, Clone, Default)]
pub struct RouteOptimizer {
	settings: OptimizerSettings,
}

impl RouteOptimizer {
	pub fn new(settings: OptimizerSettings) -> Self {
		Self { settings }
	}

	pub fn settings(&self) -> &OptimizerSettings {
		&self.settings
	}

	/// Selects the cheapest covering subset of `candidates` for `target`.
	///
	/// Returns [`Selection::Infeasible`] when no subset reaches the target.
	pub fn select(&self, candidates: &[Quote], target: Decimal) -> Result<Selection, OptimizerError> {
		let suffix_output = suffix_outputs(candidates)?;

		if candidates.len() > self.settings.max_candidates {
			return match self.settings.overflow_strategy {
				OverflowStrategy::Reject => Err(OptimizerError::TooManyCandidates {
					count: candidates.len(),
					limit: self.settings.max_candidates,
				}),
				OverflowStrategy::Greedy => {
					tracing::warn!(
						candidates = candidates.len(),
						limit = self.settings.max_candidates,
						"Candidate count exceeds exhaustive limit, using greedy selection"
					);
					Ok(self.select_greedy(candidates, target))
				},
			};
		}

		let mut search = Search {
			candidates,
			target,
			suffix_output,
			path: Vec::with_capacity(candidates.len()),
			best: None,
			nodes: 0,
			max_nodes: self.settings.max_search_nodes,
		};
		search.explore(0, Decimal::ZERO, Decimal::ZERO);

		if search.exhausted() {
			return match self.settings.overflow_strategy {
				OverflowStrategy::Reject => Err(OptimizerError::SearchBudgetExceeded {
					limit: self.settings.max_search_nodes,
				}),
				OverflowStrategy::Greedy => {
					tracing::warn!(
						candidates = candidates.len(),
						limit = self.settings.max_search_nodes,
						"Exhaustive search budget exceeded, using greedy selection"
					);
					Ok(self.select_greedy(candidates, target))
				},
			};
		}

		Ok(match search.best {
			Some(best) => {
				tracing::debug!(
					routes = best.indices.len(),
					fee = %best.fee,
					"Exhaustive search found a covering selection"
				);
				selection_from(candidates, &best.indices, SearchStrategy::Exhaustive)
			},
			None => Selection::Infeasible,
		})
	}

	/// Cheapest-first accumulation until the target is met.
	///
	/// Candidates are stably sorted by fee; routes sending no more than
	/// `greedy_min_from_amount` are ignored. Picked routes are reported in
	/// candidate order.
	fn select_greedy(&self, candidates: &[Quote], target: Decimal) -> Selection {
		let mut order: Vec<usize> = (0..candidates.len()).collect();
		order.sort_by_key(|&i| candidates[i].fee_usd);

		let mut picked = Vec::new();
		let mut bridged = Decimal::ZERO;
		for i in order {
			if bridged >= target {
				break;
			}
			if candidates[i].from_amount <= self.settings.greedy_min_from_amount {
				continue;
			}
			bridged += candidates[i].to_amount;
			picked.push(i);
		}

		if bridged < target {
			return Selection::Infeasible;
		}
		picked.sort_unstable();
		selection_from(candidates, &picked, SearchStrategy::Greedy)
	}
}

/// `suffix[i]` is the summed output of `candidates[i..]`.
///
/// Also checks the quote invariants and that every partial sum of outputs and
/// fees fits in a `Decimal`, so the search can add without overflow checks.
fn suffix_outputs(candidates: &[Quote]) -> Result<Vec<Decimal>, OptimizerError> {
	let mut suffix = vec![Decimal::ZERO; candidates.len() + 1];
	let mut total_fee = Decimal::ZERO;
	for (i, quote) in candidates.iter().enumerate().rev() {
		quote
			.validate()
			.map_err(|e| OptimizerError::InvalidCandidate {
				route_id: quote.route_id.clone(),
				reason: e.to_string(),
			})?;
		suffix[i] = suffix[i + 1]
			.checked_add(quote.to_amount)
			.ok_or(OptimizerError::Overflow)?;
		total_fee = total_fee
			.checked_add(quote.fee_usd)
			.ok_or(OptimizerError::Overflow)?;
	}
	Ok(suffix)
}

fn selection_from(candidates: &[Quote], indices: &[usize], strategy: SearchStrategy) -> Selection {
	let routes: Vec<Quote> = indices.iter().map(|&i| candidates[i].clone()).collect();
	let total_fee = routes.iter().map(|q| q.fee_usd).sum();
	let total_bridged = routes.iter().map(|q| q.to_amount).sum();
	Selection::Feasible(RouteSelection {
		routes,
		total_fee,
		total_bridged,
		strategy,
	})
}

struct Best {
	fee: Decimal,
	indices: Vec<usize>,
}

struct Search<'a> {
	candidates: &'a [Quote],
	target: Decimal,
	suffix_output: Vec<Decimal>,
	path: Vec<usize>,
	best: Option<Best>,
	nodes: u64,
	max_nodes: u64,
}

impl Search<'_> {
	fn exhausted(&self) -> bool {
		self.nodes > self.max_nodes
	}

	fn explore(&mut self, index: usize, bridged: Decimal, fee: Decimal) {
		if self.exhausted() {
			return;
		}
		self.nodes += 1;
		if bridged >= self.target {
			if self.best.as_ref().is_none_or(|best| fee < best.fee) {
				self.best = Some(Best {
					fee,
					indices: self.path.clone(),
				});
			}
			return;
		}
		if index == self.candidates.len() {
			return;
		}
		// Fees are non-negative: this branch can no longer beat the best.
		if self.best.as_ref().is_some_and(|best| fee >= best.fee) {
			return;
		}
		// Even taking everything left cannot reach the target.
		if bridged + self.suffix_output[index] < self.target {
			return;
		}

		let quote = &self.candidates[index];
		self.path.push(index);
		self.explore(index + 1, bridged + quote.to_amount, fee + quote.fee_usd);
		self.path.pop();
		self.explore(index + 1, bridged, fee);
	}
}

#[cfg(test)]
mod tests {
	use super::*;

	fn dec(value: &str) -> Decimal {
		value.parse().unwrap()
	}

	fn quote(id: &str, to_amount: &str, fee: &str) -> Quote {
		Quote {
			from_chain_id: 1,
			to_chain_id: 137,
			route_id: id.to_string(),
			from_amount: dec(to_amount),
			to_amount: dec(to_amount),
			bridge_name: "test".to_string(),
			fee_usd: dec(fee),
		}
	}

	fn ids(selection: &Selection) -> Vec<&str> {
		selection
			.routes()
			.iter()
			.map(|q| q.route_id.as_str())
			.collect()
	}

	fn optimizer() -> RouteOptimizer {
		RouteOptimizer::default()
	}

	#[test]
	fn test_prefers_cheaper_pair_over_single_route() {
		let candidates = vec![
			quote("a", "60", "5"),
			quote("b", "50", "3"),
			quote("c", "20", "1"),
		];
		let selection = optimizer().select(&candidates, dec("70")).unwrap();
		assert_eq!(ids(&selection), vec!["b", "c"]);
		assert_eq!(selection.total_fee(), Some(dec("4")));
		assert_eq!(selection.total_bridged(), dec("70"));
	}

	#[test]
	fn test_overshooting_pair_beats_exact_single_route() {
		let candidates = vec![
			quote("a", "60", "5"),
			quote("b", "50", "3"),
			quote("c", "100", "10"),
		];
		let selection = optimizer().select(&candidates, dec("100")).unwrap();
		assert_eq!(ids(&selection), vec!["a", "b"]);
		assert_eq!(selection.total_fee(), Some(dec("8")));
		assert_eq!(selection.total_bridged(), dec("110"));
	}

	#[test]
	fn test_single_short_route_is_infeasible() {
		let candidates = vec![quote("a", "30", "1")];
		let selection = optimizer().select(&candidates, dec("100")).unwrap();
		assert_eq!(selection, Selection::Infeasible);
	}

	#[test]
	fn test_infeasible_when_outputs_fall_short() {
		let candidates = vec![quote("a", "30", "1"), quote("b", "30", "1")];
		let selection = optimizer().select(&candidates, dec("100")).unwrap();
		assert_eq!(selection, Selection::Infeasible);
		assert_eq!(selection.total_fee(), None);
	}

	#[test]
	fn test_empty_candidates_are_infeasible() {
		let selection = optimizer().select(&[], dec("1")).unwrap();
		assert!(!selection.is_feasible());
	}

	#[test]
	fn test_zero_target_selects_nothing() {
		let candidates = vec![quote("a", "10", "1")];
		let selection = optimizer().select(&candidates, Decimal::ZERO).unwrap();
		assert!(selection.is_feasible());
		assert!(selection.routes().is_empty());
		assert_eq!(selection.total_fee(), Some(Decimal::ZERO));
	}

	#[test]
	fn test_equal_fee_keeps_first_found() {
		let candidates = vec![quote("a", "50", "2"), quote("b", "50", "2")];
		let selection = optimizer().select(&candidates, dec("50")).unwrap();
		assert_eq!(ids(&selection), vec!["a"]);
	}

	#[test]
	fn test_zero_fee_routes() {
		let candidates = vec![
			quote("free-small", "10", "0"),
			quote("paid", "100", "3"),
			quote("free-large", "95", "0"),
		];
		let selection = optimizer().select(&candidates, dec("100")).unwrap();
		assert_eq!(ids(&selection), vec!["free-small", "free-large"]);
		assert_eq!(selection.total_fee(), Some(Decimal::ZERO));
	}

	#[test]
	fn test_only_crossing_candidate_overshoots() {
		let candidates = vec![quote("a", "80", "1"), quote("b", "80", "1")];
		let selection = optimizer().select(&candidates, dec("70")).unwrap();
		assert_eq!(ids(&selection), vec!["a"]);
		assert_eq!(selection.total_bridged(), dec("80"));
	}

	#[test]
	fn test_result_is_deterministic() {
		let candidates: Vec<Quote> = (0..12)
			.map(|i| quote(&format!("r{}", i), &format!("{}", 5 + i % 4), &format!("{}", i % 3)))
			.collect();
		let first = optimizer().select(&candidates, dec("30")).unwrap();
		for _ in 0..5 {
			assert_eq!(optimizer().select(&candidates, dec("30")).unwrap(), first);
		}
	}

	#[test]
	fn test_reject_above_ceiling() {
		let optimizer = RouteOptimizer::new(OptimizerSettings {
			max_candidates: 2,
			overflow_strategy: OverflowStrategy::Reject,
			..OptimizerSettings::default()
		});
		let candidates = vec![
			quote("a", "10", "1"),
			quote("b", "10", "1"),
			quote("c", "10", "1"),
		];
		assert_eq!(
			optimizer.select(&candidates, dec("5")).unwrap_err(),
			OptimizerError::TooManyCandidates { count: 3, limit: 2 }
		);
	}

	#[test]
	fn test_greedy_above_ceiling() {
		let optimizer = RouteOptimizer::new(OptimizerSettings {
			max_candidates: 2,
			overflow_strategy: OverflowStrategy::Greedy,
			greedy_min_from_amount: dec("0.01"),
			..OptimizerSettings::default()
		});
		let candidates = vec![
			quote("expensive", "100", "9"),
			quote("dust", "0.01", "0"),
			quote("mid", "40", "2"),
			quote("cheap", "40", "1"),
		];
		let selection = optimizer.select(&candidates, dec("70")).unwrap();
		assert_eq!(ids(&selection), vec!["mid", "cheap"]);
		assert_eq!(selection.total_fee(), Some(dec("3")));
		match selection {
			Selection::Feasible(s) => assert_eq!(s.strategy, SearchStrategy::Greedy),
			Selection::Infeasible => panic!("expected a feasible selection"),
		}
	}

	#[test]
	fn test_greedy_infeasible() {
		let optimizer = RouteOptimizer::new(OptimizerSettings {
			max_candidates: 1,
			..OptimizerSettings::default()
		});
		let candidates = vec![quote("a", "10", "1"), quote("b", "10", "1")];
		assert_eq!(
			optimizer.select(&candidates, dec("50")).unwrap(),
			Selection::Infeasible
		);
	}

	/// Identical routes defeat both prunes: every half-sized subset ties.
	fn identical_routes(n: usize) -> Vec<Quote> {
		(0..n).map(|i| quote(&format!("r{}", i), "1", "1")).collect()
	}

	#[test]
	fn test_search_budget_falls_back_to_greedy() {
		let optimizer = RouteOptimizer::new(OptimizerSettings {
			max_candidates: 30,
			max_search_nodes: 10_000,
			..OptimizerSettings::default()
		});
		let selection = optimizer.select(&identical_routes(30), dec("15")).unwrap();
		assert_eq!(selection.total_fee(), Some(dec("15")));
		assert_eq!(selection.total_bridged(), dec("15"));
		match selection {
			Selection::Feasible(s) => assert_eq!(s.strategy, SearchStrategy::Greedy),
			Selection::Infeasible => panic!("expected a feasible selection"),
		}
	}

	#[test]
	fn test_search_budget_reject() {
		let optimizer = RouteOptimizer::new(OptimizerSettings {
			max_candidates: 30,
			overflow_strategy: OverflowStrategy::Reject,
			max_search_nodes: 10_000,
			..OptimizerSettings::default()
		});
		assert_eq!(
			optimizer.select(&identical_routes(30), dec("15")).unwrap_err(),
			OptimizerError::SearchBudgetExceeded { limit: 10_000 }
		);
	}

	#[test]
	fn test_small_search_stays_exhaustive() {
		let selection = optimizer().select(&identical_routes(8), dec("4")).unwrap();
		assert_eq!(ids(&selection), vec!["r0", "r1", "r2", "r3"]);
		match selection {
			Selection::Feasible(s) => assert_eq!(s.strategy, SearchStrategy::Exhaustive),
			Selection::Infeasible => panic!("expected a feasible selection"),
		}
	}

	#[test]
	fn test_negative_fee_rejected() {
		let candidates = vec![quote("bad", "10", "-1")];
		assert!(matches!(
			optimizer().select(&candidates, dec("5")),
			Err(OptimizerError::InvalidCandidate { .. })
		));
	}

	/// Tiny deterministic generator so the cross-check needs no extra crates.
	struct Lcg(u64);

	impl Lcg {
		fn next(&mut self, bound: u64) -> u64 {
			self.0 = self
				.0
				.wrapping_mul(6364136223846793005)
				.wrapping_add(1442695040888963407);
			(self.0 >> 33) % bound
		}
	}

	/// Minimal fee over every subset reaching the target, by enumeration.
	fn brute_force_min_fee(candidates: &[Quote], target: Decimal) -> Option<Decimal> {
		(0u32..(1 << candidates.len()))
			.filter_map(|mask| {
				let (bridged, fee) = candidates
					.iter()
					.enumerate()
					.filter(|(i, _)| mask & (1 << i) != 0)
					.fold((Decimal::ZERO, Decimal::ZERO), |(b, f), (_, q)| {
						(b + q.to_amount, f + q.fee_usd)
					});
				(bridged >= target).then_some(fee)
			})
			.min()
	}

	#[test]
	fn test_matches_brute_force_on_small_sets() {
		let mut rng = Lcg(42);
		for round in 0..200 {
			let n = 1 + rng.next(10) as usize;
			let candidates: Vec<Quote> = (0..n)
				.map(|i| {
					quote(
						&format!("{}-{}", round, i),
						&rng.next(60).to_string(),
						&format!("{}.{}", rng.next(8), rng.next(100)),
					)
				})
				.collect();
			let target = Decimal::from(rng.next(150));

			let selection = optimizer().select(&candidates, target).unwrap();
			let expected = brute_force_min_fee(&candidates, target);

			assert_eq!(selection.total_fee(), expected, "round {}", round);
			if selection.is_feasible() {
				assert!(selection.total_bridged() >= target, "round {}", round);
			}
		}
	}
}
