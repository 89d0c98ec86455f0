//! Core planning logic for the bridge router.
//!
//! Given a target amount of a token on a destination chain, the planner
//! fetches the user's balances, works out how much is missing, collects
//! bridge quotes from every other chain holding the same asset, and picks the
//! cheapest combination of routes that covers the gap.
//!
//! The pipeline is: shortfall -> candidates -> optimizer -> assembler.

use router_config::Config;
use router_gateway::{GatewayError, QuoteGateway};
use router_types::{truncate_id, RouteQuery, RouteResponse};
use rust_decimal::Decimal;
use std::sync::Arc;
use thiserror::Error;
use tracing::instrument;

pub mod assembler;
pub mod builder;
pub mod candidates;
pub mod engine;
pub mod optimizer;
pub mod shortfall;

pub use builder::{BuilderError, RouterBuilder, RouterFactories};
pub use candidates::CandidateReport;
pub use engine::RouterEngine;
pub use optimizer::{OptimizerError, OptimizerSettings, RouteOptimizer};
pub use shortfall::{DestinationProfile, Shortfall};

/// Errors that can occur while planning a route.
#[derive(Debug, Error)]
pub enum PlannerError {
	/// The query itself is unusable.
	#[error("Invalid input: {0}")]
	InvalidInput(String),
	/// Scaling an amount left the representable range.
	#[error("Amount overflow: {0}")]
	AmountOverflow(String),
	/// The balance provider could not be queried.
	#[error("Balance provider error: {0}")]
	BalanceProvider(#[source] GatewayError),
	/// The candidate set exceeds the exhaustive search ceiling.
	#[error("Too many candidates: {count} exceeds the limit of {limit}")]
	TooManyCandidates { count: usize, limit: usize },
	/// The exhaustive search ran out of its node budget.
	#[error("Exhaustive search exceeded {limit} explored branches")]
	SearchBudgetExceeded { limit: u64 },
	/// The optimizer rejected the candidate set for another reason.
	#[error("Optimizer error: {0}")]
	Optimizer(OptimizerError),
	#[error("Internal error: {0}")]
	Internal(String),
}

impl From<OptimizerError> for PlannerError {
	fn from(err: OptimizerError) -> Self {
		match err {
			OptimizerError::TooManyCandidates { count, limit } => {
				PlannerError::TooManyCandidates { count, limit }
			},
			OptimizerError::SearchBudgetExceeded { limit } => {
				PlannerError::SearchBudgetExceeded { limit }
			},
			other => PlannerError::Optimizer(other),
		}
	}
}

/// Planner parameters derived from configuration.
#[derive(Debug, Clone, PartialEq)]
pub struct PlannerSettings {
	/// Destination symbol when the user holds none of the destination token.
	pub default_symbol: String,
	/// Destination decimals when the user holds none of the destination token.
	pub default_decimals: u32,
	/// Quote requests in flight per planning call.
	pub max_concurrent_requests: usize,
	pub optimizer: OptimizerSettings,
}

impl Default for PlannerSettings {
	fn default() -> Self {
		Self {
			default_symbol: "USDC".to_string(),
			default_decimals: 6,
			max_concurrent_requests: 8,
			optimizer: OptimizerSettings::default(),
		}
	}
}

impl From<&Config> for PlannerSettings {
	fn from(config: &Config) -> Self {
		Self {
			default_symbol: config.router.default_symbol.clone(),
			default_decimals: config.router.default_decimals,
			max_concurrent_requests: config.provider.max_concurrent_requests,
			optimizer: OptimizerSettings {
				max_candidates: config.optimizer.max_candidates,
				overflow_strategy: config.optimizer.overflow_strategy,
				greedy_min_from_amount: config.optimizer.greedy_min_from_amount,
				max_search_nodes: config.optimizer.max_search_nodes,
			},
		}
	}
}

/// Plans the cheapest set of bridge routes for a route query.
///
/// Holds no per-request state; one planner serves all requests concurrently.
pub struct RoutePlanner {
	gateway: Arc<dyn QuoteGateway>,
	settings: PlannerSettings,
	optimizer: RouteOptimizer,
}

impl RoutePlanner {
	pub fn new(gateway: Arc<dyn QuoteGateway>, settings: PlannerSettings) -> Self {
		let optimizer = RouteOptimizer::new(settings.optimizer.clone());
		Self {
			gateway,
			settings,
			optimizer,
		}
	}

	pub fn settings(&self) -> &PlannerSettings {
		&self.settings
	}

	/// Plans routes for `query`.
	///
	/// A destination balance that already covers the request short-circuits
	/// before any quote is requested. Failures of individual quote sources
	/// only remove that source; a failed balance fetch fails the request.
	#[instrument(skip_all, fields(chain_id = query.chain_id, user = %truncate_id(&query.user_address)))]
	pub async fn plan(&self, query: &RouteQuery) -> Result<RouteResponse, PlannerError> {
		if query.amount <= Decimal::ZERO {
			return Err(PlannerError::InvalidInput(
				"amount must be greater than zero".to_string(),
			));
		}

		let balances = self
			.gateway
			.fetch_user_balances(&query.user_address)
			.await
			.map_err(PlannerError::BalanceProvider)?;

		let shortfall = shortfall::calculate_shortfall(query, &balances, &self.settings)?;
		if !shortfall.requires_bridging() {
			tracing::info!(shortfall = %shortfall.amount, "Destination balance covers request");
			return Ok(assembler::no_bridging_required());
		}
		let target = shortfall.target()?;

		let report = candidates::build_candidates(
			self.gateway.as_ref(),
			query,
			&shortfall,
			&balances,
			self.settings.max_concurrent_requests,
		)
		.await;
		tracing::info!(
			target = %target,
			symbol = %shortfall.profile.symbol,
			sources = report.sources_queried,
			failed = report.sources_failed,
			candidates = report.quotes.len(),
			"Collected candidate routes"
		);

		// The search is CPU bound; keep it off the async workers so the
		// request timeout can still fire.
		let optimizer = self.optimizer.clone();
		let quotes = report.quotes;
		let span = tracing::Span::current();
		let selection = tokio::task::spawn_blocking(move || {
			span.in_scope(|| optimizer.select(&quotes, target))
		})
		.await
		.map_err(|e| PlannerError::Internal(format!("Optimizer task failed: {}", e)))??;
		let response = assembler::assemble(selection);
		tracing::info!(
			status = ?response.status,
			routes = response.best_route.len(),
			total_fee = %response.total_fee,
			"Route planned"
		);
		Ok(response)
	}
}
