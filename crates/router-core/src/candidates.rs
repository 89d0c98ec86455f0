//! Candidate route building.
//!
//! Every balance of the same asset on another chain is a potential source.
//! Each source gets one quote request for at most the shortfall; the routes
//! that come back are flattened, in source order, into the candidate set the
//! optimizer searches.

use crate::shortfall::Shortfall;
use futures::stream::{self, StreamExt};
use router_gateway::QuoteGateway;
use router_types::{
	from_smallest_units, to_smallest_units, Balance, Quote, QuoteRequest, RouteQuery,
};
use rust_decimal::Decimal;

/// Candidate set together with per-source bookkeeping.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct CandidateReport {
	/// Normalized quotes in source order.
	pub quotes: Vec<Quote>,
	/// Sources a quote request was sent for.
	pub sources_queried: usize,
	/// Sources whose request failed; they contribute no quotes.
	pub sources_failed: usize,
	/// Eligible sources skipped because nothing could be sent from them.
	pub sources_skipped: usize,
}

/// Shortfall expressed in the smallest units of a token with `decimals`.
///
/// Rounded up so a source with fewer decimals than the destination still
/// sends enough to cover it.
fn shortfall_in_units(shortfall: &Shortfall, decimals: u32) -> Option<Decimal> {
	let human = from_smallest_units(shortfall.amount, shortfall.profile.decimals)?;
	to_smallest_units(human, decimals).map(|units| units.ceil())
}

/// Builds the quote request for each eligible source balance.
///
/// Eligible sources live on another chain and carry the destination's
/// chain-agnostic symbol. The amount sent is the smaller of the balance and
/// the shortfall, both in the source token's units; sources with nothing to
/// send are counted and dropped.
fn source_requests(
	query: &RouteQuery,
	shortfall: &Shortfall,
	balances: &[Balance],
) -> (Vec<QuoteRequest>, usize) {
	let mut skipped = 0;
	let requests = balances
		.iter()
		.filter(|balance| {
			balance.chain_id != query.chain_id && balance.is_same_asset(&shortfall.profile.symbol)
		})
		.filter_map(|balance| {
			let needed = shortfall_in_units(shortfall, balance.decimals);
			let from_amount = match (balance.smallest_units(), needed) {
				(Some(units), Some(needed)) => units.min(needed),
				(Some(units), None) => units,
				(None, Some(needed)) => needed,
				(None, None) => Decimal::ZERO,
			};
			if from_amount <= Decimal::ZERO {
				skipped += 1;
				return None;
			}
			Some(QuoteRequest {
				from_chain_id: balance.chain_id,
				to_chain_id: query.chain_id,
				from_token_address: balance.token_address.clone(),
				to_token_address: query.token_address.clone(),
				from_amount,
				from_decimals: balance.decimals,
				to_decimals: shortfall.profile.decimals,
				user_address: query.user_address.clone(),
			})
		})
		.collect();
	(requests, skipped)
}

/// Queries every eligible source and flattens the results.
///
/// At most `max_concurrent` requests are in flight; results keep source
/// order regardless of completion order. A failed source is logged and
/// contributes nothing.
pub async fn build_candidates(
	gateway: &dyn QuoteGateway,
	query: &RouteQuery,
	shortfall: &Shortfall,
	balances: &[Balance],
	max_concurrent: usize,
) -> CandidateReport {
	let (requests, sources_skipped) = source_requests(query, shortfall, balances);
	let sources_queried = requests.len();

	let results: Vec<_> = stream::iter(requests)
		.map(|request| async move {
			let result = gateway.get_quotes(&request).await;
			(request, result)
		})
		.buffered(max_concurrent.max(1))
		.collect()
		.await;

	let mut report = CandidateReport {
		sources_queried,
		sources_skipped,
		..CandidateReport::default()
	};

	for (request, result) in results {
		match result {
			Ok(quotes) => {
				if quotes.is_empty() {
					tracing::debug!(from_chain = request.from_chain_id, "No routes from source");
				}
				report.quotes.extend(quotes);
			},
			Err(e) => {
				report.sources_failed += 1;
				tracing::warn!(
					from_chain = request.from_chain_id,
					token = %request.from_token_address,
					error = %e,
					"Quote request failed, skipping source"
				);
			},
		}
	}

	report
}
