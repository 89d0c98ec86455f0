//! HTTP server for the bridge router API.
//!
//! Exposes `GET /api/bridge-route` and a `/health` check on top of a shared
//! [`RouterEngine`].

use axum::{
	extract::{Query, State},
	http::{HeaderValue, Method},
	response::Json,
	routing::get,
	Router,
};
use router_config::{ApiConfig, CorsConfig};
use router_core::RouterEngine;
use router_types::{APIError, RouteResponse};
use serde_json::Value;
use std::sync::Arc;
use std::time::Duration;
use tokio::net::TcpListener;
use tower::ServiceBuilder;
use tower_http::cors::{AllowOrigin, Any, CorsLayer};
use tower_http::trace::TraceLayer;

use crate::apis::route::{self, RawRouteQuery};

/// Shared application state for the API server.
#[derive(Clone)]
pub struct AppState {
	/// Planner and response cache.
	pub engine: Arc<RouterEngine>,
	/// Upper bound on planning a single request.
	pub request_timeout: Duration,
}

/// Starts the HTTP server for the API.
pub async fn start_server(
	api_config: ApiConfig,
	engine: Arc<RouterEngine>,
) -> Result<(), Box<dyn std::error::Error>> {
	let state = AppState {
		engine,
		request_timeout: Duration::from_secs(api_config.timeout_seconds),
	};
	let app = create_app(state, api_config.cors.as_ref());

	let bind_address = format!("{}:{}", api_config.host, api_config.port);
	let listener = TcpListener::bind(&bind_address).await?;

	tracing::info!("Bridge router API server starting on {}", bind_address);

	axum::serve(listener, app).await?;

	Ok(())
}

/// Builds the router with all routes and middleware.
pub fn create_app(state: AppState, cors: Option<&CorsConfig>) -> Router {
	Router::new()
		.nest(
			"/api",
			Router::new().route("/bridge-route", get(handle_bridge_route)),
		)
		.route("/health", get(handle_health))
		.layer(
			ServiceBuilder::new()
				.layer(TraceLayer::new_for_http())
				.layer(cors_layer(cors)),
		)
		.with_state(state)
}

/// Permissive unless an origin allow-list is configured.
fn cors_layer(cors: Option<&CorsConfig>) -> CorsLayer {
	let Some(cors) = cors else {
		return CorsLayer::permissive();
	};

	let allow_origin = if cors.allowed_origins.iter().any(|origin| origin == "*") {
		AllowOrigin::any()
	} else {
		let origins: Vec<HeaderValue> = cors
			.allowed_origins
			.iter()
			.filter_map(|origin| match origin.parse::<HeaderValue>() {
				Ok(value) => Some(value),
				Err(_) => {
					tracing::warn!(origin = %origin, "Ignoring invalid CORS origin");
					None
				},
			})
			.collect();
		AllowOrigin::list(origins)
	};

	CorsLayer::new()
		.allow_origin(allow_origin)
		.allow_methods([Method::GET])
		.allow_headers(Any)
}

/// Handles GET /api/bridge-route requests.
///
/// Returns the cheapest combination of bridge routes that tops up the
/// user's balance of the requested token on the destination chain.
async fn handle_bridge_route(
	State(state): State<AppState>,
	Query(query): Query<RawRouteQuery>,
) -> Result<Json<RouteResponse>, APIError> {
	match route::process_route_request(query, &state.engine, state.request_timeout).await {
		Ok(response) => Ok(Json(response)),
		Err(e) => {
			tracing::warn!("Route request failed: {}", e);
			Err(APIError::from(e))
		},
	}
}

async fn handle_health() -> Json<Value> {
	Json(serde_json::json!({ "status": "ok" }))
}

#[cfg(test)]
mod tests {
	use super::*;
	use crate::apis::route::{cache_key, parse_query, CACHE_NAMESPACE};
	use async_trait::async_trait;
	use axum::body::Body;
	use axum::http::{Request, StatusCode};
	use router_config::Config;
	use router_core::{PlannerSettings, RoutePlanner, RouterBuilder, RouterFactories};
	use router_gateway::implementations::mock::MockGatewayConfig;
	use router_gateway::{GatewayError, QuoteGateway};
	use router_storage::implementations::memory::MemoryStorage;
	use router_storage::StorageService;
	use router_types::{Balance, ConfigSchema, Quote, QuoteRequest, RouteStatus};
	use tower::ServiceExt;

	const DEST_TOKEN: &str = "0x3c499c542cef5e3811e1192ce70d8cc03d5c3359";
	const USER: &str = "0x00000000000000000000000000000000000000aa";

	const MOCK: &str = r#"
[[balances]]
chain_id = 137
token_address = "0x3c499c542cef5e3811e1192ce70d8cc03d5c3359"
chain_agnostic_symbol = "USDC"
amount = "30"
decimals = 6

[[balances]]
chain_id = 10
token_address = "0xop"
chain_agnostic_symbol = "USDC"
amount = "80"
decimals = 6

[[balances]]
chain_id = 8453
token_address = "0xbase"
chain_agnostic_symbol = "USDC"
amount = "80"
decimals = 6

[[routes]]
from_chain_id = 10
route_id = "op-across"
bridge_name = "across"
fee_usd = "5"

[[routes]]
from_chain_id = 8453
route_id = "base-cctp"
bridge_name = "cctp"
fee_usd = "3"
"#;

	fn mock_engine() -> Arc<RouterEngine> {
		let mut config = Config::for_testing();
		config
			.provider
			.implementations
			.insert("mock".to_string(), toml::Value::Table(toml::from_str(MOCK).unwrap()));

		let factories = RouterFactories {
			gateway_factories: router_gateway::get_all_implementations()
				.into_iter()
				.map(|(name, factory)| (name.to_string(), factory))
				.collect(),
			storage_factories: router_storage::get_all_implementations()
				.into_iter()
				.map(|(name, factory)| (name.to_string(), factory))
				.collect(),
		};
		Arc::new(RouterBuilder::new(config).build(factories).unwrap())
	}

	/// Balance provider that answers with an error after `delay`.
	struct UnreachableGateway {
		delay: Duration,
	}

	#[async_trait]
	impl QuoteGateway for UnreachableGateway {
		fn config_schema(&self) -> Box<dyn ConfigSchema> {
			Box::new(MockGatewayConfig::default())
		}

		async fn fetch_user_balances(&self, _user: &str) -> Result<Vec<Balance>, GatewayError> {
			tokio::time::sleep(self.delay).await;
			Err(GatewayError::Network("connection refused".to_string()))
		}

		async fn get_quotes(&self, _request: &QuoteRequest) -> Result<Vec<Quote>, GatewayError> {
			Ok(Vec::new())
		}
	}

	fn unreachable_engine(delay: Duration) -> Arc<RouterEngine> {
		let config = Config::for_testing();
		let planner = RoutePlanner::new(
			Arc::new(UnreachableGateway { delay }),
			PlannerSettings::from(&config),
		);
		Arc::new(RouterEngine::new(
			config,
			Arc::new(planner),
			Arc::new(StorageService::new(Box::new(MemoryStorage::new()))),
		))
	}

	fn app(engine: Arc<RouterEngine>) -> Router {
		create_app(
			AppState {
				engine,
				request_timeout: Duration::from_secs(5),
			},
			None,
		)
	}

	fn route_uri(amount: &str) -> String {
		format!(
			"/api/bridge-route?chainId=137&tokenAddress={}&amount={}&userAddress={}",
			DEST_TOKEN, amount, USER
		)
	}

	async fn get(app: Router, uri: &str) -> (StatusCode, Value) {
		let response = app
			.oneshot(Request::builder().uri(uri).body(Body::empty()).unwrap())
			.await
			.unwrap();
		let status = response.status();
		let bytes = axum::body::to_bytes(response.into_body(), usize::MAX)
			.await
			.unwrap();
		(status, serde_json::from_slice(&bytes).unwrap())
	}

	#[tokio::test]
	async fn test_health() {
		let (status, body) = get(app(mock_engine()), "/health").await;
		assert_eq!(status, StatusCode::OK);
		assert_eq!(body["status"], "ok");
	}

	#[tokio::test]
	async fn test_missing_parameters() {
		let (status, body) = get(app(mock_engine()), "/api/bridge-route?chainId=137").await;
		assert_eq!(status, StatusCode::BAD_REQUEST);
		assert_eq!(body["error"], "MISSING_PARAMETERS");
		assert_eq!(body["message"], "Missing required parameters");
	}

	#[tokio::test]
	async fn test_invalid_parameter_types() {
		let uri = format!(
			"/api/bridge-route?chainId=polygon&tokenAddress={}&amount=1&userAddress={}",
			DEST_TOKEN, USER
		);
		let (status, body) = get(app(mock_engine()), &uri).await;
		assert_eq!(status, StatusCode::BAD_REQUEST);
		assert_eq!(body["message"], "Invalid parameter types");
	}

	#[tokio::test]
	async fn test_non_positive_amount() {
		let (status, body) = get(app(mock_engine()), &route_uri("0")).await;
		assert_eq!(status, StatusCode::BAD_REQUEST);
		assert_eq!(body["message"], "Invalid or missing amount");
	}

	#[tokio::test]
	async fn test_plans_and_caches_route() {
		let engine = mock_engine();
		let (status, body) = get(app(engine.clone()), &route_uri("100000000")).await;

		assert_eq!(status, StatusCode::OK);
		assert_eq!(body["status"], "bridged");
		assert_eq!(body["bestRoute"].as_array().unwrap().len(), 1);
		assert_eq!(body["bestRoute"][0]["routeId"], "base-cctp");
		assert_eq!(body["totalFee"], serde_json::json!(3.0));
		assert_eq!(body["totalBridged"], serde_json::json!(70.0));

		let query = parse_query(&RawRouteQuery {
			chain_id: Some("137".to_string()),
			token_address: Some(DEST_TOKEN.to_string()),
			amount: Some("100000000".to_string()),
			user_address: Some(USER.to_string()),
			symbol: None,
		})
		.unwrap();
		assert!(engine
			.cache()
			.exists(CACHE_NAMESPACE, &cache_key(&query))
			.await
			.unwrap());
	}

	#[tokio::test]
	async fn test_cache_hit_skips_planner() {
		let engine = unreachable_engine(Duration::ZERO);
		let query = parse_query(&RawRouteQuery {
			chain_id: Some("137".to_string()),
			token_address: Some(DEST_TOKEN.to_string()),
			amount: Some("5000000".to_string()),
			user_address: Some(USER.to_string()),
			symbol: None,
		})
		.unwrap();
		let cached = RouteResponse {
			best_route: Vec::new(),
			total_fee: rust_decimal::Decimal::ZERO,
			total_bridged: rust_decimal::Decimal::ZERO,
			status: RouteStatus::NoBridgingRequired,
			message: Some("cached".to_string()),
		};
		engine
			.cache()
			.store_with_ttl(
				CACHE_NAMESPACE,
				&cache_key(&query),
				&cached,
				Some(Duration::from_secs(60)),
			)
			.await
			.unwrap();

		// The balance provider is down, so only the cache can answer.
		let (status, body) = get(app(engine), &route_uri("5000000")).await;
		assert_eq!(status, StatusCode::OK);
		assert_eq!(body["message"], "cached");
	}

	#[tokio::test]
	async fn test_balance_failure_is_bad_gateway() {
		let (status, body) = get(app(unreachable_engine(Duration::ZERO)), &route_uri("1")).await;
		assert_eq!(status, StatusCode::BAD_GATEWAY);
		assert_eq!(body["error"], "PROVIDER_ERROR");
	}

	#[tokio::test(start_paused = true)]
	async fn test_slow_planner_times_out() {
		let engine = unreachable_engine(Duration::from_secs(3600));
		let (status, body) = get(app(engine), &route_uri("1")).await;
		assert_eq!(status, StatusCode::GATEWAY_TIMEOUT);
		assert_eq!(body["error"], "TIMEOUT");
	}

	#[tokio::test]
	async fn test_cors_allow_list() {
		let cors = CorsConfig {
			allowed_origins: vec!["https://app.example".to_string()],
		};
		let app = create_app(
			AppState {
				engine: mock_engine(),
				request_timeout: Duration::from_secs(5),
			},
			Some(&cors),
		);

		let response = app
			.oneshot(
				Request::builder()
					.uri("/health")
					.header("origin", "https://app.example")
					.body(Body::empty())
					.unwrap(),
			)
			.await
			.unwrap();
		assert_eq!(
			response.headers().get("access-control-allow-origin").unwrap(),
			"https://app.example"
		);
	}
}
