use aggregator::{AggregatedOrderBook, ArbitrageOpportunity};
use axum::{
    extract::{Path, Query, State},
    Json,
};
use chrono::{DateTime, Utc};
use connectors_common::{Pair, Ticker};
use log::debug;
use serde::ser::SerializeMap;
use serde::{Deserialize, Serialize, Serializer};

use crate::auth::ApiToken;
use crate::error::ApiError;
use crate::state::AppState;

#[derive(Debug, Serialize)]
pub struct HealthResponse {
    pub status: &'static str,
    pub version: &'static str,
}

pub async fn health() -> Json<HealthResponse> {
    Json(HealthResponse {
        status: "ok",
        version: env!("CARGO_PKG_VERSION"),
    })
}

#[derive(Debug, Serialize)]
pub struct ConnectorInfo {
    pub name: String,
    pub display_name: String,
    pub available: bool,
    /// False for reference-price sources, which never count toward best
    /// prices or arbitrage.
    pub tradable: bool,
}

#[derive(Debug, Serialize)]
pub struct ConnectorsResponse {
    pub connectors: Vec<ConnectorInfo>,
}

pub async fn connectors(State(state): State<AppState>) -> Json<ConnectorsResponse> {
    let connectors = state
        .registry
        .all()
        .iter()
        .map(|c| ConnectorInfo {
            name: c.name().to_string(),
            display_name: c.display_name().to_string(),
            available: c.is_available(),
            tradable: c.is_tradable(),
        })
        .collect();
    Json(ConnectorsResponse { connectors })
}

/// Tickers as a JSON object keyed by exchange, in registration order.
#[derive(Debug)]
pub struct TickerMap(pub Vec<Ticker>);

impl Serialize for TickerMap {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        let mut map = serializer.serialize_map(Some(self.0.len()))?;
        for ticker in &self.0 {
            map.serialize_entry(&ticker.exchange, ticker)?;
        }
        map.end()
    }
}

#[derive(Debug, Serialize)]
pub struct TickerResponse {
    pub pair: Pair,
    /// Connectors that failed are absent.
    pub tickers: TickerMap,
    pub best_bid: Option<f64>,
    pub best_ask: Option<f64>,
    pub timestamp: DateTime<Utc>,
}

pub async fn ticker(
    State(state): State<AppState>,
    Path((base, quote)): Path<(String, String)>,
) -> Result<Json<TickerResponse>, ApiError> {
    let pair = Pair::new(&base, &quote)?;
    let snapshot = state.registry.snapshot(&pair).await;
    debug!("ticker {}: {} sources", pair, snapshot.tickers.len());

    Ok(Json(TickerResponse {
        tickers: TickerMap(snapshot.tickers),
        best_bid: snapshot.best_bid,
        best_ask: snapshot.best_ask,
        pair,
        timestamp: Utc::now(),
    }))
}

#[derive(Debug, Deserialize)]
pub struct OrderBookParams {
    /// Kept as text so malformed values fall back to the default instead of
    /// rejecting the request.
    pub depth: Option<String>,
}

#[derive(Debug, Serialize)]
pub struct OrderBookResponse {
    pub pair: Pair,
    pub orderbook: AggregatedOrderBook,
    pub timestamp: DateTime<Utc>,
}

pub async fn orderbook(
    State(state): State<AppState>,
    Path((base, quote)): Path<(String, String)>,
    Query(params): Query<OrderBookParams>,
) -> Result<Json<OrderBookResponse>, ApiError> {
    let pair = Pair::new(&base, &quote)?;
    let depth = state.resolve_depth(params.depth.as_deref());
    let orderbook = state.registry.get_aggregated_order_book(&pair, depth).await;
    debug!(
        "orderbook {} depth {}: best {:?}/{:?} spread {:?} from {:?}",
        pair,
        depth,
        orderbook.best_bid().map(|l| l.price),
        orderbook.best_ask().map(|l| l.price),
        orderbook.spread(),
        orderbook.sources
    );

    Ok(Json(OrderBookResponse {
        pair,
        orderbook,
        timestamp: Utc::now(),
    }))
}

#[derive(Debug, Serialize)]
pub struct ArbitrageResponse {
    pub pair: Pair,
    pub opportunities: Vec<ArbitrageOpportunity>,
    pub timestamp: DateTime<Utc>,
}

pub async fn arbitrage(
    _token: ApiToken,
    State(state): State<AppState>,
    Path((base, quote)): Path<(String, String)>,
) -> Result<Json<ArbitrageResponse>, ApiError> {
    let pair = Pair::new(&base, &quote)?;
    let opportunities = state.liquidity.find_arbitrage_opportunities(&pair).await;

    Ok(Json(ArbitrageResponse {
        pair,
        opportunities,
        timestamp: Utc::now(),
    }))
}

pub async fn not_found() -> ApiError {
    ApiError::NotFound("no such route".into())
}
