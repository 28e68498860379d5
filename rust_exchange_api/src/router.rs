use axum::{routing::get, Router};

use crate::handlers;
use crate::state::AppState;

pub fn create_router(state: AppState) -> Router {
    let exchange_routes = Router::new()
        .route("/connectors", get(handlers::connectors))
        .route("/ticker/:base/:quote", get(handlers::ticker))
        .route("/orderbook/:base/:quote", get(handlers::orderbook))
        .route("/arbitrage/:base/:quote", get(handlers::arbitrage));

    Router::new()
        .route("/health", get(handlers::health))
        .nest("/exchange", exchange_routes)
        .fallback(handlers::not_found)
        .with_state(state)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::auth::TokenSet;
    use aggregator::testkit::StaticConnector;
    use aggregator::{ConnectorRegistry, LiquidityService};
    use axum::body::Body;
    use axum::http::{header, Request, StatusCode};
    use connectors_common::ConnectorError;
    use serde_json::Value;
    use std::sync::Arc;
    use tower::ServiceExt;

    fn make_state() -> AppState {
        let registry = ConnectorRegistry::builder()
            .register(
                StaticConnector::new("alpha")
                    .with_display_name("Alpha Exchange")
                    .with_quote(99.0, 100.0)
                    .with_book(&[(99.0, 1.0), (98.0, 2.0)], &[(100.0, 1.0), (101.0, 2.0)]),
            )
            .unwrap()
            .register(
                StaticConnector::new("broken")
                    .with_quote(500.0, 1.0)
                    .failing(ConnectorError::Network("connection reset".into())),
            )
            .unwrap()
            .register(
                StaticConnector::new("beta")
                    .with_quote(101.0, 105.0)
                    .with_book(&[(101.0, 3.0)], &[(105.0, 1.0)]),
            )
            .unwrap()
            .register(StaticConnector::new("offline").with_quote(1.0, 2.0).unavailable())
            .unwrap()
            .build();
        AppState::new(Arc::new(registry), TokenSet::new(["secret-token"]))
    }

    async fn get_json(state: AppState, uri: &str, token: Option<&str>) -> (StatusCode, Value) {
        let mut request = Request::builder().uri(uri);
        if let Some(token) = token {
            request = request.header(header::AUTHORIZATION, format!("Bearer {}", token));
        }
        let response = create_router(state)
            .oneshot(request.body(Body::empty()).unwrap())
            .await
            .unwrap();
        let status = response.status();
        let bytes = axum::body::to_bytes(response.into_body(), usize::MAX).await.unwrap();
        (status, serde_json::from_slice(&bytes).unwrap())
    }

    #[tokio::test]
    async fn health_check() {
        let (status, body) = get_json(make_state(), "/health", None).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["status"], "ok");
        assert_eq!(body["version"], env!("CARGO_PKG_VERSION"));
    }

    #[tokio::test]
    async fn lists_connectors_in_registration_order() {
        let (status, body) = get_json(make_state(), "/exchange/connectors", None).await;
        assert_eq!(status, StatusCode::OK);
        let connectors = body["connectors"].as_array().unwrap();
        let names: Vec<_> = connectors.iter().map(|c| c["name"].as_str().unwrap()).collect();
        assert_eq!(names, vec!["alpha", "broken", "beta", "offline"]);
        assert_eq!(connectors[0]["display_name"], "Alpha Exchange");
        assert_eq!(connectors[1]["display_name"], "broken");
        assert_eq!(connectors[3]["available"], false);
        assert!(connectors.iter().all(|c| c["tradable"] == true));
    }

    fn state_with_reference_feed() -> AppState {
        let registry = ConnectorRegistry::builder()
            .register(StaticConnector::new("thin").with_quote(0.0, 100.0))
            .unwrap()
            .register(StaticConnector::new("venue").with_quote(99.0, 105.0))
            .unwrap()
            .register(StaticConnector::new("gecko").with_quote(98.0, 98.0).reference_only())
            .unwrap()
            .build();
        AppState::new(Arc::new(registry), TokenSet::new(["secret-token"]))
    }

    #[tokio::test]
    async fn one_sided_and_reference_quotes_are_listed() {
        let (status, body) =
            get_json(state_with_reference_feed(), "/exchange/ticker/BTC/EUR", None).await;
        assert_eq!(status, StatusCode::OK);
        let tickers = body["tickers"].as_object().unwrap();
        assert_eq!(tickers.len(), 3);
        assert_eq!(body["best_bid"], 99.0);
        assert_eq!(body["best_ask"], 100.0);

        let (_, body) = get_json(state_with_reference_feed(), "/exchange/connectors", None).await;
        let gecko = &body["connectors"][2];
        assert_eq!(gecko["name"], "gecko");
        assert_eq!(gecko["tradable"], false);
    }

    #[tokio::test]
    async fn arbitrage_skips_reference_feed() {
        let (status, body) = get_json(
            state_with_reference_feed(),
            "/exchange/arbitrage/BTC/EUR",
            Some("secret-token"),
        )
        .await;
        assert_eq!(status, StatusCode::OK);
        // thin ask 100 vs venue bid 99 is no edge; gecko at 98 would be
        assert!(body["opportunities"].as_array().unwrap().is_empty());
    }

    #[tokio::test]
    async fn ticker_survives_a_failing_connector() {
        let (status, body) = get_json(make_state(), "/exchange/ticker/btc/eur", None).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["pair"], "BTC/EUR");
        let tickers = body["tickers"].as_object().unwrap();
        assert_eq!(tickers.len(), 2);
        assert!(tickers.contains_key("alpha") && tickers.contains_key("beta"));
        assert_eq!(tickers["beta"]["bid"], 101.0);
        assert_eq!(body["best_bid"], 101.0);
        assert_eq!(body["best_ask"], 100.0);
        let timestamp = body["timestamp"].as_str().unwrap();
        assert!(timestamp.parse::<chrono::DateTime<chrono::Utc>>().is_ok());
    }

    #[tokio::test]
    async fn ticker_with_no_data_is_still_ok() {
        let registry = ConnectorRegistry::builder()
            .register(
                StaticConnector::new("down")
                    .failing(ConnectorError::Timeout(std::time::Duration::from_secs(2))),
            )
            .unwrap()
            .build();
        let state = AppState::new(Arc::new(registry), TokenSet::default());
        let (status, body) = get_json(state, "/exchange/ticker/BTC/EUR", None).await;
        assert_eq!(status, StatusCode::OK);
        assert!(body["tickers"].as_object().unwrap().is_empty());
        assert!(body["best_bid"].is_null());
        assert!(body["best_ask"].is_null());
    }

    #[tokio::test]
    async fn malformed_pair_is_rejected() {
        for uri in ["/exchange/ticker/BTC/BTC", "/exchange/orderbook/B-TC/EUR"] {
            let (status, body) = get_json(make_state(), uri, None).await;
            assert_eq!(status, StatusCode::BAD_REQUEST, "{}", uri);
            assert_eq!(body["error"], "BAD_REQUEST");
        }
    }

    #[tokio::test]
    async fn orderbook_merges_and_orders() {
        let (status, body) =
            get_json(make_state(), "/exchange/orderbook/BTC/EUR?depth=2", None).await;
        assert_eq!(status, StatusCode::OK);
        let book = &body["orderbook"];
        assert_eq!(book["depth"], 2);
        assert_eq!(book["sources"], serde_json::json!(["alpha", "beta"]));
        let bids = book["bids"].as_array().unwrap();
        assert_eq!(bids.len(), 2);
        let level = |i: usize| (bids[i]["price"].as_f64(), bids[i]["exchange"].as_str());
        assert_eq!(level(0), (Some(101.0), Some("beta")));
        assert_eq!(level(1), (Some(99.0), Some("alpha")));
        let asks = book["asks"].as_array().unwrap();
        assert_eq!(asks[0]["price"], 100.0);
    }

    #[tokio::test]
    async fn invalid_depth_falls_back_to_default() {
        for query in ["", "?depth=0", "?depth=-5", "?depth=lots"] {
            let uri = format!("/exchange/orderbook/BTC/EUR{}", query);
            let (status, body) = get_json(make_state(), &uri, None).await;
            assert_eq!(status, StatusCode::OK, "{}", uri);
            assert_eq!(body["orderbook"]["depth"], 20, "{}", uri);
        }
        let (_, body) =
            get_json(make_state(), "/exchange/orderbook/BTC/EUR?depth=5000", None).await;
        assert_eq!(body["orderbook"]["depth"], 100);
    }

    #[tokio::test]
    async fn arbitrage_requires_a_valid_token() {
        for token in [None, Some("wrong")] {
            let (status, body) = get_json(make_state(), "/exchange/arbitrage/BTC/EUR", token).await;
            assert_eq!(status, StatusCode::UNAUTHORIZED);
            assert_eq!(body["error"], "UNAUTHORIZED");
        }
    }

    #[tokio::test]
    async fn arbitrage_reports_opportunities() {
        let (status, body) =
            get_json(make_state(), "/exchange/arbitrage/BTC/EUR", Some("secret-token")).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["pair"], "BTC/EUR");
        let opportunities = body["opportunities"].as_array().unwrap();
        assert_eq!(opportunities.len(), 1);
        let o = &opportunities[0];
        assert_eq!(o["buy_exchange"], "alpha");
        assert_eq!(o["sell_exchange"], "beta");
        assert_eq!(o["buy_price"], 100.0);
        assert_eq!(o["sell_price"], 101.0);
        assert_eq!(o["spread"], 1.0);
        assert_eq!(o["spread_percentage"], 1.0);
    }

    #[tokio::test]
    async fn arbitrage_threshold_comes_from_the_service() {
        let state = make_state();
        let liquidity =
            LiquidityService::new(state.registry.clone()).with_min_spread_percentage(5.0);
        let state = state.with_liquidity(liquidity);
        let (_, body) = get_json(state, "/exchange/arbitrage/BTC/EUR", Some("secret-token")).await;
        assert!(body["opportunities"].as_array().unwrap().is_empty());
    }

    #[tokio::test]
    async fn unknown_route_is_json_404() {
        let (status, body) = get_json(make_state(), "/exchange/nope", None).await;
        assert_eq!(status, StatusCode::NOT_FOUND);
        assert_eq!(body["error"], "NOT_FOUND");
    }
}
