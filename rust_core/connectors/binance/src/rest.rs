use async_trait::async_trait;
use chrono::{DateTime, TimeZone, Utc};
use connectors_common::rest::{self, RestClient, RestConfig};
use connectors_common::{ConnectorError, ExchangeConnector, OrderBook, Pair, Ticker};
use serde_json::Value;

pub const NAME: &str = "binance";
pub const DEFAULT_BASE_URL: &str = "https://api.binance.com";

// /api/v3/depth only accepts these limits.
const DEPTH_LIMITS: [usize; 8] = [5, 10, 20, 50, 100, 500, 1000, 5000];
const INVALID_SYMBOL: i64 = -1121;

pub struct BinanceConnector {
    config: RestConfig,
    client: RestClient,
}

impl BinanceConnector {
    pub fn new(config: RestConfig) -> Result<Self, ConnectorError> {
        let client = RestClient::new(&config)?;
        Ok(BinanceConnector { config, client })
    }

    pub fn symbol(pair: &Pair) -> String {
        pair.joined("")
    }

    async fn get(
        &self,
        path: &str,
        query: &[(&str, String)],
        pair: &Pair,
    ) -> Result<Value, ConnectorError> {
        self.client.get_json(path, query).await.map_err(|e| match e {
            ConnectorError::Status { status: 400, ref body }
                if error_code(body) == Some(INVALID_SYMBOL) =>
            {
                ConnectorError::UnsupportedPair(pair.to_string())
            }
            other => other,
        })
    }
}

#[async_trait]
impl ExchangeConnector for BinanceConnector {
    fn name(&self) -> &str {
        NAME
    }

    fn display_name(&self) -> &str {
        "Binance"
    }

    fn is_available(&self) -> bool {
        self.config.is_usable()
    }

    async fn get_ticker(&self, pair: &Pair) -> Result<Ticker, ConnectorError> {
        let body = self
            .get("/api/v3/ticker/24hr", &[("symbol", Self::symbol(pair))], pair)
            .await?;
        parse_ticker(pair, &body)
    }

    async fn get_order_book(&self, pair: &Pair, depth: usize) -> Result<OrderBook, ConnectorError> {
        let query = [
            ("symbol", Self::symbol(pair)),
            ("limit", depth_limit(depth).to_string()),
        ];
        let body = self.get("/api/v3/depth", &query, pair).await?;
        parse_order_book(pair, &body, depth)
    }
}

/// Smallest accepted limit that covers `depth`.
pub fn depth_limit(depth: usize) -> usize {
    DEPTH_LIMITS
        .iter()
        .copied()
        .find(|&l| l >= depth)
        .unwrap_or(DEPTH_LIMITS[DEPTH_LIMITS.len() - 1])
}

fn error_code(body: &str) -> Option<i64> {
    serde_json::from_str::<Value>(body).ok()?.get("code")?.as_i64()
}

pub fn parse_ticker(pair: &Pair, v: &Value) -> Result<Ticker, ConnectorError> {
    let timestamp = v
        .get("closeTime")
        .and_then(Value::as_i64)
        .and_then(millis)
        .unwrap_or_else(Utc::now);
    Ok(Ticker {
        exchange: NAME.to_string(),
        pair: pair.clone(),
        bid: rest::number_field(v, "bidPrice")?,
        ask: rest::number_field(v, "askPrice")?,
        last: rest::number_field(v, "lastPrice")?,
        timestamp,
    })
}

pub fn parse_order_book(pair: &Pair, v: &Value, depth: usize) -> Result<OrderBook, ConnectorError> {
    Ok(OrderBook {
        exchange: NAME.to_string(),
        pair: pair.clone(),
        bids: rest::levels(rest::field(v, "bids")?, depth)?,
        asks: rest::levels(rest::field(v, "asks")?, depth)?,
        timestamp: Utc::now(),
    })
}

fn millis(ms: i64) -> Option<DateTime<Utc>> {
    Utc.timestamp_millis_opt(ms).single()
}

#[cfg(test)]
mod tests {
    use super::*;
    use connectors_common::OrderBookLevel;
    use serde_json::json;
    use wiremock::matchers::{path, query_param};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    fn btc_eur() -> Pair {
        Pair::new("BTC", "EUR").unwrap()
    }

    #[test]
    fn depth_limit_rounds_up_to_bucket() {
        assert_eq!(depth_limit(1), 5);
        assert_eq!(depth_limit(20), 20);
        assert_eq!(depth_limit(21), 50);
        assert_eq!(depth_limit(9999), 5000);
    }

    #[test]
    fn parses_24hr_ticker() {
        let body = json!({
            "symbol": "BTCEUR",
            "bidPrice": "61000.10",
            "askPrice": "61000.50",
            "lastPrice": "61000.20",
            "closeTime": 1_700_000_000_000i64
        });
        let t = parse_ticker(&btc_eur(), &body).unwrap();
        assert_eq!(t.exchange, "binance");
        assert_eq!(t.bid, 61000.10);
        assert_eq!(t.ask, 61000.50);
        assert_eq!(t.last, 61000.20);
        assert_eq!(t.timestamp.timestamp_millis(), 1_700_000_000_000);
    }

    #[test]
    fn missing_price_is_parse_error() {
        let body = json!({"symbol": "BTCEUR", "askPrice": "1"});
        assert!(matches!(parse_ticker(&btc_eur(), &body), Err(ConnectorError::Parse(_))));
    }

    #[tokio::test]
    async fn fetches_and_truncates_depth() {
        let server = MockServer::start().await;
        Mock::given(path("/api/v3/depth"))
            .and(query_param("symbol", "BTCEUR"))
            .and(query_param("limit", "5"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({
                "lastUpdateId": 1,
                "bids": [["100.0", "1.0"], ["99.0", "2.0"], ["98.0", "3.0"]],
                "asks": [["101.0", "1.0"], ["102.0", "2.0"]]
            })))
            .mount(&server)
            .await;

        let connector = BinanceConnector::new(RestConfig::new(server.uri())).unwrap();
        let book = connector.get_order_book(&btc_eur(), 2).await.unwrap();
        assert_eq!(
            book.bids,
            vec![OrderBookLevel::new(100.0, 1.0), OrderBookLevel::new(99.0, 2.0)]
        );
        assert_eq!(book.asks.len(), 2);
    }

    #[tokio::test]
    async fn invalid_symbol_is_unsupported_pair() {
        let server = MockServer::start().await;
        Mock::given(path("/api/v3/ticker/24hr"))
            .respond_with(
                ResponseTemplate::new(400)
                    .set_body_string(r#"{"code":-1121,"msg":"Invalid symbol."}"#),
            )
            .mount(&server)
            .await;

        let connector = BinanceConnector::new(RestConfig::new(server.uri())).unwrap();
        assert_eq!(
            connector.get_ticker(&btc_eur()).await,
            Err(ConnectorError::UnsupportedPair("BTC/EUR".into()))
        );
    }

    #[test]
    fn disabled_config_is_unavailable() {
        let connector =
            BinanceConnector::new(RestConfig::new(DEFAULT_BASE_URL).with_enabled(false)).unwrap();
        assert!(!connector.is_available());
    }
}
