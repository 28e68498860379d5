use async_trait::async_trait;
use chrono::{DateTime, Utc};
use connectors_common::rest::{self, RestClient, RestConfig};
use connectors_common::{ConnectorError, ExchangeConnector, OrderBook, Pair, Ticker};
use serde_json::Value;

pub const NAME: &str = "coinbase";
pub const DEFAULT_BASE_URL: &str = "https://api.exchange.coinbase.com";

pub struct CoinbaseConnector {
    config: RestConfig,
    client: RestClient,
}

impl CoinbaseConnector {
    pub fn new(config: RestConfig) -> Result<Self, ConnectorError> {
        let client = RestClient::new(&config)?;
        Ok(CoinbaseConnector { config, client })
    }

    pub fn product_id(pair: &Pair) -> String {
        pair.joined("-")
    }

    async fn get(
        &self,
        path: String,
        query: &[(&str, String)],
        pair: &Pair,
    ) -> Result<Value, ConnectorError> {
        self.client.get_json(&path, query).await.map_err(|e| match e {
            ConnectorError::Status { status: 404, .. } => {
                ConnectorError::UnsupportedPair(pair.to_string())
            }
            other => other,
        })
    }
}

#[async_trait]
impl ExchangeConnector for CoinbaseConnector {
    fn name(&self) -> &str {
        NAME
    }

    fn display_name(&self) -> &str {
        "Coinbase Exchange"
    }

    fn is_available(&self) -> bool {
        self.config.is_usable()
    }

    async fn get_ticker(&self, pair: &Pair) -> Result<Ticker, ConnectorError> {
        let path = format!("/products/{}/ticker", Self::product_id(pair));
        let body = self.get(path, &[], pair).await?;
        parse_ticker(pair, &body)
    }

    async fn get_order_book(&self, pair: &Pair, depth: usize) -> Result<OrderBook, ConnectorError> {
        // level=2 is the aggregated book; it has no size parameter, so truncate locally.
        let path = format!("/products/{}/book", Self::product_id(pair));
        let body = self.get(path, &[("level", "2".to_string())], pair).await?;
        parse_order_book(pair, &body, depth)
    }
}

pub fn parse_ticker(pair: &Pair, v: &Value) -> Result<Ticker, ConnectorError> {
    let timestamp = v
        .get("time")
        .and_then(Value::as_str)
        .and_then(|s| DateTime::parse_from_rfc3339(s).ok())
        .map(|t| t.with_timezone(&Utc))
        .unwrap_or_else(Utc::now);
    Ok(Ticker {
        exchange: NAME.to_string(),
        pair: pair.clone(),
        bid: rest::number_field(v, "bid")?,
        ask: rest::number_field(v, "ask")?,
        last: rest::number_field(v, "price")?,
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

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;
    use wiremock::matchers::{path, query_param};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    fn eth_usd() -> Pair {
        Pair::new("eth", "usd").unwrap()
    }

    #[test]
    fn parses_ticker_with_time() {
        let body = json!({
            "trade_id": 1,
            "price": "3000.10",
            "bid": "3000.00",
            "ask": "3000.20",
            "time": "2024-05-01T12:00:00.000Z"
        });
        let t = parse_ticker(&eth_usd(), &body).unwrap();
        assert_eq!((t.bid, t.ask, t.last), (3000.0, 3000.2, 3000.1));
        assert_eq!(t.timestamp.to_rfc3339(), "2024-05-01T12:00:00+00:00");
    }

    #[tokio::test]
    async fn fetches_level2_book() {
        let server = MockServer::start().await;
        Mock::given(path("/products/ETH-USD/book"))
            .and(query_param("level", "2"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({
                "sequence": 1,
                "bids": [["2999.0", "1.5", 3], ["2998.0", "1.0", 1]],
                "asks": [["3001.0", "0.5", 1]]
            })))
            .mount(&server)
            .await;

        let connector = CoinbaseConnector::new(RestConfig::new(server.uri())).unwrap();
        let book = connector.get_order_book(&eth_usd(), 1).await.unwrap();
        assert_eq!(book.bids.len(), 1);
        assert_eq!(book.bids[0].price, 2999.0);
        assert_eq!(book.asks[0].quantity, 0.5);
    }

    #[tokio::test]
    async fn unknown_product_is_unsupported_pair() {
        let server = MockServer::start().await;
        Mock::given(path("/products/ETH-USD/ticker"))
            .respond_with(ResponseTemplate::new(404).set_body_string(r#"{"message":"NotFound"}"#))
            .mount(&server)
            .await;

        let connector = CoinbaseConnector::new(RestConfig::new(server.uri())).unwrap();
        assert_eq!(
            connector.get_ticker(&eth_usd()).await,
            Err(ConnectorError::UnsupportedPair("ETH/USD".into()))
        );
    }
}
