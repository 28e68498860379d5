use async_trait::async_trait;
use chrono::Utc;
use connectors_common::rest::{self, RestClient, RestConfig};
use connectors_common::{ConnectorError, ExchangeConnector, OrderBook, Pair, Ticker};
use serde_json::Value;

pub const NAME: &str = "kraken";
pub const DEFAULT_BASE_URL: &str = "https://api.kraken.com";

const MAX_DEPTH: usize = 500;

pub struct KrakenConnector {
    config: RestConfig,
    client: RestClient,
}

impl KrakenConnector {
    pub fn new(config: RestConfig) -> Result<Self, ConnectorError> {
        let client = RestClient::new(&config)?;
        Ok(KrakenConnector { config, client })
    }

    /// Kraken still lists a few assets under their legacy codes.
    pub fn symbol(pair: &Pair) -> String {
        format!("{}{}", asset_code(pair.base()), asset_code(pair.quote()))
    }
}

fn asset_code(asset: &str) -> &str {
    match asset {
        "BTC" => "XBT",
        "DOGE" => "XDG",
        other => other,
    }
}

#[async_trait]
impl ExchangeConnector for KrakenConnector {
    fn name(&self) -> &str {
        NAME
    }

    fn display_name(&self) -> &str {
        "Kraken"
    }

    fn is_available(&self) -> bool {
        self.config.is_usable()
    }

    async fn get_ticker(&self, pair: &Pair) -> Result<Ticker, ConnectorError> {
        let body = self
            .client
            .get_json("/0/public/Ticker", &[("pair", Self::symbol(pair))])
            .await?;
        parse_ticker(pair, &body)
    }

    async fn get_order_book(&self, pair: &Pair, depth: usize) -> Result<OrderBook, ConnectorError> {
        let query = [
            ("pair", Self::symbol(pair)),
            ("count", depth.min(MAX_DEPTH).to_string()),
        ];
        let body = self.client.get_json("/0/public/Depth", &query).await?;
        parse_order_book(pair, &body, depth)
    }
}

/// Unwraps `{"error": [...], "result": {"<kraken pair>": {...}}}`.
fn single_result<'a>(pair: &Pair, v: &'a Value) -> Result<&'a Value, ConnectorError> {
    if let Some(errors) = v.get("error").and_then(Value::as_array) {
        if let Some(first) = errors.iter().filter_map(Value::as_str).next() {
            if first.contains("Unknown asset pair") {
                return Err(ConnectorError::UnsupportedPair(pair.to_string()));
            }
            return Err(ConnectorError::Other(first.to_string()));
        }
    }
    rest::field(v, "result")?
        .as_object()
        .and_then(|m| m.values().next())
        .ok_or_else(|| ConnectorError::UnsupportedPair(pair.to_string()))
}

fn first_number(v: &Value, key: &str) -> Result<f64, ConnectorError> {
    let arr = rest::field(v, key)?;
    rest::number(
        arr.get(0)
            .ok_or_else(|| ConnectorError::parse(format!("{key} is empty")))?,
    )
}

pub fn parse_ticker(pair: &Pair, v: &Value) -> Result<Ticker, ConnectorError> {
    let data = single_result(pair, v)?;
    Ok(Ticker {
        exchange: NAME.to_string(),
        pair: pair.clone(),
        bid: first_number(data, "b")?,
        ask: first_number(data, "a")?,
        last: first_number(data, "c")?,
        timestamp: Utc::now(),
    })
}

pub fn parse_order_book(pair: &Pair, v: &Value, depth: usize) -> Result<OrderBook, ConnectorError> {
    let data = single_result(pair, v)?;
    Ok(OrderBook {
        exchange: NAME.to_string(),
        pair: pair.clone(),
        bids: rest::levels(rest::field(data, "bids")?, depth)?,
        asks: rest::levels(rest::field(data, "asks")?, depth)?,
        timestamp: Utc::now(),
    })
}
