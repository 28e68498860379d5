use async_trait::async_trait;
use chrono::{TimeZone, Utc};
use connectors_common::rest::{self, RestClient, RestConfig};
use connectors_common::{ConnectorError, ExchangeConnector, OrderBook, Pair, Ticker};
use serde_json::Value;

pub const NAME: &str = "coingecko";
pub const DEFAULT_BASE_URL: &str = "https://api.coingecko.com";

/// Reference-price source: it reports one price per coin, so bid, ask and
/// last are all that price and there is no order book.
pub struct CoinGeckoConnector {
    config: RestConfig,
    client: RestClient,
}

impl CoinGeckoConnector {
    pub fn new(config: RestConfig) -> Result<Self, ConnectorError> {
        let client = RestClient::new(&config)?;
        Ok(CoinGeckoConnector { config, client })
    }
}

/// CoinGecko addresses coins by id, not ticker symbol.
pub fn coin_id(symbol: &str) -> Option<&'static str> {
    Some(match symbol {
        "BTC" => "bitcoin",
        "ETH" => "ethereum",
        "SOL" => "solana",
        "XRP" => "ripple",
        "ADA" => "cardano",
        "DOGE" => "dogecoin",
        "DOT" => "polkadot",
        "LTC" => "litecoin",
        "LINK" => "chainlink",
        "USDT" => "tether",
        "USDC" => "usd-coin",
        _ => return None,
    })
}

#[async_trait]
impl ExchangeConnector for CoinGeckoConnector {
    fn name(&self) -> &str {
        NAME
    }

    fn display_name(&self) -> &str {
        "CoinGecko"
    }

    fn is_available(&self) -> bool {
        self.config.is_usable()
    }

    fn is_tradable(&self) -> bool {
        false
    }

    async fn get_ticker(&self, pair: &Pair) -> Result<Ticker, ConnectorError> {
        let id = coin_id(pair.base())
            .ok_or_else(|| ConnectorError::UnsupportedPair(pair.to_string()))?;
        let query = [
            ("ids", id.to_string()),
            ("vs_currencies", pair.quote().to_ascii_lowercase()),
            ("include_last_updated_at", "true".to_string()),
        ];
        let body = self.client.get_json("/api/v3/simple/price", &query).await?;
        parse_ticker(pair, &body)
    }

    async fn get_order_book(
        &self,
        _pair: &Pair,
        _depth: usize,
    ) -> Result<OrderBook, ConnectorError> {
        Err(ConnectorError::Unsupported("order book"))
    }
}

pub fn parse_ticker(pair: &Pair, v: &Value) -> Result<Ticker, ConnectorError> {
    let unsupported = || ConnectorError::UnsupportedPair(pair.to_string());
    let id = coin_id(pair.base()).ok_or_else(unsupported)?;
    let coin = v.get(id).ok_or_else(unsupported)?;
    let price = rest::number(
        coin.get(pair.quote().to_ascii_lowercase().as_str())
            .ok_or_else(unsupported)?,
    )?;
    let timestamp = coin
        .get("last_updated_at")
        .and_then(Value::as_i64)
        .and_then(|s| Utc.timestamp_opt(s, 0).single())
        .unwrap_or_else(Utc::now);
    Ok(Ticker {
        exchange: NAME.to_string(),
        pair: pair.clone(),
        bid: price,
        ask: price,
        last: price,
        timestamp,
    })
}
