//! Thin JSON-over-HTTP client shared by the REST connectors, plus helpers for
//! the loosely typed payloads exchanges return (numbers as strings, ladders
//! as nested arrays).

use std::time::Duration;

use log::debug;
use reqwest::{Client, StatusCode};
use serde_json::Value;

use crate::errors::ConnectorError;
use crate::types::OrderBookLevel;

const USER_AGENT: &str = concat!("exchange-aggregator/", env!("CARGO_PKG_VERSION"));

#[derive(Debug, Clone)]
pub struct RestConfig {
    pub base_url: String,
    pub enabled: bool,
    pub timeout: Duration,
}

impl RestConfig {
    pub fn new(base_url: impl Into<String>) -> Self {
        RestConfig {
            base_url: base_url.into(),
            enabled: true,
            timeout: Duration::from_secs(5),
        }
    }

    pub fn with_enabled(mut self, enabled: bool) -> Self {
        self.enabled = enabled;
        self
    }

    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }

    /// Enabled and pointing somewhere. Used for `is_available`.
    pub fn is_usable(&self) -> bool {
        self.enabled && !self.base_url.trim().is_empty()
    }
}

#[derive(Debug, Clone)]
pub struct RestClient {
    http: Client,
    base_url: String,
    timeout: Duration,
}

impl RestClient {
    pub fn new(config: &RestConfig) -> Result<Self, ConnectorError> {
        let http = Client::builder()
            .timeout(config.timeout)
            .user_agent(USER_AGENT)
            .build()
            .map_err(|e| ConnectorError::Other(format!("http client: {e}")))?;
        Ok(RestClient {
            http,
            base_url: config.base_url.trim_end_matches('/').to_string(),
            timeout: config.timeout,
        })
    }

    pub async fn get_json(
        &self,
        path: &str,
        query: &[(&str, String)],
    ) -> Result<Value, ConnectorError> {
        let url = format!("{}{}", self.base_url, path);
        debug!("GET {} {:?}", url, query);
        let resp = self
            .http
            .get(&url)
            .query(query)
            .send()
            .await
            .map_err(|e| self.transport_error(e))?;
        let status = resp.status();
        let body = resp.text().await.map_err(|e| self.transport_error(e))?;
        check_status(status, &body)?;
        serde_json::from_str(&body).map_err(|e| ConnectorError::parse(format!("{url}: {e}")))
    }

    fn transport_error(&self, e: reqwest::Error) -> ConnectorError {
        if e.is_timeout() {
            ConnectorError::Timeout(self.timeout)
        } else {
            ConnectorError::Network(e.to_string())
        }
    }
}

fn check_status(status: StatusCode, body: &str) -> Result<(), ConnectorError> {
    if status.is_success() {
        return Ok(());
    }
    let snippet: String = body.chars().take(200).collect();
    Err(match status.as_u16() {
        429 | 418 => ConnectorError::RateLimited(snippet),
        401 | 403 => ConnectorError::Auth(snippet),
        code => ConnectorError::Status { status: code, body: snippet },
    })
}

pub fn field<'a>(v: &'a Value, key: &str) -> Result<&'a Value, ConnectorError> {
    v.get(key)
        .ok_or_else(|| ConnectorError::parse(format!("missing field {key:?}")))
}

/// Exchanges send prices either as JSON numbers or as decimal strings.
pub fn number(v: &Value) -> Result<f64, ConnectorError> {
    match v {
        Value::Number(n) => n
            .as_f64()
            .ok_or_else(|| ConnectorError::parse(format!("number out of range: {n}"))),
        Value::String(s) => s
            .trim()
            .parse::<f64>()
            .map_err(|_| ConnectorError::parse(format!("not a number: {s:?}"))),
        other => Err(ConnectorError::parse(format!("expected number, got {other}"))),
    }
}

pub fn number_field(v: &Value, key: &str) -> Result<f64, ConnectorError> {
    number(field(v, key)?)
}

/// `[[price, qty, ...], ...]` -> levels, keeping at most `depth` entries.
pub fn levels(v: &Value, depth: usize) -> Result<Vec<OrderBookLevel>, ConnectorError> {
    let rows = v
        .as_array()
        .ok_or_else(|| ConnectorError::parse("order book side is not an array"))?;
    rows.iter()
        .take(depth)
        .map(|row| {
            let price = row.get(0).ok_or_else(|| ConnectorError::parse("level without price"))?;
            let qty = row.get(1).ok_or_else(|| ConnectorError::parse("level without quantity"))?;
            Ok(OrderBookLevel::new(number(price)?, number(qty)?))
        })
        .collect()
}
