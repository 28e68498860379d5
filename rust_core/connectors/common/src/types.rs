use std::fmt;
use std::str::FromStr;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::errors::ConfigurationError;

const MAX_ASSET_LEN: usize = 16;

/// A trading pair such as BTC/EUR. Assets are upper-cased on construction.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(into = "String", try_from = "String")]
pub struct Pair {
    base: String,
    quote: String,
}

impl Pair {
    pub fn new(base: &str, quote: &str) -> Result<Self, ConfigurationError> {
        let base = normalize_asset("base", base)?;
        let quote = normalize_asset("quote", quote)?;
        if base == quote {
            return Err(ConfigurationError::SameAsset(base));
        }
        Ok(Pair { base, quote })
    }

    pub fn base(&self) -> &str {
        &self.base
    }

    pub fn quote(&self) -> &str {
        &self.quote
    }

    /// `BASE{sep}QUOTE`, the form most exchanges use for symbols.
    pub fn joined(&self, sep: &str) -> String {
        format!("{}{}{}", self.base, sep, self.quote)
    }
}

fn normalize_asset(field: &'static str, raw: &str) -> Result<String, ConfigurationError> {
    let trimmed = raw.trim();
    if trimmed.is_empty() {
        return Err(ConfigurationError::Empty { field });
    }
    if trimmed.len() > MAX_ASSET_LEN || !trimmed.chars().all(|c| c.is_ascii_alphanumeric()) {
        return Err(ConfigurationError::InvalidAsset {
            field,
            value: trimmed.to_string(),
        });
    }
    Ok(trimmed.to_ascii_uppercase())
}

impl fmt::Display for Pair {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}/{}", self.base, self.quote)
    }
}

impl FromStr for Pair {
    type Err = ConfigurationError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let (base, quote) = s
            .split_once('/')
            .ok_or_else(|| ConfigurationError::MalformedPair(s.to_string()))?;
        Pair::new(base, quote)
    }
}

impl From<Pair> for String {
    fn from(pair: Pair) -> Self {
        pair.to_string()
    }
}

impl TryFrom<String> for Pair {
    type Error = ConfigurationError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        value.parse()
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Ticker {
    pub exchange: String,
    pub pair: Pair,
    pub bid: f64,
    pub ask: f64,
    pub last: f64,
    pub timestamp: DateTime<Utc>,
}

impl Ticker {
    /// Finite, strictly positive bid. Exchanges send zero for an empty side.
    pub fn has_bid(&self) -> bool {
        is_positive(self.bid)
    }

    pub fn has_ask(&self) -> bool {
        is_positive(self.ask)
    }

    /// At least one side carries a price.
    pub fn is_quoted(&self) -> bool {
        self.has_bid() || self.has_ask()
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct OrderBookLevel {
    pub price: f64,
    pub quantity: f64,
}

impl OrderBookLevel {
    pub fn new(price: f64, quantity: f64) -> Self {
        OrderBookLevel { price, quantity }
    }

    pub fn is_valid(&self) -> bool {
        is_positive(self.price) && is_positive(self.quantity)
    }
}

/// One exchange's book. Bids are best (highest) first, asks lowest first.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct OrderBook {
    pub exchange: String,
    pub pair: Pair,
    pub bids: Vec<OrderBookLevel>,
    pub asks: Vec<OrderBookLevel>,
    pub timestamp: DateTime<Utc>,
}

fn is_positive(v: f64) -> bool {
    v.is_finite() && v > 0.0
}
