use std::collections::HashMap;
use std::net::SocketAddr;
use std::time::Duration;

use aggregator::DEFAULT_CONNECTOR_TIMEOUT;
use thiserror::Error;

pub const DEFAULT_BIND: &str = "0.0.0.0:8080";
pub const DEFAULT_DEPTH: usize = 20;
pub const MAX_DEPTH: usize = 100;

/// Connectors this binary knows how to build.
pub const KNOWN_CONNECTORS: [&str; 4] = [
    connector_binance::NAME,
    connector_kraken::NAME,
    connector_coinbase::NAME,
    connector_coingecko::NAME,
];

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum SettingsError {
    #[error("environment variable {key} has invalid value {value:?}")]
    Invalid { key: &'static str, value: String },
    #[error("unknown connector {0:?} in EXCHANGE_CONNECTORS")]
    UnknownConnector(String),
    #[error(
        "EXCHANGE_ORDERBOOK_DEFAULT_DEPTH ({default}) exceeds \
         EXCHANGE_ORDERBOOK_MAX_DEPTH ({max})"
    )]
    DepthBounds { default: usize, max: usize },
}

#[derive(Debug, Clone, PartialEq)]
pub struct Settings {
    pub bind: SocketAddr,
    /// Connector names in registration order.
    pub connectors: Vec<String>,
    pub connector_timeout: Duration,
    pub default_depth: usize,
    pub max_depth: usize,
    pub min_spread_percentage: f64,
    pub api_tokens: Vec<String>,
    /// Base URL overrides keyed by connector name.
    pub base_urls: HashMap<String, String>,
    /// `<EXCHANGE>_ENABLED` overrides keyed by connector name.
    pub enabled: HashMap<String, bool>,
}

impl Settings {
    pub fn from_env() -> Result<Self, SettingsError> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Same as `from_env` but reading variables through `lookup`. Empty values
    /// count as unset.
    pub fn from_lookup<F>(lookup: F) -> Result<Self, SettingsError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let get = |key: &str| {
            lookup(key)
                .map(|v| v.trim().to_string())
                .filter(|v| !v.is_empty())
        };

        let bind: SocketAddr = parse_or("EXCHANGE_API_BIND", get("EXCHANGE_API_BIND"), || {
            DEFAULT_BIND.parse().map_err(|_| SettingsError::Invalid {
                key: "EXCHANGE_API_BIND",
                value: DEFAULT_BIND.to_string(),
            })
        })?;

        let connectors = match get("EXCHANGE_CONNECTORS") {
            Some(raw) => parse_connectors(&raw)?,
            None => KNOWN_CONNECTORS.iter().map(|s| s.to_string()).collect(),
        };

        let connector_timeout = parse_or(
            "EXCHANGE_CONNECTOR_TIMEOUT_MS",
            get("EXCHANGE_CONNECTOR_TIMEOUT_MS"),
            || Ok(DEFAULT_CONNECTOR_TIMEOUT.as_millis() as u64),
        )
        .map(Duration::from_millis)?;

        let default_depth = parse_or(
            "EXCHANGE_ORDERBOOK_DEFAULT_DEPTH",
            get("EXCHANGE_ORDERBOOK_DEFAULT_DEPTH"),
            || Ok(DEFAULT_DEPTH),
        )?;
        let max_depth = parse_or(
            "EXCHANGE_ORDERBOOK_MAX_DEPTH",
            get("EXCHANGE_ORDERBOOK_MAX_DEPTH"),
            || Ok(MAX_DEPTH),
        )?;
        if default_depth == 0 {
            return Err(SettingsError::Invalid {
                key: "EXCHANGE_ORDERBOOK_DEFAULT_DEPTH",
                value: "0".into(),
            });
        }
        if default_depth > max_depth {
            return Err(SettingsError::DepthBounds {
                default: default_depth,
                max: max_depth,
            });
        }

        let min_spread_percentage: f64 = parse_or(
            "EXCHANGE_ARBITRAGE_MIN_SPREAD_PCT",
            get("EXCHANGE_ARBITRAGE_MIN_SPREAD_PCT"),
            || Ok(0.0),
        )?;
        if !min_spread_percentage.is_finite() || min_spread_percentage < 0.0 {
            return Err(SettingsError::Invalid {
                key: "EXCHANGE_ARBITRAGE_MIN_SPREAD_PCT",
                value: min_spread_percentage.to_string(),
            });
        }

        let api_tokens = get("EXCHANGE_API_TOKENS")
            .map(|raw| split_list(&raw))
            .unwrap_or_default();

        let mut base_urls = HashMap::new();
        let mut enabled = HashMap::new();
        for (name, url_key, enabled_key) in [
            (connector_binance::NAME, "BINANCE_BASE_URL", "BINANCE_ENABLED"),
            (connector_kraken::NAME, "KRAKEN_BASE_URL", "KRAKEN_ENABLED"),
            (connector_coinbase::NAME, "COINBASE_BASE_URL", "COINBASE_ENABLED"),
            (connector_coingecko::NAME, "COINGECKO_BASE_URL", "COINGECKO_ENABLED"),
        ] {
            if let Some(url) = get(url_key) {
                base_urls.insert(name.to_string(), url);
            }
            if let Some(raw) = get(enabled_key) {
                enabled.insert(name.to_string(), parse_flag(enabled_key, raw)?);
            }
        }

        Ok(Settings {
            bind,
            connectors,
            connector_timeout,
            default_depth,
            max_depth,
            min_spread_percentage,
            api_tokens,
            base_urls,
            enabled,
        })
    }

    /// Connectors are enabled unless their `<EXCHANGE>_ENABLED` says otherwise.
    pub fn is_enabled(&self, connector: &str) -> bool {
        self.enabled.get(connector).copied().unwrap_or(true)
    }

    pub fn base_url<'a>(&'a self, connector: &str, default: &'a str) -> &'a str {
        self.base_urls.get(connector).map(String::as_str).unwrap_or(default)
    }
}

fn parse_or<T, D>(key: &'static str, raw: Option<String>, default: D) -> Result<T, SettingsError>
where
    T: std::str::FromStr,
    D: FnOnce() -> Result<T, SettingsError>,
{
    match raw {
        Some(value) => value.parse().map_err(|_| SettingsError::Invalid { key, value }),
        None => default(),
    }
}

fn parse_flag(key: &'static str, raw: String) -> Result<bool, SettingsError> {
    match raw.to_ascii_lowercase().as_str() {
        "1" | "true" | "yes" | "on" => Ok(true),
        "0" | "false" | "no" | "off" => Ok(false),
        _ => Err(SettingsError::Invalid { key, value: raw }),
    }
}

fn split_list(raw: &str) -> Vec<String> {
    raw.split(',')
        .map(str::trim)
        .filter(|s| !s.is_empty())
        .map(str::to_string)
        .collect()
}

fn parse_connectors(raw: &str) -> Result<Vec<String>, SettingsError> {
    let mut names: Vec<String> = Vec::new();
    for name in split_list(raw) {
        let name = name.to_ascii_lowercase();
        if !KNOWN_CONNECTORS.contains(&name.as_str()) {
            return Err(SettingsError::UnknownConnector(name));
        }
        if !names.contains(&name) {
            names.push(name);
        }
    }
    Ok(names)
}
