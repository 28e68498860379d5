use std::future::Future;
use std::sync::Arc;
use std::time::Duration;

use connectors_common::{ConnectorError, ExchangeConnector, OrderBook, Pair, Ticker};
use futures::future::join_all;
use log::{debug, warn};
use thiserror::Error;

use crate::book::AggregatedOrderBook;

pub const DEFAULT_CONNECTOR_TIMEOUT: Duration = Duration::from_secs(2);

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum RegistryError {
    #[error("connector {0:?} is already registered")]
    DuplicateConnector(String),
}

/// Registration table of exchange connectors. Built once at startup and
/// read-only afterwards, so it is shared behind an `Arc` without locking.
pub struct ConnectorRegistry {
    connectors: Vec<Arc<dyn ExchangeConnector>>,
    timeout: Duration,
}

pub struct RegistryBuilder {
    connectors: Vec<Arc<dyn ExchangeConnector>>,
    timeout: Duration,
}

impl RegistryBuilder {
    pub fn register<C: ExchangeConnector + 'static>(
        self,
        connector: C,
    ) -> Result<Self, RegistryError> {
        self.register_arc(Arc::new(connector))
    }

    pub fn register_arc(
        mut self,
        connector: Arc<dyn ExchangeConnector>,
    ) -> Result<Self, RegistryError> {
        if self.connectors.iter().any(|c| c.name() == connector.name()) {
            return Err(RegistryError::DuplicateConnector(connector.name().to_string()));
        }
        self.connectors.push(connector);
        Ok(self)
    }

    /// Upper bound for a single connector call during fan-out.
    pub fn timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }

    pub fn build(self) -> ConnectorRegistry {
        ConnectorRegistry {
            connectors: self.connectors,
            timeout: self.timeout,
        }
    }
}

/// Tickers from every connector that answered for one pair, with the best
/// prices across them.
#[derive(Debug, Clone)]
pub struct MarketSnapshot {
    pub pair: Pair,
    pub tickers: Vec<Ticker>,
    pub best_bid: Option<f64>,
    pub best_ask: Option<f64>,
}

impl ConnectorRegistry {
    pub fn builder() -> RegistryBuilder {
        RegistryBuilder {
            connectors: Vec::new(),
            timeout: DEFAULT_CONNECTOR_TIMEOUT,
        }
    }

    /// Every registered connector, in registration order.
    pub fn all(&self) -> &[Arc<dyn ExchangeConnector>] {
        &self.connectors
    }

    pub fn available(&self) -> Vec<&Arc<dyn ExchangeConnector>> {
        self.connectors.iter().filter(|c| c.is_available()).collect()
    }

    pub fn get(&self, name: &str) -> Option<&Arc<dyn ExchangeConnector>> {
        self.connectors.iter().find(|c| c.name() == name)
    }

    pub fn len(&self) -> usize {
        self.connectors.len()
    }

    pub fn is_empty(&self) -> bool {
        self.connectors.is_empty()
    }

    pub fn timeout(&self) -> Duration {
        self.timeout
    }

    /// Calls every available connector concurrently, each bounded by the
    /// registry timeout. Results come back in registration order. Nothing is
    /// spawned: dropping the returned future abandons every in-flight call.
    async fn fan_out<'a, T, F, Fut>(&'a self, call: F) -> Vec<(&'a str, Result<T, ConnectorError>)>
    where
        F: Fn(&'a dyn ExchangeConnector) -> Fut,
        Fut: Future<Output = Result<T, ConnectorError>>,
    {
        let timeout = self.timeout;
        let calls = self.available().into_iter().map(|connector| {
            let request = call(connector.as_ref());
            async move {
                let result = match tokio::time::timeout(timeout, request).await {
                    Ok(result) => result,
                    Err(_) => Err(ConnectorError::Timeout(timeout)),
                };
                (connector.name(), result)
            }
        });
        join_all(calls).await
    }

    /// Successful tickers for `pair`, in registration order. Failed,
    /// mislabelled and unpriced quotes are logged and left out. One-sided
    /// quotes are kept.
    pub async fn tickers(&self, pair: &Pair) -> Vec<Ticker> {
        let outcomes = self.fan_out(|c| c.get_ticker(pair)).await;
        outcomes
            .into_iter()
            .filter_map(|(name, result)| {
                match result.and_then(|t| check_source(name, &t.exchange).map(|_| t)) {
                    Ok(t) if t.is_quoted() => Some(t),
                    Ok(t) => {
                        warn!(
                            "{} returned an unpriced quote for {}: bid={} ask={}",
                            name, pair, t.bid, t.ask
                        );
                        None
                    }
                    Err(e) => {
                        warn!("{} ticker for {} failed: {}", name, pair, e);
                        None
                    }
                }
            })
            .collect()
    }

    /// False for unknown names and for reference-price connectors.
    pub fn is_tradable(&self, name: &str) -> bool {
        self.get(name).map_or(false, |c| c.is_tradable())
    }

    /// Tickers from connectors whose prices can be traded on.
    pub fn tradable<'a>(&'a self, tickers: &'a [Ticker]) -> impl Iterator<Item = &'a Ticker> + 'a {
        tickers.iter().filter(move |t| self.is_tradable(&t.exchange))
    }

    /// Every quote that came back, with best prices taken from tradable
    /// connectors only.
    pub async fn snapshot(&self, pair: &Pair) -> MarketSnapshot {
        let tickers = self.tickers(pair).await;
        debug!("{} tickers for {}", tickers.len(), pair);
        MarketSnapshot {
            pair: pair.clone(),
            best_bid: best_bid(self.tradable(&tickers)),
            best_ask: best_ask(self.tradable(&tickers)),
            tickers,
        }
    }

    /// Highest bid across tradable connectors that answered; `None` when
    /// none did.
    pub async fn get_best_bid(&self, pair: &Pair) -> Option<f64> {
        self.snapshot(pair).await.best_bid
    }

    /// Lowest ask across tradable connectors that answered; `None` when
    /// none did.
    pub async fn get_best_ask(&self, pair: &Pair) -> Option<f64> {
        self.snapshot(pair).await.best_ask
    }

    pub async fn get_aggregated_order_book(
        &self,
        pair: &Pair,
        depth: usize,
    ) -> AggregatedOrderBook {
        if depth == 0 {
            return AggregatedOrderBook::empty(pair.clone(), depth);
        }
        let outcomes = self.fan_out(|c| c.get_order_book(pair, depth)).await;
        let books: Vec<OrderBook> = outcomes
            .into_iter()
            .filter_map(|(name, result)| {
                match result.and_then(|b| check_source(name, &b.exchange).map(|_| b)) {
                    Ok(book) => Some(book),
                    Err(e) => {
                        warn!("{} order book for {} failed: {}", name, pair, e);
                        None
                    }
                }
            })
            .collect();
        AggregatedOrderBook::merge(pair.clone(), depth, books)
    }
}

fn check_source(connector: &str, found: &str) -> Result<(), ConnectorError> {
    if connector == found {
        Ok(())
    } else {
        Err(ConnectorError::SourceMismatch {
            expected: connector.to_string(),
            found: found.to_string(),
        })
    }
}

/// Highest priced bid; empty bid sides are skipped.
pub fn best_bid<'a>(tickers: impl IntoIterator<Item = &'a Ticker>) -> Option<f64> {
    tickers.into_iter().filter(|t| t.has_bid()).map(|t| t.bid).reduce(f64::max)
}

/// Lowest priced ask; empty ask sides are skipped.
pub fn best_ask<'a>(tickers: impl IntoIterator<Item = &'a Ticker>) -> Option<f64> {
    tickers.into_iter().filter(|t| t.has_ask()).map(|t| t.ask).reduce(f64::min)
}
