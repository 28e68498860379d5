//! Scripted connectors for tests. Enabled under `cfg(test)` or the
//! `testkit` feature.

use std::sync::atomic::{AtomicUsize, Ordering};
use std::time::Duration;

use async_trait::async_trait;
use chrono::Utc;
use connectors_common::{ConnectorError, ExchangeConnector, OrderBook, OrderBookLevel, Pair, Ticker};

/// Returns the same quote and book for any pair, optionally after a delay,
/// or always fails with a fixed error.
pub struct StaticConnector {
    name: String,
    display_name: Option<String>,
    available: bool,
    tradable: bool,
    quote: Option<(f64, f64)>,
    book: Option<(Vec<OrderBookLevel>, Vec<OrderBookLevel>)>,
    error: Option<ConnectorError>,
    tag: Option<String>,
    delay: Duration,
    calls: AtomicUsize,
}

impl StaticConnector {
    pub fn new(name: &str) -> Self {
        StaticConnector {
            name: name.to_string(),
            display_name: None,
            available: true,
            tradable: true,
            quote: None,
            book: None,
            error: None,
            tag: None,
            delay: Duration::ZERO,
            calls: AtomicUsize::new(0),
        }
    }

    pub fn with_quote(mut self, bid: f64, ask: f64) -> Self {
        self.quote = Some((bid, ask));
        self
    }

    pub fn with_book(mut self, bids: &[(f64, f64)], asks: &[(f64, f64)]) -> Self {
        let side = |levels: &[(f64, f64)]| {
            levels
                .iter()
                .map(|&(p, q)| OrderBookLevel::new(p, q))
                .collect::<Vec<_>>()
        };
        self.book = Some((side(bids), side(asks)));
        self
    }

    pub fn failing(mut self, error: ConnectorError) -> Self {
        self.error = Some(error);
        self
    }

    pub fn unavailable(mut self) -> Self {
        self.available = false;
        self
    }

    /// Behaves like a reference-price feed rather than a venue.
    pub fn reference_only(mut self) -> Self {
        self.tradable = false;
        self
    }

    pub fn with_delay(mut self, delay: Duration) -> Self {
        self.delay = delay;
        self
    }

    pub fn with_display_name(mut self, display_name: &str) -> Self {
        self.display_name = Some(display_name.to_string());
        self
    }

    /// Tags results with another exchange name, breaking the source contract.
    pub fn tagged_as(mut self, tag: &str) -> Self {
        self.tag = Some(tag.to_string());
        self
    }

    pub fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }

    async fn enter(&self) -> Result<String, ConnectorError> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        if !self.delay.is_zero() {
            tokio::time::sleep(self.delay).await;
        }
        match &self.error {
            Some(e) => Err(e.clone()),
            None => Ok(self.tag.clone().unwrap_or_else(|| self.name.clone())),
        }
    }
}

#[async_trait]
impl ExchangeConnector for StaticConnector {
    fn name(&self) -> &str {
        &self.name
    }

    fn display_name(&self) -> &str {
        self.display_name.as_deref().unwrap_or(&self.name)
    }

    fn is_available(&self) -> bool {
        self.available
    }

    fn is_tradable(&self) -> bool {
        self.tradable
    }

    async fn get_ticker(&self, pair: &Pair) -> Result<Ticker, ConnectorError> {
        let exchange = self.enter().await?;
        let (bid, ask) = self.quote.ok_or(ConnectorError::Unsupported("ticker"))?;
        Ok(Ticker {
            exchange,
            pair: pair.clone(),
            bid,
            ask,
            last: (bid + ask) / 2.0,
            timestamp: Utc::now(),
        })
    }

    async fn get_order_book(&self, pair: &Pair, depth: usize) -> Result<OrderBook, ConnectorError> {
        let exchange = self.enter().await?;
        let (bids, asks) = self
            .book
            .clone()
            .ok_or(ConnectorError::Unsupported("order book"))?;
        Ok(OrderBook {
            exchange,
            pair: pair.clone(),
            bids: bids.into_iter().take(depth).collect(),
            asks: asks.into_iter().take(depth).collect(),
            timestamp: Utc::now(),
        })
    }
}
