use std::sync::Arc;

use connectors_common::{Pair, Ticker};
use log::debug;
use serde::Serialize;

use crate::registry::ConnectorRegistry;

/// Buy on one venue at its ask, sell on another at its bid. Only as fresh as
/// the tickers it was computed from; nothing here places orders.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ArbitrageOpportunity {
    pub buy_exchange: String,
    pub sell_exchange: String,
    pub pair: Pair,
    pub buy_price: f64,
    pub sell_price: f64,
    pub spread: f64,
    /// `spread / buy_price`, in percent.
    pub spread_percentage: f64,
}

pub struct LiquidityService {
    registry: Arc<ConnectorRegistry>,
    min_spread_percentage: f64,
}

impl LiquidityService {
    pub fn new(registry: Arc<ConnectorRegistry>) -> Self {
        LiquidityService {
            registry,
            min_spread_percentage: 0.0,
        }
    }

    /// Only report opportunities whose spread percentage exceeds `pct`.
    pub fn with_min_spread_percentage(mut self, pct: f64) -> Self {
        self.min_spread_percentage = pct.max(0.0);
        self
    }

    pub fn registry(&self) -> &Arc<ConnectorRegistry> {
        &self.registry
    }

    /// Scans tradable connectors only; reference prices cannot be bought or
    /// sold.
    pub async fn find_arbitrage_opportunities(&self, pair: &Pair) -> Vec<ArbitrageOpportunity> {
        let quoted = self.registry.tickers(pair).await;
        let tickers: Vec<Ticker> = self.registry.tradable(&quoted).cloned().collect();
        let found = detect_opportunities(pair, &tickers, self.min_spread_percentage);
        debug!(
            "{} arbitrage opportunities for {} across {} tickers",
            found.len(),
            pair,
            tickers.len()
        );
        found
    }
}

/// Every ordered pair of distinct venues where one's ask is strictly below
/// the other's bid, best spread percentage first. Callers pass tickers from
/// tradable venues only.
pub fn detect_opportunities(
    pair: &Pair,
    tickers: &[Ticker],
    min_spread_percentage: f64,
) -> Vec<ArbitrageOpportunity> {
    let mut found = Vec::new();

    for buy in tickers.iter().filter(|t| t.has_ask()) {
        for sell in tickers.iter().filter(|t| t.has_bid()) {
            if buy.exchange == sell.exchange {
                continue;
            }
            let spread = sell.bid - buy.ask;
            if spread <= 0.0 {
                continue;
            }
            let spread_percentage = spread / buy.ask * 100.0;
            if spread_percentage <= min_spread_percentage {
                continue;
            }
            found.push(ArbitrageOpportunity {
                buy_exchange: buy.exchange.clone(),
                sell_exchange: sell.exchange.clone(),
                pair: pair.clone(),
                buy_price: buy.ask,
                sell_price: sell.bid,
                spread,
                spread_percentage,
            });
        }
    }

    found.sort_by(|a, b| b.spread_percentage.total_cmp(&a.spread_percentage));
    found
}
