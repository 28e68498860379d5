use async_trait::async_trait;

use crate::errors::ConnectorError;
use crate::types::{OrderBook, Pair, Ticker};

/// Uniform market-data contract for one external exchange.
///
/// Implementations must not share mutable state with each other; the
/// registry calls them concurrently. Results must carry `name()` as their
/// `exchange` tag.
#[async_trait]
pub trait ExchangeConnector: Send + Sync {
    /// Unique registry key, e.g. `"binance"`.
    fn name(&self) -> &str;

    fn display_name(&self) -> &str {
        self.name()
    }

    /// Configuration check only; must never touch the network.
    fn is_available(&self) -> bool;

    /// Whether quoted prices can actually be traded on. Reference-price
    /// sources return false and are kept out of best prices and arbitrage.
    fn is_tradable(&self) -> bool {
        true
    }

    async fn get_ticker(&self, pair: &Pair) -> Result<Ticker, ConnectorError>;

    /// At most `depth` levels per side, best first.
    async fn get_order_book(&self, pair: &Pair, depth: usize) -> Result<OrderBook, ConnectorError>;
}
