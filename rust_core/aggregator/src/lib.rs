//! Cross-exchange liquidity aggregation: concurrent fan-out over registered
//! connectors, best bid/ask, a merged depth-limited order book, and
//! arbitrage detection.

pub mod book;
pub mod liquidity;
pub mod registry;
#[cfg(any(test, feature = "testkit"))]
pub mod testkit;

pub use book::{AggregatedLevel, AggregatedOrderBook};
pub use liquidity::{detect_opportunities, ArbitrageOpportunity, LiquidityService};
pub use registry::{
    ConnectorRegistry, MarketSnapshot, RegistryBuilder, RegistryError, DEFAULT_CONNECTOR_TIMEOUT,
};
