pub mod connector;
pub mod errors;
pub mod rest;
pub mod types;

pub use connector::ExchangeConnector;
pub use errors::{ConfigurationError, ConnectorError};
pub use types::{OrderBook, OrderBookLevel, Pair, Ticker};
