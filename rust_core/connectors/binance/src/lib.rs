pub mod rest;

pub use rest::{BinanceConnector, DEFAULT_BASE_URL, NAME};
