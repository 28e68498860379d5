pub mod rest;

pub use rest::{CoinbaseConnector, DEFAULT_BASE_URL, NAME};
