pub mod rest;

pub use rest::{CoinGeckoConnector, DEFAULT_BASE_URL, NAME};
