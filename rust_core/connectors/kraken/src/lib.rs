pub mod rest;

pub use rest::{KrakenConnector, DEFAULT_BASE_URL, NAME};
