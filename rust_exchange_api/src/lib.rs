//! HTTP front end over the connector registry: tickers, merged order
//! books and arbitrage scans across the configured exchanges.

pub mod auth;
pub mod config;
pub mod error;
pub mod handlers;
pub mod router;
pub mod state;
pub mod wiring;

pub use auth::{ApiToken, TokenSet};
pub use config::{Settings, SettingsError};
pub use error::ApiError;
pub use router::create_router;
pub use state::AppState;
