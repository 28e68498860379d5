use std::sync::Arc;

use aggregator::{ConnectorRegistry, LiquidityService, RegistryError};
use connector_binance::BinanceConnector;
use connector_coinbase::CoinbaseConnector;
use connector_coingecko::CoinGeckoConnector;
use connector_kraken::KrakenConnector;
use connectors_common::rest::RestConfig;
use connectors_common::{ConnectorError, ExchangeConnector};
use log::{info, warn};
use thiserror::Error;

use crate::auth::TokenSet;
use crate::config::{Settings, SettingsError};
use crate::state::AppState;

#[derive(Error, Debug)]
pub enum WiringError {
    #[error("failed to build connector {name}: {source}")]
    Connector { name: String, source: ConnectorError },
    #[error(transparent)]
    Registry(#[from] RegistryError),
    #[error(transparent)]
    Settings(#[from] SettingsError),
}

/// Instantiates one configured connector by name. Disabled connectors are
/// still built so they show up in listings; the registry skips them.
pub fn build_connector(
    name: &str,
    settings: &Settings,
) -> Result<Arc<dyn ExchangeConnector>, WiringError> {
    let config = |default_url: &str| {
        RestConfig::new(settings.base_url(name, default_url))
            .with_timeout(settings.connector_timeout)
            .with_enabled(settings.is_enabled(name))
    };
    let connector = match name {
        connector_binance::NAME => {
            shared(BinanceConnector::new(config(connector_binance::DEFAULT_BASE_URL)))
        }
        connector_kraken::NAME => {
            shared(KrakenConnector::new(config(connector_kraken::DEFAULT_BASE_URL)))
        }
        connector_coinbase::NAME => {
            shared(CoinbaseConnector::new(config(connector_coinbase::DEFAULT_BASE_URL)))
        }
        connector_coingecko::NAME => {
            shared(CoinGeckoConnector::new(config(connector_coingecko::DEFAULT_BASE_URL)))
        }
        other => return Err(SettingsError::UnknownConnector(other.to_string()).into()),
    };
    connector.map_err(|source| WiringError::Connector {
        name: name.to_string(),
        source,
    })
}

fn shared<C: ExchangeConnector + 'static>(
    connector: Result<C, ConnectorError>,
) -> Result<Arc<dyn ExchangeConnector>, ConnectorError> {
    connector.map(|c| Arc::new(c) as Arc<dyn ExchangeConnector>)
}

pub fn build_registry(settings: &Settings) -> Result<ConnectorRegistry, WiringError> {
    let mut builder = ConnectorRegistry::builder().timeout(settings.connector_timeout);
    for name in &settings.connectors {
        let connector = build_connector(name, settings)?;
        if connector.is_available() {
            info!("registered connector {} ({})", connector.name(), connector.display_name());
        } else {
            warn!("connector {} is registered but disabled", connector.name());
        }
        builder = builder.register_arc(connector)?;
    }
    Ok(builder.build())
}

pub fn build_state(settings: &Settings) -> Result<AppState, WiringError> {
    let registry = Arc::new(build_registry(settings)?);
    let liquidity = LiquidityService::new(registry.clone())
        .with_min_spread_percentage(settings.min_spread_percentage);
    let tokens = TokenSet::new(settings.api_tokens.iter().cloned());
    Ok(AppState::new(registry, tokens)
        .with_liquidity(liquidity)
        .with_depth_bounds(settings.default_depth, settings.max_depth))
}
