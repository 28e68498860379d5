use anyhow::Context;
use exchange_api::{config::Settings, create_router, wiring};
use log::{info, warn};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    dotenvy::dotenv().ok();
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();

    let settings = Settings::from_env().context("invalid configuration")?;
    let state = wiring::build_state(&settings).context("failed to wire connectors")?;
    if state.registry.is_empty() {
        anyhow::bail!("EXCHANGE_CONNECTORS does not name any connector");
    }
    if state.registry.available().is_empty() {
        warn!("no connector is enabled; market data endpoints will return empty results");
    }
    if state.tokens.is_empty() {
        warn!("EXCHANGE_API_TOKENS is empty; the arbitrage endpoint will reject every request");
    }

    let app = create_router(state);
    let listener = tokio::net::TcpListener::bind(settings.bind)
        .await
        .with_context(|| format!("failed to bind {}", settings.bind))?;
    info!("exchange api listening on {}", settings.bind);

    axum::serve(listener, app)
        .with_graceful_shutdown(async {
            tokio::signal::ctrl_c().await.ok();
            info!("shutdown signal received");
        })
        .await?;

    Ok(())
}
