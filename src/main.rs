use anyhow::Context;
use tracing_subscriber::EnvFilter;

use tube_relay_lib::config::BotConfig;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .init();

    let config = BotConfig::from_env().context("Failed to load configuration")?;
    tube_relay_lib::run(config).await
}
