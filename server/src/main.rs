//! Stillepost Server – Einstiegspunkt

use anyhow::Result;
use stillepost_server::{config::ServerConfig, Server};

#[tokio::main]
async fn main() -> Result<()> {
    let config_pfad =
        std::env::var("STILLEPOST_CONFIG").unwrap_or_else(|_| "config.toml".into());
    let config = ServerConfig::laden(&config_pfad)?;
    config.logging.initialisieren();

    tracing::info!(
        version = env!("CARGO_PKG_VERSION"),
        config = %config_pfad,
        "Stillepost Server wird initialisiert"
    );

    Server::neu(config).starten().await
}
