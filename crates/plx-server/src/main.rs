//! plx API server entry point

use std::path::Path;

use anyhow::Context;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use plx_core::PlxConfig;
use plx_server::{start_server, ApiState};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "plx_server=info,tower_http=debug".into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    let config = match std::env::var("PLX_CONFIG") {
        Ok(path) => PlxConfig::from_file(Path::new(&path))
            .with_context(|| format!("Failed to read config file {}", path))?,
        Err(_) => PlxConfig::default(),
    };

    // PLX_ADDR wins over the configured bind address
    let addr = std::env::var("PLX_ADDR").unwrap_or_else(|_| config.server.bind.clone());

    tracing::info!("Starting plx extraction server");
    start_server(&addr, ApiState::new(config)).await?;

    Ok(())
}
