pub mod config;

pub use config::{ApiConfig, Config, OverlapMode, RefreshConfig, StoreConfig};

use anyhow::Result;

/// Initialize logging for the whole application
pub fn init() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("info")),
        )
        .init();

    tracing::info!("skycast core initialized");
    Ok(())
}
