//! # Duet
//!
//! Headless driver for the Duet transport: one playhead across local files and
//! remote streams, with loop modes, A/B regions and synced lyrics.

mod config;
mod services;

use anyhow::{Context, Result};
use config::AppConfig;
use tracing::info;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

fn main() -> Result<()> {
    let config = AppConfig::load().context("Failed to load configuration")?;

    // Initialize logging
    tracing_subscriber::registry()
        .with(tracing_subscriber::fmt::layer())
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| config.log_filter.as_str().into()),
        )
        .init();

    info!("Starting Duet v{}", env!("CARGO_PKG_VERSION"));

    // The transport and its lyric lookups stay on one thread.
    let runtime = tokio::runtime::Builder::new_current_thread()
        .enable_all()
        .build()
        .context("Failed to start runtime")?;
    let local = tokio::task::LocalSet::new();

    local.block_on(&runtime, services::driver::run(config))
}
