// ============================
// crates/backend-bin/src/main.rs
// ============================
//! Tokio / Axum entry-point for the Matchday server.
use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;

use anyhow::Context;
use clap::Parser;
use tokio::net::TcpListener;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

use matchday_backend::config::{LogFormat, Settings, StorageBackend, DEFAULT_CONFIG_PATH};
use matchday_backend::{app, storage, AppState};

const MAINTENANCE_INTERVAL: Duration = Duration::from_secs(60);

#[derive(Debug, Parser)]
#[command(name = "matchday-server", about = "Match coordination server")]
struct Args {
    /// TOML configuration file
    #[arg(long, default_value = DEFAULT_CONFIG_PATH)]
    config: PathBuf,
    /// Override the bind address
    #[arg(long)]
    bind: Option<std::net::SocketAddr>,
    /// Keep all data in memory
    #[arg(long)]
    memory: bool,
}

fn init_tracing(settings: &Settings) {
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(settings.log_level.as_str()));
    let registry = tracing_subscriber::registry().with(filter);
    match settings.log_format {
        LogFormat::Json => registry.with(tracing_subscriber::fmt::layer().json()).init(),
        LogFormat::Text => registry.with(tracing_subscriber::fmt::layer()).init(),
    }
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let args = Args::parse();

    let mut settings = Settings::load_from(&args.config)
        .with_context(|| format!("loading configuration from {}", args.config.display()))?;
    if let Some(bind) = args.bind {
        settings.bind_addr = bind;
    }
    if args.memory {
        settings.storage.backend = StorageBackend::Memory;
    }

    init_tracing(&settings);

    let storage = storage::open_storage(&settings.storage).await;
    let bind_addr = settings.bind_addr;
    let state = Arc::new(AppState::new(settings, storage));

    // Housekeeping
    let maintenance = state.clone();
    tokio::spawn(async move {
        let mut interval = tokio::time::interval(MAINTENANCE_INTERVAL);
        loop {
            interval.tick().await;
            maintenance.run_maintenance().await;
        }
    });

    let listener = TcpListener::bind(bind_addr)
        .await
        .with_context(|| format!("binding {bind_addr}"))?;
    tracing::info!(
        addr = %bind_addr,
        backend = state.storage.backend_name(),
        "listening"
    );

    axum::serve(listener, app(state)).await?;
    Ok(())
}
