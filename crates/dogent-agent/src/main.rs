//! dogent agent entry point.
//!
//! Run with:
//! `dogent-agent --server-url ws://host:port/ws --token <token> --server-id <id>`

mod config;

use anyhow::Context as _;
use clap::Parser;
use dogent_session::SessionManager;
use dogent_transport::WsConnector;
use tokio_util::sync::CancellationToken;
use tracing_subscriber::{EnvFilter, layer::SubscriberExt, util::SubscriberInitExt};

use crate::config::{Cli, LogFormat};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();
    init_tracing(cli.log_format);

    let config = cli.session_config();
    let executor = cli.executor();
    tracing::info!(
        server_url = %config.server_url,
        server_id = %config.server_id,
        shell = executor.shell(),
        "Starting dogent agent"
    );

    let manager = SessionManager::new(config, WsConnector::new(), executor);

    let shutdown = CancellationToken::new();
    tokio::spawn({
        let shutdown = shutdown.clone();
        async move {
            match tokio::signal::ctrl_c().await {
                Ok(()) => {
                    tracing::info!("Interrupt received, shutting down");
                    shutdown.cancel();
                }
                Err(e) => tracing::error!("Failed to listen for interrupt: {e}"),
            }
        }
    });

    manager
        .run(shutdown)
        .await
        .context("agent stopped")?;

    Ok(())
}

fn init_tracing(format: LogFormat) {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| "info".into());
    let registry = tracing_subscriber::registry().with(filter);

    match format {
        LogFormat::Pretty => registry.with(tracing_subscriber::fmt::layer()).init(),
        LogFormat::Json => registry
            .with(tracing_subscriber::fmt::layer().json())
            .init(),
    }
}
