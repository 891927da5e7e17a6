//! hostcheck server binary

use anyhow::Context;
use hostcheck::Systemctl;
use hostcheck_server::cli::Args;
use hostcheck_server::config::LogFormat;
use hostcheck_server::{AppState, Config, HealthcheckServer, shutdown_signal};
use std::sync::Arc;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let args = Args::parse_with_legacy(std::env::args_os());

    // Configuration comes first: it decides the log level and format.
    let config = Config::load(&args.config)
        .with_context(|| format!("Failed to load configuration from {}", args.config.display()))?;

    let level = config.config.logging.level.as_deref().unwrap_or("info");
    match config.config.logging.format {
        LogFormat::Json => common::logging::init_json(level),
        LogFormat::Text => common::logging::init(level),
    }

    tracing::info!(
        path = %args.config.display(),
        services = config.services.len(),
        ports = config.ports.len(),
        endpoints = config.endpoints.len(),
        "Configuration loaded"
    );

    let manager = Arc::new(Systemctl::new(config.probe_timeouts().service));
    let state = AppState::from_config(&config, manager).context("Failed to build health checks")?;

    let server = HealthcheckServer::new(config.to_server_config(), state)
        .bind()
        .await?;

    if let Err(e) = server.serve(shutdown_signal()).await {
        tracing::error!(error = %e, "Server stopped with error");
        return Err(e.into());
    }

    Ok(())
}
