mod config;

use anyhow::{Context, Result};
use clap::Parser;
use compliance_service::ComplianceModule;
use config::{AppConfig, LoggingConfig};
use sea_orm::Database;
use std::path::PathBuf;
use std::sync::Arc;
use tokio_util::sync::CancellationToken;
use tower_http::trace::TraceLayer;
use tracing_subscriber::{fmt, layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

/// DTTOT compliance back office server
#[derive(Debug, Parser)]
#[command(name = "compliance-server", version, about)]
struct Cli {
    /// Path to the YAML configuration file
    #[arg(short, long, default_value = "config/server.yaml")]
    config: PathBuf,

    /// Print the effective configuration as JSON and exit
    #[arg(long)]
    print_config: bool,
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();
    let config = AppConfig::load(&cli.config)?;

    if cli.print_config {
        let rendered = serde_json::to_string_pretty(&config)?;
        std::io::Write::write_all(&mut std::io::stdout(), rendered.as_bytes())?;
        return Ok(());
    }

    init_tracing(&config.logging)?;
    tracing::info!(config = %cli.config.display(), "starting compliance server");

    let db = Database::connect(config.database.url.as_str())
        .await
        .context("failed to connect to application database")?;
    let external_db = Database::connect(config.database.external_url.as_str())
        .await
        .context("failed to connect to external database")?;
    ComplianceModule::migrate(&db).await?;

    let module = Arc::new(ComplianceModule::init(
        config.compliance.clone(),
        db,
        external_db,
    )?);
    let app = module.router().layer(TraceLayer::new_for_http());

    let cancel = CancellationToken::new();
    let background = tokio::spawn(module.clone().serve(cancel.clone()));

    let shutdown = cancel.clone();
    tokio::spawn(async move {
        if let Err(e) = tokio::signal::ctrl_c().await {
            tracing::error!(error = %e, "failed to listen for shutdown signal");
        }
        tracing::info!("shutdown signal received");
        shutdown.cancel();
    });

    let listener = tokio::net::TcpListener::bind(&config.server.bind_addr)
        .await
        .with_context(|| format!("failed to bind {}", config.server.bind_addr))?;
    tracing::info!(addr = %config.server.bind_addr, "listening");

    let server_cancel = cancel.clone();
    let served = axum::serve(listener, app)
        .with_graceful_shutdown(async move { server_cancel.cancelled().await })
        .await;
    cancel.cancel();

    match background.await {
        Ok(result) => result?,
        Err(e) => tracing::warn!(error = %e, "background runtime task failed"),
    }
    served.context("http server failed")?;
    tracing::info!("compliance server stopped");
    Ok(())
}

fn init_tracing(logging: &LoggingConfig) -> Result<()> {
    let filter = EnvFilter::try_from_default_env()
        .or_else(|_| EnvFilter::try_new(&logging.level))
        .context("invalid logging.level directive")?;

    let registry = tracing_subscriber::registry().with(filter);
    if logging.json {
        registry.with(fmt::layer().json()).try_init()?;
    } else {
        registry.with(fmt::layer()).try_init()?;
    }
    Ok(())
}
