//! ExitPass Server: HTTP entry point for the exit permit workflow.

mod error;
mod settings;
mod web;

use std::net::SocketAddr;
use std::sync::Arc;

use clap::Parser;
use exitpass_db::repository::{SurrealPermitEventRepository, SurrealPermitRepository};
use exitpass_db::{DbConfig, DbManager};
use exitpass_workflow::{DisabledAnnotator, PermitService};
use miette::Result;
use tracing_subscriber::EnvFilter;

use crate::error::ServerError;
use crate::settings::{Logging, Settings};

#[derive(Parser, Debug)]
#[command(name = "exitpass-server", version, about = "Employee exit permit workflow")]
struct Cli {
    /// Path to configuration file
    #[arg(short, long, default_value = "config.toml")]
    config: String,
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();
    let mut settings = Settings::load(&cli.config)?;
    init_tracing(&settings.logging);

    tracing::info!("Starting ExitPass server...");

    if settings.workflow.annotate_motives {
        tracing::warn!("No motive annotator is configured, motive annotation disabled");
        settings.workflow.annotate_motives = false;
    }

    let db = DbManager::connect(&DbConfig::from(&settings.database))
        .await
        .map_err(ServerError::from)?;
    exitpass_db::run_migrations(db.client())
        .await
        .map_err(ServerError::from)?;

    let client = db.client().clone();
    let service = Arc::new(PermitService::new(
        SurrealPermitRepository::new(client.clone()),
        SurrealPermitEventRepository::new(client),
        DisabledAnnotator,
        settings.workflow.clone(),
    ));

    let addr: SocketAddr = settings
        .listen_addr()
        .parse()
        .map_err(|e: std::net::AddrParseError| ServerError::Addr {
            addr: settings.listen_addr(),
            reason: e.to_string(),
        })?;
    let listener = tokio::net::TcpListener::bind(addr)
        .await
        .map_err(ServerError::from)?;
    tracing::info!(%addr, "HTTP API listening");

    let router = web::router(web::AppState {
        service: Arc::clone(&service),
    });
    axum::serve(listener, router)
        .with_graceful_shutdown(shutdown_signal())
        .await
        .map_err(ServerError::from)?;

    service.wait_for_annotations().await;
    tracing::info!("ExitPass server stopped.");
    Ok(())
}

fn init_tracing(logging: &Logging) {
    let filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(&logging.filter));
    let builder = tracing_subscriber::fmt().with_env_filter(filter);
    if logging.json {
        builder.json().init();
    } else {
        builder.compact().init();
    }
}

async fn shutdown_signal() {
    if let Err(e) = tokio::signal::ctrl_c().await {
        tracing::error!(error = %e, "Failed to listen for shutdown signal");
        std::future::pending::<()>().await;
    }
    tracing::info!("Shutdown signal received");
}
