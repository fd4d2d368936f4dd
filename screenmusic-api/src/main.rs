//! ScreenMusic API (screenmusic-api) - Main entry point
//!
//! Serves the artist resource through the generic CRUD dispatcher.

use std::path::PathBuf;

use anyhow::{Context, Result};
use clap::Parser;
use screenmusic_api::{build_router, db, AppState};
use screenmusic_common::config::{ServiceConfig, TomlConfig};
use tokio::signal;
use tracing::{error, info};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

const DEFAULT_LOG_FILTER: &str = "screenmusic_api=debug,tower_http=debug";

/// Command-line arguments for screenmusic-api
#[derive(Parser, Debug)]
#[command(name = "screenmusic-api")]
#[command(about = "Artist catalog service for ScreenMusic")]
#[command(version)]
struct Args {
    /// Port to listen on
    #[arg(short, long, env = "SCREENMUSIC_PORT")]
    port: Option<u16>,

    /// Address to bind
    #[arg(short, long, env = "SCREENMUSIC_BIND")]
    bind: Option<String>,

    /// SQLite database file
    #[arg(short, long, env = "SCREENMUSIC_DB")]
    database: Option<PathBuf>,

    /// Use a throwaway in-memory database
    #[arg(long)]
    in_memory: bool,
}

#[tokio::main]
async fn main() -> Result<()> {
    let args = Args::parse();

    // Config file is read before tracing starts: it may carry the log filter
    let toml = TomlConfig::load().context("Failed to load config file")?;
    let config = ServiceConfig::resolve(args.bind, args.port, args.database, toml);

    let default_filter = config
        .log_filter
        .clone()
        .unwrap_or_else(|| DEFAULT_LOG_FILTER.to_string());
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| default_filter.into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    info!(
        "Starting ScreenMusic API (screenmusic-api) v{} [{}] built {} ({})",
        env!("CARGO_PKG_VERSION"),
        env!("GIT_HASH"),
        env!("BUILD_TIMESTAMP"),
        env!("BUILD_PROFILE")
    );

    let pool = if args.in_memory {
        info!("Using in-memory database");
        db::init_memory_pool().await?
    } else {
        info!("Database: {}", config.database_path.display());
        db::init_database_pool(&config.database_path).await?
    };

    let app = build_router(AppState::new(pool.clone()));

    let addr = config.listen_address();
    info!("Listening on http://{}", addr);

    let listener = tokio::net::TcpListener::bind(&addr)
        .await
        .with_context(|| format!("Failed to bind to {}", addr))?;

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await
        .context("Server error")?;

    pool.close().await;
    info!("Server shutdown complete");
    Ok(())
}

/// Graceful shutdown signal handler
async fn shutdown_signal() {
    let ctrl_c = async {
        if let Err(e) = signal::ctrl_c().await {
            error!("Failed to listen for Ctrl+C: {}", e);
            std::future::pending::<()>().await;
        }
    };

    #[cfg(unix)]
    let terminate = async {
        match signal::unix::signal(signal::unix::SignalKind::terminate()) {
            Ok(mut stream) => {
                stream.recv().await;
            }
            Err(e) => {
                error!("Failed to install terminate handler: {}", e);
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {
            info!("Received Ctrl+C, shutting down");
        },
        _ = terminate => {
            info!("Received terminate signal, shutting down");
        },
    }
}
