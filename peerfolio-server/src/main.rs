//! peerfolio-server - PeerFolio review service
//!
//! Serves the JSON API over one SQLite database. Settings come from the
//! command line, `PEERFOLIO_*` environment variables, `config.toml` and
//! compiled defaults, in that order.

use anyhow::{Context, Result};
use chrono::Utc;
use clap::Parser;
use peerfolio_common::accounts::promote_admin;
use peerfolio_common::api::auth::purge_expired_sessions;
use peerfolio_common::config::{CliOverrides, ServerConfig};
use peerfolio_common::db::init_database;
use peerfolio_common::ModerationPolicy;
use peerfolio_server::{build_router, AppState};
use std::path::PathBuf;
use tokio::signal;
use tracing::info;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

/// Command-line arguments
#[derive(Parser, Debug)]
#[command(name = "peerfolio-server")]
#[command(about = "Professional review service for LinkedIn profiles")]
#[command(version)]
struct Args {
    /// Config file (default: ~/.config/peerfolio/config.toml or /etc/peerfolio/config.toml)
    #[arg(short, long, env = "PEERFOLIO_CONFIG")]
    config: Option<PathBuf>,

    /// Address to listen on, e.g. 127.0.0.1:5740
    #[arg(short, long)]
    bind: Option<String>,

    /// SQLite database file
    #[arg(short, long)]
    database: Option<PathBuf>,

    /// auto_approve or require_approval
    #[arg(long)]
    moderation: Option<ModerationPolicy>,

    /// Grant ADMIN to the existing account with this email at startup
    #[arg(long, env = "PEERFOLIO_ADMIN_EMAIL")]
    admin_email: Option<String>,
}

#[tokio::main]
async fn main() -> Result<()> {
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env().unwrap_or_else(|_| {
                "peerfolio_server=info,peerfolio_common=info,tower_http=info".into()
            }),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    let args = Args::parse();

    info!("Starting PeerFolio server v{}", env!("CARGO_PKG_VERSION"));

    let cli = CliOverrides {
        bind_addr: args.bind,
        database_path: args.database,
        moderation: args.moderation,
    };
    let config = ServerConfig::load(&cli, args.config.as_deref())
        .context("Failed to load configuration")?;

    info!("Database path: {}", config.database_path.display());
    info!("Moderation policy: {:?}", config.moderation);

    let pool = init_database(&config.database_path, config.busy_timeout_ms)
        .await
        .context("Failed to initialize database")?;

    if let Some(email) = args.admin_email.as_deref() {
        promote_admin(&pool, email, Utc::now())
            .await
            .with_context(|| format!("Failed to grant ADMIN to {}", email))?;
    }

    let purged = purge_expired_sessions(&pool, Utc::now())
        .await
        .context("Failed to purge expired sessions")?;
    if purged > 0 {
        info!("Removed {} expired sessions", purged);
    }

    let bind_addr = config.bind_addr.clone();
    let app = build_router(AppState::new(pool, config));

    let listener = tokio::net::TcpListener::bind(&bind_addr)
        .await
        .with_context(|| format!("Failed to bind to {}", bind_addr))?;

    info!("PeerFolio listening on http://{}", bind_addr);
    info!("Health check: http://{}/health", bind_addr);

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await
        .context("Server error")?;

    info!("Server shutdown complete");
    Ok(())
}

/// Graceful shutdown signal handler
async fn shutdown_signal() {
    let ctrl_c = async {
        if let Err(e) = signal::ctrl_c().await {
            tracing::error!("Failed to listen for Ctrl+C: {}", e);
            std::future::pending::<()>().await;
        }
    };

    #[cfg(unix)]
    let terminate = async {
        match signal::unix::signal(signal::unix::SignalKind::terminate()) {
            Ok(mut sigterm) => {
                sigterm.recv().await;
            }
            Err(e) => {
                tracing::error!("Failed to install SIGTERM handler: {}", e);
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
