//! # Kitab Server
//!
//! Back-office HTTP API for the Kitab Store.
//!
//! ## Startup
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                        Kitab Server Startup                             │
//! │                                                                         │
//! │  tracing (RUST_LOG) ──► ServerConfig::load ──► Database::new           │
//! │                                                    │ (migrations)       │
//! │                                                    ▼                    │
//! │                     axum::serve(listener, router) ◄── AppState          │
//! │                                │                                        │
//! │                     Ctrl+C / SIGTERM ──► graceful shutdown ──► pool.close│
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! Admin accounts are managed with `kitab-admin create-admin`.

use kitab_db::{Database, DbConfig};
use kitab_server::{build_router, AppState, ServerConfig};
use tokio::net::TcpListener;
use tracing::{error, info, warn};
use tracing_subscriber::EnvFilter;

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| EnvFilter::new("info,kitab=debug,sqlx=warn")),
        )
        .with_target(true)
        .init();

    info!("Starting Kitab server...");

    let config = ServerConfig::load()?;
    info!(
        environment = %config.environment,
        database = %config.database_path.display(),
        uploads = %config.upload_dir.display(),
        "Configuration loaded"
    );
    if config.biteship_api_key.is_none() {
        warn!("KITAB_BITESHIP_API_KEY not set, shipping lookups will fail");
    }

    let clock = config.clock()?;
    info!(utc_offset_minutes = clock.offset_minutes(), "Shop clock");

    let db = Database::new(DbConfig::new(config.database_path.clone()).clock(clock)).await?;
    if db.users().count().await? == 0 {
        warn!("No admin accounts yet, create one with `kitab-admin create-admin <username> <password>`");
    }

    let addr = config.bind_address();
    let state = AppState::new(db.clone(), config);
    let app = build_router(state);

    let listener = TcpListener::bind(&addr).await?;
    info!(%addr, "Listening");

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await?;

    db.close().await;
    info!("Server shutdown complete");
    Ok(())
}

/// Graceful shutdown signal handler.
async fn shutdown_signal() {
    let ctrl_c = async {
        if let Err(e) = tokio::signal::ctrl_c().await {
            error!("Failed to install Ctrl+C handler: {}", e);
            std::future::pending::<()>().await;
        }
    };

    #[cfg(unix)]
    let terminate = async {
        match tokio::signal::unix::signal(tokio::signal::unix::SignalKind::terminate()) {
            Ok(mut signal) => {
                signal.recv().await;
            }
            Err(e) => {
                error!("Failed to install SIGTERM handler: {}", e);
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {},
        _ = terminate => {},
    }

    info!("Shutdown signal received, starting graceful shutdown...");
}
