//! Inventory admin server
//!
//! Serves the REST API (`/api/products`, `/api/employees`, `/api/suppliers`,
//! `/api/auth`) and the static admin pages from one Axum router.
//!
//! Usage:
//!   cargo run --bin seed               # optional sample data
//!   cargo run --bin inventory-server   # start server (see --help)

use clap::Parser;
use tokio::net::TcpListener;
use tokio::signal;
use tracing::info;

use inventory_admin::config::Config;
use inventory_admin::logging::init_logging;
use inventory_admin::rest::{create_app, AppState};
use inventory_admin::storage::Storage;

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    dotenvy::dotenv().ok();
    let config = Config::parse();
    let _log_guard = init_logging(config.log_format, config.log_dir.as_deref())?;

    let addr = config.addr()?;
    info!(data_dir = %config.data_dir.display(), "opening document store");
    let storage = Storage::open(&config.data_dir)?;

    let state = AppState::new(storage.clone(), config.auth_settings());
    let app = create_app(state, &config.public_dir);

    let listener = TcpListener::bind(addr).await?;
    info!(%addr, public_dir = %config.public_dir.display(), "inventory server listening");

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await?;

    storage.flush()?;
    info!("server stopped");
    Ok(())
}

async fn shutdown_signal() {
    let ctrl_c = async {
        if let Err(e) = signal::ctrl_c().await {
            tracing::error!(error = %e, "failed to listen for Ctrl+C");
            std::future::pending::<()>().await;
        }
    };

    #[cfg(unix)]
    let terminate = async {
        match signal::unix::signal(signal::unix::SignalKind::terminate()) {
            Ok(mut sig) => {
                sig.recv().await;
            }
            Err(e) => {
                tracing::error!(error = %e, "failed to install SIGTERM handler");
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => info!("received Ctrl+C, shutting down"),
        _ = terminate => info!("received terminate signal, shutting down"),
    }
}
