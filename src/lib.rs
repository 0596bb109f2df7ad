pub mod api;
pub mod billing; // Ledger, payments, statements, summary
pub mod config;
pub mod core_state; // Shared store state + audit buffer
pub mod crypto;
pub mod db;
pub mod directory; // Patients, doctors, specialties
pub mod engagement; // Patient check-ins
pub mod error;
pub mod models;
pub mod records; // Summaries, medications, test results
pub mod scheduling; // Slots, booking, cancellation

use std::sync::Arc;
use tracing_subscriber::EnvFilter;

use crate::core_state::{AccessSource, CoreError, CoreState};

#[derive(Debug, thiserror::Error)]
pub enum RunError {
    #[error("Store initialization failed: {0}")]
    Core(#[from] CoreError),
    #[error(transparent)]
    Server(#[from] api::ServerError),
    #[error("Failed to listen for shutdown signal: {0}")]
    Signal(#[from] std::io::Error),
}

/// Start the store and serve the API until Ctrl-C.
pub async fn run() -> Result<(), RunError> {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| EnvFilter::new(config::default_log_filter())),
        )
        .init();

    tracing::info!("{} starting v{}", config::APP_NAME, config::APP_VERSION);

    let core = Arc::new(CoreState::new()?);
    core.log_access(AccessSource::System, "startup", "store");

    let mut server = api::start_api_server(core.clone(), config::bind_addr()).await?;
    tracing::info!(addr = %server.addr, "Listening");

    tokio::signal::ctrl_c().await?;
    server.shutdown();
    server.stopped().await?;

    core.log_access(AccessSource::System, "shutdown", "store");
    match core.flush_audit() {
        Ok(count) => tracing::info!(count, "Audit buffer flushed"),
        Err(e) => tracing::warn!("Final audit flush failed: {e}"),
    }
    Ok(())
}
