pub mod api;
pub mod authorization;
pub mod booking;
pub mod config;
pub mod core_state;
pub mod crypto;
pub mod db;
pub mod models;

use std::sync::Arc;

use tracing_subscriber::EnvFilter;

use crate::config::{ConfigError, ServerConfig};
use crate::core_state::{CoreError, CoreState};

#[derive(Debug, thiserror::Error)]
pub enum StartupError {
    #[error("Configuration error: {0}")]
    Config(#[from] ConfigError),
    #[error("Initialization error: {0}")]
    Core(#[from] CoreError),
    #[error(transparent)]
    Server(#[from] api::ServerError),
}

pub async fn run() -> Result<(), StartupError> {
    // Initialize tracing
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| EnvFilter::new(config::default_log_filter())),
        )
        .init();

    tracing::info!("{} starting v{}", config::APP_NAME, config::APP_VERSION);

    let config = ServerConfig::from_env()?;
    let bind_addr = config.bind_addr;

    let core = Arc::new(CoreState::new(config));
    core.initialize()?;

    let listener = api::server::bind(bind_addr).await?;
    api::server::serve(core, listener, shutdown_signal()).await?;

    tracing::info!("{} stopped", config::APP_NAME);
    Ok(())
}

async fn shutdown_signal() {
    match tokio::signal::ctrl_c().await {
        Ok(()) => tracing::info!("Ctrl-C received, shutting down"),
        Err(e) => {
            tracing::error!("Cannot listen for Ctrl-C: {e}");
            std::future::pending::<()>().await;
        }
    }
}
