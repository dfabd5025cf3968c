//! HerbTrace server binary.
//!
//! Wires configuration, logging and the trace API together and serves
//! until `Ctrl-C`.
//!
//! # Startup Sequence
//!
//! 1. Load configuration from `herbtrace-config.yaml` (defaults if absent)
//! 2. Initialize structured logging (tracing)
//! 3. Build the trace service with an empty ledger and registry
//! 4. Serve the trace API until shutdown

mod error;

use std::path::Path;
use std::sync::Arc;

use herbtrace_api::state::AppState;
use herbtrace_core::{TraceConfig, TraceService};
use tracing::info;
use tracing_subscriber::EnvFilter;

use crate::error::ServerError;

/// Path of the configuration file, relative to the working directory.
const CONFIG_PATH: &str = "herbtrace-config.yaml";

#[tokio::main]
async fn main() -> Result<(), ServerError> {
    // 1. Load configuration. Logging depends on it, so this comes first.
    let config_path = Path::new(CONFIG_PATH);
    let config = TraceConfig::load_or_default(config_path)?;

    // 2. Initialize structured logging. RUST_LOG wins over the config.
    init_tracing(&config);

    info!(
        found = config_path.exists(),
        path = CONFIG_PATH,
        geofence_radius_km = config.geofence.radius_km,
        network_delay_ms = config.simulation.network_delay_ms,
        verify_base_url = %config.registry.verify_base_url,
        "Configuration loaded"
    );

    // 3. Build the trace service.
    let state = Arc::new(AppState::new(TraceService::new(&config)));

    // 4. Serve until Ctrl-C.
    herbtrace_api::start_server(&config.server, state, shutdown_signal()).await?;

    info!("herbtrace-server shutdown complete");
    Ok(())
}

fn init_tracing(config: &TraceConfig) {
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_missing| EnvFilter::new(&config.logging.level));

    let builder = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(true);

    if config.logging.json {
        builder.json().init();
    } else {
        builder.init();
    }
}

async fn shutdown_signal() {
    if let Err(e) = tokio::signal::ctrl_c().await {
        tracing::error!(error = %e, "failed to listen for Ctrl-C");
        // Without a signal handler the server runs until killed.
        std::future::pending::<()>().await;
    }
    info!("Ctrl-C received, shutting down");
}
