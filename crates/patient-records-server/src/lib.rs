//! Patient Records Server
//!
//! HTTP API and command-line entry point over [`patient_records_core`].
//!
//! # Modules
//!
//! - [`api`]: axum router and handlers
//! - [`config`]: TOML/JSON configuration
//! - [`cli`]: clap command definitions
//! - [`telemetry`]: tracing subscriber setup

pub mod api;
pub mod cli;
pub mod config;
pub mod telemetry;

pub use api::{router, ApiError, AppState};
pub use config::{Config, ConfigError};

use patient_records_core::{AnyBackend, DocumentBackend, RecordStore, SchemaRules, StoreResult};
use tracing::{info, warn};

/// Open the configured backend and wrap it in a store.
pub fn open_store(config: &Config) -> StoreResult<RecordStore<AnyBackend>> {
    let backend = AnyBackend::open(config.storage.backend, &config.storage.path)?;
    Ok(RecordStore::new(
        backend,
        SchemaRules::for_variant(config.schema.variant),
    ))
}

/// Bind and serve the API until ctrl-c.
pub async fn serve(config: &Config) -> anyhow::Result<()> {
    let store = open_store(config)?;
    if config.storage.create_if_missing {
        store.init()?;
    } else if !store.backend().exists()? {
        warn!(
            path = %config.storage.path.display(),
            "No patient document found; run `init` or pass --create-missing"
        );
    }

    let app = router(AppState::new(store));
    let addr = config.bind_address();
    let listener = tokio::net::TcpListener::bind(&addr).await?;
    info!(
        %addr,
        backend = ?config.storage.backend,
        variant = ?config.schema.variant,
        "Patient records API listening"
    );

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await?;
    info!("Server stopped");
    Ok(())
}

async fn shutdown_signal() {
    if let Err(err) = tokio::signal::ctrl_c().await {
        warn!(error = %err, "Failed to listen for ctrl-c");
    }
}
