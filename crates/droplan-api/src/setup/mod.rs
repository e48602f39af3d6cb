//! Application setup and initialization
//!
//! All initialization logic lives here, extracted from main.rs for better
//! organization and testability.

pub mod routes;
pub mod server;

use crate::state::AppState;
use anyhow::{Context, Result};
use droplan_core::Config;
use droplan_registry::Registry;
use std::sync::Arc;

/// Initialize the entire application
pub async fn initialize_app(config: Config) -> Result<(Arc<AppState>, axum::Router)> {
    // Validate configuration first - fail fast on misconfiguration
    config.validate().context("Configuration validation failed")?;

    tracing::info!(
        storage_path = %config.storage_path().display(),
        "Configuration loaded and validated successfully"
    );

    // Open the registry: blob root and metadata sidecar created if absent
    let registry = Registry::open(config.storage_path())
        .await
        .context("Failed to open file registry")?;

    let state = Arc::new(AppState::new(config, registry));

    // Setup routes
    let router = routes::setup_routes(state.clone())?;

    Ok((state, router))
}
