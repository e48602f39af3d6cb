//! Route configuration and setup

use crate::handlers;
use crate::state::AppState;
use axum::{
    extract::DefaultBodyLimit,
    http::HeaderValue,
    routing::{delete, get, post},
    Router,
};
use std::sync::Arc;
use tower_http::cors::{Any, CorsLayer};
use tower_http::trace::TraceLayer;

/// Setup all application routes
pub fn setup_routes(state: Arc<AppState>) -> Result<Router<()>, anyhow::Error> {
    let cors = setup_cors(&state)?;

    let router = Router::new()
        .route("/api/files", get(handlers::files_list::list_files))
        .route("/api/upload", post(handlers::file_upload::upload_file))
        .route(
            "/api/download/{filename}",
            get(handlers::file_download::download_file),
        )
        .route(
            "/api/files/{filename}",
            delete(handlers::file_delete::delete_file),
        )
        .route("/api/server-info", get(handlers::server_info::server_info))
        // Upload size is deliberately unlimited for LAN sharing
        .layer(DefaultBodyLimit::disable())
        .layer(cors)
        .layer(TraceLayer::new_for_http())
        .with_state(state);

    Ok(router)
}

/// Permissive CORS by default (a LAN tool is reached from many device
/// origins); explicit origins when configured.
fn setup_cors(state: &Arc<AppState>) -> Result<CorsLayer, anyhow::Error> {
    let origins = state.config.cors_origins();

    if origins.iter().any(|origin| origin == "*") {
        return Ok(CorsLayer::new()
            .allow_origin(Any)
            .allow_methods(Any)
            .allow_headers(Any));
    }

    let origins = origins
        .iter()
        .map(|origin| {
            origin
                .parse::<HeaderValue>()
                .map_err(|_| anyhow::anyhow!("Invalid CORS origin: {}", origin))
        })
        .collect::<Result<Vec<_>, _>>()?;

    Ok(CorsLayer::new()
        .allow_origin(origins)
        .allow_methods(Any)
        .allow_headers(Any))
}
