use crate::error::HttpAppError;
use crate::state::AppState;
use axum::{extract::State, Json};
use droplan_core::models::FileRecord;
use std::sync::Arc;

/// List all shared files, newest first.
///
/// Each record carries the uploading device's id and name so clients can
/// group files per device.
pub async fn list_files(
    State(state): State<Arc<AppState>>,
) -> Result<Json<Vec<FileRecord>>, HttpAppError> {
    let records = state.registry.list_files().await?;
    Ok(Json(records))
}
