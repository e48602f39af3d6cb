use crate::error::HttpAppError;
use crate::state::AppState;
use axum::{
    extract::{Path, State},
    Json,
};
use serde::Serialize;
use std::sync::Arc;

#[derive(Debug, Serialize)]
pub struct DeleteResponse {
    pub success: bool,
    pub message: String,
}

/// Delete a file by name.
///
/// Removes the blob and its metadata entry. Deleting twice yields success
/// then 404; traversal names yield 403.
#[tracing::instrument(skip(state), fields(operation = "delete_file"))]
pub async fn delete_file(
    Path(filename): Path<String>,
    State(state): State<Arc<AppState>>,
) -> Result<Json<DeleteResponse>, HttpAppError> {
    state.registry.delete_file(&filename).await?;

    Ok(Json(DeleteResponse {
        success: true,
        message: "File deleted successfully".to_string(),
    }))
}
