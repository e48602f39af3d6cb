use crate::error::HttpAppError;
use crate::state::AppState;
use crate::utils::ip::ClientIp;
use axum::{
    extract::{Multipart, State},
    Json,
};
use droplan_core::models::FileRecord;
use droplan_core::AppError;
use droplan_registry::resolve_device_identity;
use serde::Serialize;
use std::sync::Arc;

#[derive(Debug, Serialize)]
pub struct UploadResponse {
    pub success: bool,
    pub message: String,
    pub file: FileRecord,
}

/// Upload a single file.
///
/// Multipart form with a `file` part (original filename preserved,
/// non-ASCII included) and optional `deviceId` / `deviceName` text fields.
/// When the device fields are absent the identity is derived from the
/// caller's IP address. There is no size limit and no content-type
/// validation; the registry only rejects unsafe names.
#[tracing::instrument(skip(state, multipart), fields(operation = "upload_file"))]
pub async fn upload_file(
    State(state): State<Arc<AppState>>,
    ClientIp(client_ip): ClientIp,
    mut multipart: Multipart,
) -> Result<Json<UploadResponse>, HttpAppError> {
    let mut file: Option<(String, Vec<u8>)> = None;
    let mut device_id: Option<String> = None;
    let mut device_name: Option<String> = None;

    while let Some(field) = multipart
        .next_field()
        .await
        .map_err(|e| AppError::InvalidInput(format!("Invalid multipart body: {}", e)))?
    {
        let field_name = field.name().map(str::to_string);
        match field_name.as_deref() {
            Some("file") => {
                let filename = field
                    .file_name()
                    .map(str::to_string)
                    .filter(|name| !name.is_empty())
                    .ok_or_else(|| {
                        AppError::InvalidInput("File part is missing a filename".to_string())
                    })?;
                let data = field.bytes().await.map_err(|e| {
                    AppError::InvalidInput(format!("Failed to read file data: {}", e))
                })?;
                file = Some((filename, data.to_vec()));
            }
            Some("deviceId") => {
                device_id = field.text().await.ok();
            }
            Some("deviceName") => {
                device_name = field.text().await.ok();
            }
            _ => {}
        }
    }

    let (name, data) = file
        .ok_or_else(|| AppError::InvalidInput("No file was uploaded".to_string()))?;

    let identity =
        resolve_device_identity(device_id.as_deref(), device_name.as_deref(), &client_ip);

    tracing::debug!(
        name = %name,
        size_bytes = data.len(),
        device_id = %identity.id,
        client_ip = %client_ip,
        "Processing upload"
    );

    let record = state.registry.upload_file(&name, data, identity).await?;

    Ok(Json(UploadResponse {
        success: true,
        message: "File uploaded successfully".to_string(),
        file: record,
    }))
}
