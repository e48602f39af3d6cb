use crate::state::AppState;
use crate::utils::ip::local_lan_ip;
use axum::{extract::State, Json};
use serde::Serialize;
use std::sync::Arc;

#[derive(Debug, Serialize)]
pub struct ServerInfo {
    pub ip: String,
    pub port: u16,
    pub url: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub hostname: Option<String>,
}

/// Report the address clients should use to reach this server, for
/// shareable links and QR codes rendered by the frontend.
pub async fn server_info(State(state): State<Arc<AppState>>) -> Json<ServerInfo> {
    let ip = local_lan_ip();
    let port = state.config.server_port();
    let hostname = hostname::get().ok().and_then(|h| h.into_string().ok());

    Json(ServerInfo {
        url: format!("http://{}:{}", ip, port),
        ip,
        port,
        hostname,
    })
}
