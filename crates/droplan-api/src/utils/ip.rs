//! IP address utilities
//!
//! Client-IP extraction from X-Forwarded-For headers with validation to
//! prevent header spoofing, and discovery of the server's own LAN address
//! for shareable links.

use crate::state::AppState;
use axum::extract::{ConnectInfo, FromRequestParts};
use axum::http::request::Parts;
use axum::http::HeaderMap;
use std::convert::Infallible;
use std::net::{IpAddr, SocketAddr, UdpSocket};
use std::sync::Arc;

/// Extractor for the validated client IP of the current request.
///
/// Yields "unknown" rather than rejecting, so handlers degrade to the
/// unknown-device identity instead of failing the upload.
pub struct ClientIp(pub String);

impl FromRequestParts<Arc<AppState>> for ClientIp {
    type Rejection = Infallible;

    async fn from_request_parts(
        parts: &mut Parts,
        state: &Arc<AppState>,
    ) -> Result<Self, Self::Rejection> {
        let socket = parts
            .extensions
            .get::<ConnectInfo<SocketAddr>>()
            .map(|connect_info| connect_info.0);

        Ok(ClientIp(extract_client_ip(
            &parts.headers,
            socket.as_ref(),
            state.config.trusted_proxy_count(),
        )))
    }
}

/// Extract and validate the client IP from request headers.
///
/// When behind a proxy, the X-Forwarded-For header contains a chain of IP
/// addresses; `trusted_proxy_count` says how many entries at the end of the
/// chain belong to infrastructure we trust. With zero trusted proxies the
/// header is spoofable, so only the direct socket address is authoritative.
///
/// Returns a validated IP as a string, or "unknown" if extraction fails.
pub fn extract_client_ip(
    headers: &HeaderMap,
    socket_addr: Option<&SocketAddr>,
    trusted_proxy_count: usize,
) -> String {
    if trusted_proxy_count > 0 {
        if let Some(forwarded_for) = headers.get("x-forwarded-for") {
            if let Ok(header_value) = forwarded_for.to_str() {
                let ip = extract_from_forwarded_for(header_value, trusted_proxy_count);
                if ip != "unknown" {
                    return ip;
                }
            }
        }

        if let Some(real_ip) = headers.get("x-real-ip") {
            if let Ok(header_value) = real_ip.to_str() {
                let trimmed = header_value.trim();
                if is_valid_ip(trimmed) {
                    return trimmed.to_string();
                }
            }
        }
    }

    if let Some(addr) = socket_addr {
        return addr.ip().to_string();
    }

    "unknown".to_string()
}

/// Extract the client IP from an X-Forwarded-For chain
/// (`client, proxy1, proxy2, ...`): with N trusted proxies at the end of the
/// chain, the client is the entry before them.
fn extract_from_forwarded_for(header_value: &str, trusted_proxy_count: usize) -> String {
    let ips: Vec<&str> = header_value
        .split(',')
        .map(|s| s.trim())
        .filter(|s| !s.is_empty())
        .collect();

    if ips.is_empty() {
        return "unknown".to_string();
    }

    if ips.len() <= trusted_proxy_count {
        // Not enough entries in the chain; fall back to the last one.
        let last_ip = ips.last().unwrap_or(&"");
        if is_valid_ip(last_ip) {
            return last_ip.to_string();
        }
        return "unknown".to_string();
    }

    let client_ip_pos = ips.len().saturating_sub(trusted_proxy_count + 1);
    let client_ip = ips.get(client_ip_pos).unwrap_or(&"");

    if is_valid_ip(client_ip) {
        return client_ip.to_string();
    }

    "unknown".to_string()
}

fn is_valid_ip(ip_str: &str) -> bool {
    ip_str.parse::<IpAddr>().is_ok()
}

/// Discover the LAN address other devices should use to reach this server.
///
/// Connecting a UDP socket pins the kernel's routing decision to the
/// outbound interface without sending any packet; the socket's local address
/// is then the non-loopback IP of that interface. Falls back to "localhost"
/// on machines with no route (e.g. offline).
pub fn local_lan_ip() -> String {
    let probe = || -> std::io::Result<IpAddr> {
        let socket = UdpSocket::bind("0.0.0.0:0")?;
        socket.connect("8.8.8.8:80")?;
        Ok(socket.local_addr()?.ip())
    };

    match probe() {
        Ok(ip) if !ip.is_loopback() => ip.to_string(),
        _ => "localhost".to_string(),
    }
}
