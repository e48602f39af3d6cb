//! Device identity resolution
//!
//! An upload is tagged with the identity of the device that sent it. The
//! client normally generates and persists its own id; when it doesn't, one
//! is derived from the caller's IP address by keeping the last four digits.
//! That derivation is collision-prone (distinct addresses can share a
//! suffix) and is kept only for compatibility with existing sidecar data;
//! it is not a uniqueness guarantee.

use droplan_core::models::DeviceIdentity;

/// How many leading characters of a client-supplied id go into the
/// fallback display name.
const NAME_ID_PREFIX_LEN: usize = 5;

/// Resolve the identity for an upload.
///
/// Explicit fields from the request win; otherwise the identity is derived
/// from `client_ip`. A supplied id without a name gets a name built from
/// the id's prefix.
pub fn resolve_device_identity(
    device_id: Option<&str>,
    device_name: Option<&str>,
    client_ip: &str,
) -> DeviceIdentity {
    let device_id = device_id.map(str::trim).filter(|s| !s.is_empty());
    let device_name = device_name.map(str::trim).filter(|s| !s.is_empty());

    if let Some(id) = device_id {
        let name = match device_name {
            Some(name) => name.to_string(),
            None => {
                let prefix: String = id.chars().take(NAME_ID_PREFIX_LEN).collect();
                format!("device {}", prefix)
            }
        };
        return DeviceIdentity {
            id: id.to_string(),
            name,
        };
    }

    derive_from_ip(client_ip)
}

/// Derive an identity from an IP address: strip non-digits, keep the last
/// four, or `"unknown"` when nothing remains.
fn derive_from_ip(client_ip: &str) -> DeviceIdentity {
    let digits: Vec<char> = client_ip.chars().filter(char::is_ascii_digit).collect();

    let id = if digits.is_empty() {
        "unknown".to_string()
    } else {
        let start = digits.len().saturating_sub(4);
        digits[start..].iter().collect()
    };

    DeviceIdentity {
        name: format!("device {}", id),
        id,
    }
}
