//! File registry models: records, metadata entries, device identity.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// A shared file as exposed by the registry: on-disk facts (name, size,
/// mtime) joined with the uploading device's metadata.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct FileRecord {
    pub name: String,
    pub size: u64,
    #[serde(rename = "sizeFormatted")]
    pub size_formatted: String,
    pub modified: DateTime<Utc>,
    #[serde(rename = "deviceId")]
    pub device_id: String,
    #[serde(rename = "deviceName")]
    pub device_name: String,
}

/// Sidecar metadata for one uploaded file, keyed by filename in the
/// metadata document. `upload_time` is an RFC 3339 timestamp string.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct MetadataEntry {
    #[serde(rename = "deviceId")]
    pub device_id: String,
    #[serde(rename = "deviceName")]
    pub device_name: String,
    #[serde(rename = "uploadTime")]
    pub upload_time: String,
}

/// Identity of the device that performed an upload. Clients generate and
/// persist their own id; absent that, one is derived from the caller's IP.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DeviceIdentity {
    pub id: String,
    pub name: String,
}

/// Fallback identity used when a blob has no metadata entry (orphan blob,
/// or the sidecar was deleted externally).
impl Default for DeviceIdentity {
    fn default() -> Self {
        DeviceIdentity {
            id: "unknown".to_string(),
            name: "unknown device".to_string(),
        }
    }
}

/// Human-readable file size, e.g. `1536` -> `"1.5 KB"`.
pub fn format_size(bytes: u64) -> String {
    const UNITS: [&str; 4] = ["B", "KB", "MB", "GB"];

    if bytes == 0 {
        return "0 B".to_string();
    }

    let exponent = (bytes as f64).log(1024.0).floor() as usize;
    let exponent = exponent.min(UNITS.len() - 1);
    let value = bytes as f64 / 1024f64.powi(exponent as i32);

    // Two decimal places, trailing zeros dropped
    let rounded = (value * 100.0).round() / 100.0;
    format!("{} {}", rounded, UNITS[exponent])
}
