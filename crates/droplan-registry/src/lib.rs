//! Droplan Registry Library
//!
//! The registry service: the façade combining the blob store and metadata
//! sidecar into list/upload/download/delete operations, plus device-identity
//! resolution for uploads.

pub mod device;
pub mod registry;

pub use device::resolve_device_identity;
pub use registry::{FileDownload, Registry};
