//! Storage abstraction trait
//!
//! This module defines the BlobStore trait the registry works against.

use async_trait::async_trait;
use bytes::Bytes;
use chrono::{DateTime, Utc};
use futures::Stream;
use std::pin::Pin;
use thiserror::Error;

/// Storage operation errors
#[derive(Debug, Error)]
pub enum StorageError {
    #[error("File not found: {0}")]
    NotFound(String),

    #[error("Invalid blob name: {0}")]
    InvalidName(String),

    #[error("Reserved name: {0}")]
    ReservedName(String),

    #[error("Write failed: {0}")]
    WriteFailed(String),

    #[error("Read failed: {0}")]
    ReadFailed(String),

    #[error("Delete failed: {0}")]
    DeleteFailed(String),

    #[error("IO error: {0}")]
    IoError(#[from] std::io::Error),
}

/// Result type for storage operations
pub type StorageResult<T> = Result<T, StorageError>;

/// Directory listing entry: on-disk facts only, no device metadata.
#[derive(Debug, Clone)]
pub struct BlobEntry {
    pub name: String,
    pub size: u64,
    pub modified: DateTime<Utc>,
}

/// Blob storage abstraction
///
/// The registry works against this trait so tests can substitute an
/// in-memory store and alternative backends stay possible. Names are bare
/// filenames; every implementation must enforce the path-safety rules
/// described in the crate root documentation.
#[async_trait]
pub trait BlobStore: Send + Sync {
    /// Write or overwrite a blob. A second put with the same name replaces
    /// the previous content (last write wins).
    async fn put(&self, name: &str, data: Vec<u8>) -> StorageResult<()>;

    /// Enumerate every blob under the root except the metadata sidecar.
    /// Unordered; callers sort. Re-stats every file on each call.
    async fn list(&self) -> StorageResult<Vec<BlobEntry>>;

    /// Open a blob as a byte stream, with its size for response headers.
    async fn open(
        &self,
        name: &str,
    ) -> StorageResult<(
        u64,
        Pin<Box<dyn Stream<Item = Result<Bytes, StorageError>> + Send>>,
    )>;

    /// Read a blob fully into memory.
    async fn read(&self, name: &str) -> StorageResult<Vec<u8>>;

    /// Remove a blob. NotFound if it does not exist.
    async fn delete(&self, name: &str) -> StorageResult<()>;

    /// Stat a single blob.
    async fn stat(&self, name: &str) -> StorageResult<BlobEntry>;
}
