//! Droplan Storage Library
//!
//! This crate provides the persistence layer for the file registry: the
//! `BlobStore` trait with its local-filesystem implementation, and the JSON
//! metadata sidecar store.
//!
//! # Blob names
//!
//! Blobs are stored directly under the storage root by their original
//! filename (non-ASCII preserved). Names must be bare filenames: anything
//! containing `..`, a path separator, or resolving outside the root is
//! rejected, as is the reserved sidecar filename `.metadata.json`.

pub mod local;
pub mod metadata;
pub mod traits;

// Re-export commonly used types
pub use local::LocalBlobStore;
pub use metadata::{MetadataStore, METADATA_FILENAME};
pub use traits::{BlobEntry, BlobStore, StorageError, StorageResult};
