//! JSON metadata sidecar store
//!
//! One flat JSON document under the blob root maps filename -> metadata
//! entry. The whole document is rewritten on every mutation. Read-modify-
//! write cycles are serialized through a single mutex so concurrent uploads
//! cannot lose each other's entries; plain reads stay lock-free and at worst
//! observe the previous document.

use droplan_core::models::MetadataEntry;
use std::collections::BTreeMap;
use std::path::{Path, PathBuf};
use tokio::fs;
use tokio::io::AsyncWriteExt;
use tokio::sync::Mutex;

use crate::traits::{StorageError, StorageResult};

/// Reserved sidecar filename under the blob root. Never listed, never a
/// valid upload target.
pub const METADATA_FILENAME: &str = ".metadata.json";

/// Mapping stored in the sidecar document.
pub type MetadataMap = BTreeMap<String, MetadataEntry>;

pub struct MetadataStore {
    path: PathBuf,
    write_lock: Mutex<()>,
}

impl MetadataStore {
    /// Create a store for the sidecar under `root`, writing an empty
    /// document if none exists yet.
    pub async fn init(root: impl AsRef<Path>) -> StorageResult<Self> {
        let path = root.as_ref().join(METADATA_FILENAME);
        let store = MetadataStore {
            path,
            write_lock: Mutex::new(()),
        };

        if !fs::try_exists(&store.path).await.unwrap_or(false) {
            store.write(&MetadataMap::new()).await?;
        }

        Ok(store)
    }

    /// Read the full mapping. A missing or malformed sidecar degrades to an
    /// empty mapping; parse failures are logged, never surfaced.
    pub async fn read(&self) -> MetadataMap {
        let data = match fs::read(&self.path).await {
            Ok(data) => data,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => return MetadataMap::new(),
            Err(e) => {
                tracing::warn!(path = %self.path.display(), error = %e, "Failed to read metadata sidecar");
                return MetadataMap::new();
            }
        };

        match serde_json::from_slice(&data) {
            Ok(map) => map,
            Err(e) => {
                tracing::warn!(
                    path = %self.path.display(),
                    error = %e,
                    "Metadata sidecar is malformed, treating as empty"
                );
                MetadataMap::new()
            }
        }
    }

    /// Serialize and overwrite the whole document. Best-effort atomicity
    /// only; a crash mid-write can corrupt the sidecar, which `read()`
    /// then recovers from as empty.
    pub async fn write(&self, map: &MetadataMap) -> StorageResult<()> {
        let data = serde_json::to_vec_pretty(map)
            .map_err(|e| StorageError::WriteFailed(format!("Failed to serialize metadata: {}", e)))?;

        let mut file = fs::File::create(&self.path).await.map_err(|e| {
            StorageError::WriteFailed(format!(
                "Failed to create metadata sidecar {}: {}",
                self.path.display(),
                e
            ))
        })?;

        file.write_all(&data).await.map_err(|e| {
            StorageError::WriteFailed(format!("Failed to write metadata sidecar: {}", e))
        })?;

        file.sync_all().await.map_err(|e| {
            StorageError::WriteFailed(format!("Failed to sync metadata sidecar: {}", e))
        })?;

        Ok(())
    }

    /// Insert or replace one entry. The read-modify-write cycle holds the
    /// store's mutex, so parallel upserts cannot lose updates.
    pub async fn upsert(&self, filename: &str, entry: MetadataEntry) -> StorageResult<()> {
        let _guard = self.write_lock.lock().await;

        let mut map = self.read().await;
        map.insert(filename.to_string(), entry);
        self.write(&map).await?;

        tracing::debug!(filename = %filename, "Metadata entry upserted");
        Ok(())
    }

    /// Remove one entry if present; a no-op (no rewrite) when absent.
    pub async fn remove(&self, filename: &str) -> StorageResult<()> {
        let _guard = self.write_lock.lock().await;

        let mut map = self.read().await;
        if map.remove(filename).is_none() {
            return Ok(());
        }
        self.write(&map).await?;

        tracing::debug!(filename = %filename, "Metadata entry removed");
        Ok(())
    }
}
