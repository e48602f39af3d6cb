//! Registry service façade
//!
//! Combines the blob store and the metadata sidecar into the operations the
//! transfer endpoint exposes. Blobs and metadata entries are created
//! together on upload and destroyed together on delete; orphans on either
//! side are tolerated and never fail a listing.

use bytes::Bytes;
use chrono::Utc;
use droplan_core::models::{format_size, DeviceIdentity, FileRecord, MetadataEntry};
use droplan_storage::{BlobStore, LocalBlobStore, MetadataStore, StorageResult};
use futures::Stream;
use std::path::Path;
use std::pin::Pin;
use std::sync::Arc;

/// An opened blob ready to stream back to a client.
pub struct FileDownload {
    pub size: u64,
    pub stream: Pin<Box<dyn Stream<Item = StorageResult<Bytes>> + Send>>,
}

pub struct Registry {
    blobs: Arc<dyn BlobStore>,
    metadata: MetadataStore,
}

impl Registry {
    pub fn new(blobs: Arc<dyn BlobStore>, metadata: MetadataStore) -> Self {
        Registry { blobs, metadata }
    }

    /// Open a registry rooted at `root`: local blob store plus the metadata
    /// sidecar, both created if absent.
    pub async fn open(root: impl AsRef<Path>) -> StorageResult<Self> {
        let root = root.as_ref();
        let blobs = LocalBlobStore::new(root).await?;
        let metadata = MetadataStore::init(root).await?;
        Ok(Registry::new(Arc::new(blobs), metadata))
    }

    /// List all shared files, newest first.
    ///
    /// Blob listing joined with the sidecar; blobs without a metadata entry
    /// get the unknown-device defaults rather than failing, so the registry
    /// keeps working when the sidecar is deleted or corrupted externally.
    pub async fn list_files(&self) -> StorageResult<Vec<FileRecord>> {
        let entries = self.blobs.list().await?;
        let metadata = self.metadata.read().await;

        let mut records: Vec<FileRecord> = entries
            .into_iter()
            .map(|entry| {
                let identity = metadata
                    .get(&entry.name)
                    .map(|meta| DeviceIdentity {
                        id: meta.device_id.clone(),
                        name: meta.device_name.clone(),
                    })
                    .unwrap_or_default();

                FileRecord {
                    size_formatted: format_size(entry.size),
                    name: entry.name,
                    size: entry.size,
                    modified: entry.modified,
                    device_id: identity.id,
                    device_name: identity.name,
                }
            })
            .collect();

        // Newest first; name tiebreak keeps the order deterministic when
        // mtimes collide (common on coarse-grained filesystems).
        records.sort_by(|a, b| b.modified.cmp(&a.modified).then(a.name.cmp(&b.name)));

        Ok(records)
    }

    /// Store a blob under its original filename and record which device sent
    /// it. A second upload with the same name overwrites both the blob and
    /// its metadata entry.
    pub async fn upload_file(
        &self,
        name: &str,
        data: Vec<u8>,
        identity: DeviceIdentity,
    ) -> StorageResult<FileRecord> {
        self.blobs.put(name, data).await?;

        let entry = MetadataEntry {
            device_id: identity.id.clone(),
            device_name: identity.name.clone(),
            upload_time: Utc::now().to_rfc3339(),
        };
        self.metadata.upsert(name, entry).await?;

        let stat = self.blobs.stat(name).await?;

        tracing::info!(
            name = %name,
            size_bytes = stat.size,
            device_id = %identity.id,
            "File uploaded"
        );

        Ok(FileRecord {
            name: stat.name,
            size: stat.size,
            size_formatted: format_size(stat.size),
            modified: stat.modified,
            device_id: identity.id,
            device_name: identity.name,
        })
    }

    /// Open a file for download as a byte stream.
    pub async fn download_file(&self, name: &str) -> StorageResult<FileDownload> {
        let (size, stream) = self.blobs.open(name).await?;
        Ok(FileDownload { size, stream })
    }

    /// Delete a file and its metadata entry. The blob goes first; if the
    /// metadata removal then fails, the blob deletion stands and the stale
    /// entry is left for the next listing to tolerate.
    pub async fn delete_file(&self, name: &str) -> StorageResult<()> {
        self.blobs.delete(name).await?;

        if let Err(e) = self.metadata.remove(name).await {
            tracing::warn!(
                name = %name,
                error = %e,
                "Blob deleted but metadata entry could not be removed"
            );
        }

        tracing::info!(name = %name, "File deleted");
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use droplan_storage::{StorageError, METADATA_FILENAME};
    use futures::StreamExt;
    use tempfile::{tempdir, TempDir};

    fn identity(id: &str, name: &str) -> DeviceIdentity {
        DeviceIdentity {
            id: id.to_string(),
            name: name.to_string(),
        }
    }

    async fn registry() -> (TempDir, Registry) {
        let dir = tempdir().unwrap();
        let registry = Registry::open(dir.path()).await.unwrap();
        (dir, registry)
    }

    async fn collect(download: FileDownload) -> Vec<u8> {
        let mut data = Vec::new();
        let mut stream = download.stream;
        while let Some(chunk) = stream.next().await {
            data.extend_from_slice(&chunk.unwrap());
        }
        data
    }

    #[tokio::test]
    async fn test_upload_then_list_yields_exactly_one_record() {
        let (_dir, registry) = registry().await;

        let bytes = vec![0u8; 1024];
        registry
            .upload_file("report.pdf", bytes, identity("abc123", "Mac"))
            .await
            .unwrap();

        let records = registry.list_files().await.unwrap();
        assert_eq!(records.len(), 1);
        assert_eq!(records[0].name, "report.pdf");
        assert_eq!(records[0].size, 1024);
        assert_eq!(records[0].size_formatted, "1 KB");
        assert_eq!(records[0].device_id, "abc123");
        assert_eq!(records[0].device_name, "Mac");
    }

    #[tokio::test]
    async fn test_download_round_trip() {
        let (_dir, registry) = registry().await;

        let bytes: Vec<u8> = (0..=255).collect();
        registry
            .upload_file("données.bin", bytes.clone(), identity("d1", "phone"))
            .await
            .unwrap();

        let download = registry.download_file("données.bin").await.unwrap();
        assert_eq!(download.size, bytes.len() as u64);
        assert_eq!(collect(download).await, bytes);
    }

    #[tokio::test]
    async fn test_delete_removes_from_list_and_download() {
        let (_dir, registry) = registry().await;

        registry
            .upload_file("gone.txt", b"bye".to_vec(), identity("d1", "phone"))
            .await
            .unwrap();
        registry.delete_file("gone.txt").await.unwrap();

        assert!(registry.list_files().await.unwrap().is_empty());
        assert!(matches!(
            registry.download_file("gone.txt").await,
            Err(StorageError::NotFound(_))
        ));
    }

    #[tokio::test]
    async fn test_delete_twice_is_not_found_not_internal() {
        let (_dir, registry) = registry().await;

        registry
            .upload_file("once.txt", b"x".to_vec(), identity("d1", "phone"))
            .await
            .unwrap();

        assert!(registry.delete_file("once.txt").await.is_ok());
        assert!(matches!(
            registry.delete_file("once.txt").await,
            Err(StorageError::NotFound(_))
        ));
    }

    #[tokio::test]
    async fn test_traversal_names_are_forbidden() {
        let (_dir, registry) = registry().await;

        assert!(matches!(
            registry.download_file("../../etc/passwd").await,
            Err(StorageError::InvalidName(_))
        ));
        assert!(matches!(
            registry.delete_file("../secrets").await,
            Err(StorageError::InvalidName(_))
        ));
    }

    #[tokio::test]
    async fn test_reserved_sidecar_name_rejected_everywhere() {
        let (_dir, registry) = registry().await;

        assert!(matches!(
            registry
                .upload_file(METADATA_FILENAME, b"{}".to_vec(), identity("d1", "x"))
                .await,
            Err(StorageError::ReservedName(_))
        ));
        assert!(matches!(
            registry.download_file(METADATA_FILENAME).await,
            Err(StorageError::ReservedName(_))
        ));
        assert!(matches!(
            registry.delete_file(METADATA_FILENAME).await,
            Err(StorageError::ReservedName(_))
        ));
    }

    #[tokio::test]
    async fn test_two_devices_expose_distinct_ids() {
        let (_dir, registry) = registry().await;

        registry
            .upload_file("a.txt", b"a".to_vec(), identity("dev-a", "laptop"))
            .await
            .unwrap();
        registry
            .upload_file("b.txt", b"b".to_vec(), identity("dev-b", "phone"))
            .await
            .unwrap();

        let records = registry.list_files().await.unwrap();
        assert_eq!(records.len(), 2);
        let ids: Vec<&str> = records.iter().map(|r| r.device_id.as_str()).collect();
        assert!(ids.contains(&"dev-a"));
        assert!(ids.contains(&"dev-b"));
    }

    #[tokio::test]
    async fn test_listing_survives_external_sidecar_deletion() {
        let (dir, registry) = registry().await;

        registry
            .upload_file("orphan.txt", b"data".to_vec(), identity("abc", "Mac"))
            .await
            .unwrap();

        std::fs::remove_file(dir.path().join(METADATA_FILENAME)).unwrap();

        let records = registry.list_files().await.unwrap();
        assert_eq!(records.len(), 1);
        assert_eq!(records[0].device_id, "unknown");
        assert_eq!(records[0].device_name, "unknown device");
    }

    #[tokio::test]
    async fn test_overwrite_replaces_blob_and_metadata() {
        let (_dir, registry) = registry().await;

        registry
            .upload_file("same.txt", b"first".to_vec(), identity("dev-a", "laptop"))
            .await
            .unwrap();
        registry
            .upload_file("same.txt", b"second!".to_vec(), identity("dev-b", "phone"))
            .await
            .unwrap();

        let records = registry.list_files().await.unwrap();
        assert_eq!(records.len(), 1);
        assert_eq!(records[0].size, 7);
        assert_eq!(records[0].device_id, "dev-b");
    }

    #[tokio::test]
    async fn test_list_sorted_newest_first() {
        let (_dir, registry) = registry().await;

        registry
            .upload_file("older.txt", b"1".to_vec(), identity("d", "d"))
            .await
            .unwrap();
        // Put the writes in different mtime ticks even on coarse filesystems.
        tokio::time::sleep(std::time::Duration::from_millis(50)).await;
        registry
            .upload_file("newer.txt", b"2".to_vec(), identity("d", "d"))
            .await
            .unwrap();

        let records = registry.list_files().await.unwrap();
        assert_eq!(records[0].name, "newer.txt");
        assert_eq!(records[1].name, "older.txt");
    }
}
