//! Local filesystem blob store

use crate::metadata::METADATA_FILENAME;
use crate::traits::{BlobEntry, BlobStore, StorageError, StorageResult};
use async_trait::async_trait;
use bytes::Bytes;
use chrono::{DateTime, Utc};
use futures::{Stream, StreamExt};
use std::path::{Component, Path, PathBuf};
use std::pin::Pin;
use tokio::fs;
use tokio::io::AsyncWriteExt;

/// Blob store over a single directory on disk.
///
/// Files live directly under the root by their original name. Every
/// operation touches the real filesystem; there is no in-memory cache, so
/// `list()` re-stats each file on every call (fine at LAN-sharing scale).
#[derive(Clone)]
pub struct LocalBlobStore {
    root: PathBuf,
}

impl LocalBlobStore {
    /// Create a new LocalBlobStore, creating the root directory if needed.
    pub async fn new(root: impl Into<PathBuf>) -> StorageResult<Self> {
        let root = root.into();

        fs::create_dir_all(&root).await.map_err(|e| {
            StorageError::WriteFailed(format!(
                "Failed to create storage directory {}: {}",
                root.display(),
                e
            ))
        })?;

        Ok(LocalBlobStore { root })
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    /// Resolve a blob name to a filesystem path with path-safety validation.
    ///
    /// Rejects the reserved sidecar name, absolute paths, and any name whose
    /// resolution escapes the storage root. Names are attacker-controlled
    /// (they come straight from URLs and multipart filenames).
    fn resolve(&self, name: &str) -> StorageResult<PathBuf> {
        if name.is_empty() {
            return Err(StorageError::InvalidName("empty blob name".to_string()));
        }
        if name == METADATA_FILENAME {
            return Err(StorageError::ReservedName(name.to_string()));
        }

        let candidate = Path::new(name);
        if candidate.is_absolute()
            || candidate
                .components()
                .any(|c| matches!(c, Component::ParentDir))
        {
            return Err(StorageError::InvalidName(
                "blob name resolves outside storage root".to_string(),
            ));
        }

        let path = self.root.join(name);

        // Lexical checks above already exclude `..`; canonicalize when the
        // file exists to also catch symlink escapes.
        if let Ok(canonical) = path.canonicalize() {
            let root_canonical = self.root.canonicalize()?;
            if !canonical.starts_with(&root_canonical) {
                return Err(StorageError::InvalidName(
                    "blob name resolves outside storage root".to_string(),
                ));
            }
        }

        Ok(path)
    }

    fn entry_from_std_metadata(name: String, meta: &std::fs::Metadata) -> BlobEntry {
        let modified = meta
            .modified()
            .map(DateTime::<Utc>::from)
            .unwrap_or_else(|_| Utc::now());
        BlobEntry {
            name,
            size: meta.len(),
            modified,
        }
    }
}

#[async_trait]
impl BlobStore for LocalBlobStore {
    async fn put(&self, name: &str, data: Vec<u8>) -> StorageResult<()> {
        // Blobs are flat under the root; a name with a separator would need
        // parent directories the listing would never see.
        if name.contains('/') || name.contains('\\') {
            return Err(StorageError::InvalidName(
                "blob name must be a bare filename".to_string(),
            ));
        }
        let path = self.resolve(name)?;
        let size = data.len();

        let mut file = fs::File::create(&path).await.map_err(|e| {
            StorageError::WriteFailed(format!("Failed to create file {}: {}", path.display(), e))
        })?;

        file.write_all(&data).await.map_err(|e| {
            StorageError::WriteFailed(format!("Failed to write file {}: {}", path.display(), e))
        })?;

        file.sync_all().await.map_err(|e| {
            StorageError::WriteFailed(format!("Failed to sync file {}: {}", path.display(), e))
        })?;

        tracing::info!(
            path = %path.display(),
            size_bytes = size,
            "Blob stored"
        );

        Ok(())
    }

    async fn list(&self) -> StorageResult<Vec<BlobEntry>> {
        let mut entries = Vec::new();
        let mut dir = fs::read_dir(&self.root).await?;

        while let Some(entry) = dir.next_entry().await? {
            let name = entry.file_name().to_string_lossy().to_string();
            if name == METADATA_FILENAME {
                continue;
            }

            let meta = match entry.metadata().await {
                Ok(meta) if meta.is_file() => meta,
                Ok(_) => continue,
                Err(e) => {
                    // File deleted between readdir and stat; skip it.
                    tracing::debug!(name = %name, error = %e, "Skipping unstattable entry");
                    continue;
                }
            };

            entries.push(Self::entry_from_std_metadata(name, &meta));
        }

        Ok(entries)
    }

    async fn open(
        &self,
        name: &str,
    ) -> StorageResult<(
        u64,
        Pin<Box<dyn Stream<Item = Result<Bytes, StorageError>> + Send>>,
    )> {
        let path = self.resolve(name)?;

        if !fs::try_exists(&path).await.unwrap_or(false) {
            return Err(StorageError::NotFound(name.to_string()));
        }

        let file = fs::File::open(&path).await.map_err(|e| {
            StorageError::ReadFailed(format!("Failed to open file {}: {}", path.display(), e))
        })?;
        let size = file
            .metadata()
            .await
            .map_err(|e| StorageError::ReadFailed(e.to_string()))?
            .len();

        let reader = tokio_util::io::ReaderStream::new(file);
        let stream = reader.map(|result| {
            result.map_err(|e| StorageError::ReadFailed(format!("Failed to read chunk: {}", e)))
        });

        tracing::debug!(path = %path.display(), size_bytes = size, "Streaming blob");

        Ok((size, Box::pin(stream)))
    }

    async fn read(&self, name: &str) -> StorageResult<Vec<u8>> {
        let path = self.resolve(name)?;

        if !fs::try_exists(&path).await.unwrap_or(false) {
            return Err(StorageError::NotFound(name.to_string()));
        }

        let data = fs::read(&path).await.map_err(|e| {
            StorageError::ReadFailed(format!("Failed to read file {}: {}", path.display(), e))
        })?;

        Ok(data)
    }

    async fn delete(&self, name: &str) -> StorageResult<()> {
        let path = self.resolve(name)?;

        if !fs::try_exists(&path).await.unwrap_or(false) {
            return Err(StorageError::NotFound(name.to_string()));
        }

        fs::remove_file(&path).await.map_err(|e| {
            StorageError::DeleteFailed(format!("Failed to delete file {}: {}", path.display(), e))
        })?;

        tracing::info!(path = %path.display(), "Blob deleted");

        Ok(())
    }

    async fn stat(&self, name: &str) -> StorageResult<BlobEntry> {
        let path = self.resolve(name)?;
        let meta = fs::metadata(&path)
            .await
            .map_err(|_| StorageError::NotFound(name.to_string()))?;
        Ok(Self::entry_from_std_metadata(name.to_string(), &meta))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use futures::StreamExt;
    use tempfile::tempdir;

    #[tokio::test]
    async fn test_put_read_round_trip() {
        let dir = tempdir().unwrap();
        let store = LocalBlobStore::new(dir.path()).await.unwrap();

        let data = b"hello lan".to_vec();
        store.put("hello.txt", data.clone()).await.unwrap();

        let read_back = store.read("hello.txt").await.unwrap();
        assert_eq!(data, read_back);
    }

    #[tokio::test]
    async fn test_put_overwrites_existing_blob() {
        let dir = tempdir().unwrap();
        let store = LocalBlobStore::new(dir.path()).await.unwrap();

        store.put("report.pdf", b"first".to_vec()).await.unwrap();
        store.put("report.pdf", b"second".to_vec()).await.unwrap();

        assert_eq!(store.read("report.pdf").await.unwrap(), b"second");
        assert_eq!(store.list().await.unwrap().len(), 1);
    }

    #[tokio::test]
    async fn test_non_ascii_filename() {
        let dir = tempdir().unwrap();
        let store = LocalBlobStore::new(dir.path()).await.unwrap();

        let name = "日報 2024.txt";
        store.put(name, b"content".to_vec()).await.unwrap();

        let entries = store.list().await.unwrap();
        assert_eq!(entries.len(), 1);
        assert_eq!(entries[0].name, name);
        assert_eq!(store.read(name).await.unwrap(), b"content");
    }

    #[tokio::test]
    async fn test_list_excludes_metadata_sidecar() {
        let dir = tempdir().unwrap();
        let store = LocalBlobStore::new(dir.path()).await.unwrap();

        std::fs::write(dir.path().join(METADATA_FILENAME), b"{}").unwrap();
        store.put("a.txt", b"a".to_vec()).await.unwrap();

        let entries = store.list().await.unwrap();
        assert_eq!(entries.len(), 1);
        assert_eq!(entries[0].name, "a.txt");
        assert_eq!(entries[0].size, 1);
    }

    #[tokio::test]
    async fn test_path_traversal_rejected() {
        let dir = tempdir().unwrap();
        let store = LocalBlobStore::new(dir.path()).await.unwrap();

        for name in ["../../etc/passwd", "..", "a/../../b", "/etc/passwd"] {
            let result = store.read(name).await;
            assert!(
                matches!(result, Err(StorageError::InvalidName(_))),
                "name {:?} should be rejected",
                name
            );
            let result = store.delete(name).await;
            assert!(matches!(result, Err(StorageError::InvalidName(_))));
        }
    }

    #[tokio::test]
    async fn test_reserved_name_rejected() {
        let dir = tempdir().unwrap();
        let store = LocalBlobStore::new(dir.path()).await.unwrap();

        let result = store.put(METADATA_FILENAME, b"evil".to_vec()).await;
        assert!(matches!(result, Err(StorageError::ReservedName(_))));

        let result = store.read(METADATA_FILENAME).await;
        assert!(matches!(result, Err(StorageError::ReservedName(_))));

        let result = store.delete(METADATA_FILENAME).await;
        assert!(matches!(result, Err(StorageError::ReservedName(_))));
    }

    #[tokio::test]
    async fn test_put_rejects_nested_name() {
        let dir = tempdir().unwrap();
        let store = LocalBlobStore::new(dir.path()).await.unwrap();

        let result = store.put("sub/file.txt", b"x".to_vec()).await;
        assert!(matches!(result, Err(StorageError::InvalidName(_))));
    }

    #[tokio::test]
    async fn test_delete_then_read_is_not_found() {
        let dir = tempdir().unwrap();
        let store = LocalBlobStore::new(dir.path()).await.unwrap();

        store.put("gone.txt", b"bye".to_vec()).await.unwrap();
        store.delete("gone.txt").await.unwrap();

        assert!(matches!(
            store.read("gone.txt").await,
            Err(StorageError::NotFound(_))
        ));
        assert!(matches!(
            store.delete("gone.txt").await,
            Err(StorageError::NotFound(_))
        ));
    }

    #[tokio::test]
    async fn test_open_streams_full_content() {
        let dir = tempdir().unwrap();
        let store = LocalBlobStore::new(dir.path()).await.unwrap();

        let data: Vec<u8> = (0..=255u8).cycle().take(100_000).collect();
        store.put("blob.bin", data.clone()).await.unwrap();

        let (size, mut stream) = store.open("blob.bin").await.unwrap();
        assert_eq!(size, data.len() as u64);

        let mut collected = Vec::new();
        while let Some(chunk) = stream.next().await {
            collected.extend_from_slice(&chunk.unwrap());
        }
        assert_eq!(collected, data);
    }
}
