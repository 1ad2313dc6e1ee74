//! Local filesystem storage backend

use crate::disk::{validate_path, Disk, StorageError, StorageResult};
use async_trait::async_trait;
use bytes::Bytes;
use std::path::{Path, PathBuf};
use std::time::Instant;
use tokio::fs;
use tokio::io::AsyncWriteExt;
use vodpipe_core::DiskSettings;

/// Local filesystem storage backend.
///
/// Stores files under a base directory, with paths mapped directly to
/// filesystem locations. Public URLs are derived by joining the configured
/// base URL with the storage path.
pub struct LocalDisk {
    name: String,
    base_path: PathBuf,
    base_url: String,
}

impl LocalDisk {
    /// Create a new local disk from settings, creating the base directory if
    /// it doesn't exist.
    pub async fn new(settings: &DiskSettings) -> StorageResult<Self> {
        let root = settings.root.as_deref().ok_or_else(|| {
            StorageError::ConfigError(format!("local disk '{}' has no root", settings.name))
        })?;
        let base_url = settings.base_url.as_deref().ok_or_else(|| {
            StorageError::ConfigError(format!("local disk '{}' has no base URL", settings.name))
        })?;

        let base_path = PathBuf::from(root);
        fs::create_dir_all(&base_path).await?;

        tracing::info!(
            disk = %settings.name,
            base_path = %base_path.display(),
            "Local disk initialized"
        );

        Ok(Self {
            name: settings.name.clone(),
            base_path,
            base_url: base_url.to_string(),
        })
    }

    /// Convert a storage path to a filesystem path, rejecting traversal.
    fn resolve(&self, path: &str) -> StorageResult<PathBuf> {
        validate_path(path)?;
        Ok(self.base_path.join(path))
    }

    async fn ensure_parent_dir(&self, file_path: &Path) -> StorageResult<()> {
        if let Some(parent) = file_path.parent() {
            fs::create_dir_all(parent).await?;
        }
        Ok(())
    }
}

#[async_trait]
impl Disk for LocalDisk {
    fn name(&self) -> &str {
        &self.name
    }

    async fn exists(&self, path: &str) -> StorageResult<bool> {
        let file_path = self.resolve(path)?;
        Ok(file_path.as_path().try_exists()?)
    }

    async fn put(&self, path: &str, data: Bytes, _content_type: &str) -> StorageResult<String> {
        let start = Instant::now();
        let file_path = self.resolve(path)?;
        self.ensure_parent_dir(&file_path).await?;

        let size_bytes = data.len();
        let mut file = fs::File::create(&file_path).await?;
        file.write_all(&data).await?;
        file.sync_all().await?;

        tracing::info!(
            disk = %self.name,
            path = %path,
            size_bytes = size_bytes,
            duration_ms = start.elapsed().as_secs_f64() * 1000.0,
            "File written to local disk"
        );

        Ok(self.public_url(path))
    }

    async fn get(&self, path: &str) -> StorageResult<Bytes> {
        let file_path = self.resolve(path)?;
        if !file_path.as_path().try_exists()? {
            return Err(StorageError::NotFound(path.to_string()));
        }
        let data = fs::read(&file_path).await?;
        Ok(Bytes::from(data))
    }

    async fn delete(&self, path: &str) -> StorageResult<()> {
        let file_path = self.resolve(path)?;
        if !file_path.as_path().try_exists()? {
            tracing::debug!(disk = %self.name, path = %path, "Delete skipped, file does not exist");
            return Ok(());
        }
        fs::remove_file(&file_path).await?;
        tracing::info!(disk = %self.name, path = %path, "File deleted from local disk");
        Ok(())
    }

    async fn delete_prefix(&self, prefix: &str) -> StorageResult<()> {
        let dir_path = self.resolve(prefix)?;
        if !dir_path.as_path().try_exists()? {
            return Ok(());
        }
        let meta = fs::metadata(&dir_path).await?;
        if meta.is_dir() {
            fs::remove_dir_all(&dir_path).await?;
        } else {
            fs::remove_file(&dir_path).await?;
        }
        tracing::info!(disk = %self.name, prefix = %prefix, "Prefix deleted from local disk");
        Ok(())
    }

    async fn list(&self, prefix: &str) -> StorageResult<Vec<String>> {
        let root = self.resolve(prefix)?;
        if !root.as_path().try_exists()? {
            return Ok(Vec::new());
        }
        let meta = fs::metadata(&root).await?;
        if meta.is_file() {
            return Ok(vec![prefix.trim_end_matches('/').to_string()]);
        }

        let mut files = Vec::new();
        let mut pending = vec![root];
        while let Some(dir) = pending.pop() {
            let mut entries = fs::read_dir(&dir).await?;
            while let Some(entry) = entries.next_entry().await? {
                let entry_path = entry.path();
                let file_type = entry.file_type().await?;
                if file_type.is_dir() {
                    pending.push(entry_path);
                } else if file_type.is_file() {
                    if let Ok(relative) = entry_path.strip_prefix(&self.base_path) {
                        files.push(relative.to_string_lossy().into_owned());
                    }
                }
            }
        }
        files.sort();
        Ok(files)
    }

    fn local_path(&self, path: &str) -> Option<PathBuf> {
        self.resolve(path).ok()
    }

    fn public_url(&self, path: &str) -> String {
        format!("{}/{}", self.base_url.trim_end_matches('/'), path)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::tempdir;

    async fn test_disk(dir: &tempfile::TempDir) -> LocalDisk {
        let settings = DiskSettings::local(
            "local",
            dir.path().to_str().unwrap(),
            "http://localhost:4000/media/",
        );
        LocalDisk::new(&settings).await.unwrap()
    }

    #[tokio::test]
    async fn test_put_get_round_trip() {
        let dir = tempdir().unwrap();
        let disk = test_disk(&dir).await;

        let url = disk
            .put("videos/a/source.mp4", Bytes::from_static(b"video bytes"), "video/mp4")
            .await
            .unwrap();
        assert_eq!(url, "http://localhost:4000/media/videos/a/source.mp4");

        let data = disk.get("videos/a/source.mp4").await.unwrap();
        assert_eq!(data, Bytes::from_static(b"video bytes"));
    }

    #[tokio::test]
    async fn test_get_missing_returns_not_found() {
        let dir = tempdir().unwrap();
        let disk = test_disk(&dir).await;

        let result = disk.get("videos/missing.mp4").await;
        assert!(matches!(result, Err(StorageError::NotFound(_))));
    }

    #[tokio::test]
    async fn test_put_rejects_path_traversal() {
        let dir = tempdir().unwrap();
        let disk = test_disk(&dir).await;

        let result = disk
            .put("../escape.bin", Bytes::from_static(b"x"), "application/octet-stream")
            .await;
        assert!(matches!(result, Err(StorageError::InvalidPath(_))));

        let result = disk.get("/etc/passwd").await;
        assert!(matches!(result, Err(StorageError::InvalidPath(_))));
    }

    #[tokio::test]
    async fn test_delete_missing_is_ok() {
        let dir = tempdir().unwrap();
        let disk = test_disk(&dir).await;

        assert!(disk.delete("videos/never-existed.mp4").await.is_ok());
    }

    #[tokio::test]
    async fn test_exists_reflects_put_and_delete() {
        let dir = tempdir().unwrap();
        let disk = test_disk(&dir).await;

        assert!(!disk.exists("videos/a/thumb.jpg").await.unwrap());
        disk.put("videos/a/thumb.jpg", Bytes::from_static(b"jpg"), "image/jpeg")
            .await
            .unwrap();
        assert!(disk.exists("videos/a/thumb.jpg").await.unwrap());

        disk.delete("videos/a/thumb.jpg").await.unwrap();
        assert!(!disk.exists("videos/a/thumb.jpg").await.unwrap());
    }

    #[tokio::test]
    async fn test_list_returns_sorted_relative_paths() {
        let dir = tempdir().unwrap();
        let disk = test_disk(&dir).await;

        for path in [
            "videos/a/hls/240p/segment_000.ts",
            "videos/a/hls/240p/index.m3u8",
            "videos/a/source.mp4",
            "videos/b/source.mp4",
        ] {
            disk.put(path, Bytes::from_static(b"x"), "application/octet-stream")
                .await
                .unwrap();
        }

        let listed = disk.list("videos/a").await.unwrap();
        assert_eq!(
            listed,
            vec![
                "videos/a/hls/240p/index.m3u8".to_string(),
                "videos/a/hls/240p/segment_000.ts".to_string(),
                "videos/a/source.mp4".to_string(),
            ]
        );
    }

    #[tokio::test]
    async fn test_list_missing_prefix_is_empty() {
        let dir = tempdir().unwrap();
        let disk = test_disk(&dir).await;

        assert!(disk.list("videos/none").await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_delete_prefix_removes_tree() {
        let dir = tempdir().unwrap();
        let disk = test_disk(&dir).await;

        disk.put("videos/a/source.mp4", Bytes::from_static(b"x"), "video/mp4")
            .await
            .unwrap();
        disk.put("videos/a/hls/master.m3u8", Bytes::from_static(b"y"), "text/plain")
            .await
            .unwrap();

        disk.delete_prefix("videos/a").await.unwrap();
        assert!(!disk.exists("videos/a/source.mp4").await.unwrap());
        assert!(disk.list("videos/a").await.unwrap().is_empty());

        // Idempotent
        assert!(disk.delete_prefix("videos/a").await.is_ok());
    }

    #[tokio::test]
    async fn test_local_path_points_into_base_dir() {
        let dir = tempdir().unwrap();
        let disk = test_disk(&dir).await;

        let path = disk.local_path("videos/a/source.mp4").unwrap();
        assert!(path.starts_with(dir.path()));
        assert!(disk.local_path("../escape").is_none());
    }

    #[tokio::test]
    async fn test_connection_round_trip() {
        let dir = tempdir().unwrap();
        let disk = test_disk(&dir).await;

        assert!(disk.test_connection().await.is_ok());
    }
}
