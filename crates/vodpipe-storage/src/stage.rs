//! Staging of stored sources into local scratch space

use crate::disk::{Disk, StorageError, StorageResult};
use std::path::{Path, PathBuf};
use tempfile::TempDir;

/// A stored source file materialized on the local filesystem, so external
/// tools can read it by path.
///
/// For disks backed by the local filesystem the file is borrowed in place and
/// nothing is copied. For remote disks the bytes are downloaded into a
/// scratch directory that is removed when the staged source is dropped.
pub struct StagedSource {
    path: PathBuf,
    _scratch: Option<TempDir>,
}

impl StagedSource {
    pub async fn new(disk: &dyn Disk, stored_path: &str) -> StorageResult<Self> {
        if let Some(local) = disk.local_path(stored_path) {
            if !local.as_path().try_exists()? {
                return Err(StorageError::NotFound(stored_path.to_string()));
            }
            tracing::debug!(
                disk = %disk.name(),
                path = %stored_path,
                "Source available in place, no staging copy"
            );
            return Ok(Self {
                path: local,
                _scratch: None,
            });
        }

        let data = disk.get(stored_path).await?;
        let scratch = TempDir::new()?;
        let file_name = stored_path
            .rsplit('/')
            .next()
            .filter(|name| !name.is_empty())
            .unwrap_or("source.bin");
        let path = scratch.path().join(file_name);
        tokio::fs::write(&path, &data).await?;

        tracing::debug!(
            disk = %disk.name(),
            path = %stored_path,
            staged_to = %path.display(),
            size_bytes = data.len(),
            "Source staged to scratch directory"
        );

        Ok(Self {
            path,
            _scratch: Some(scratch),
        })
    }

    /// Filesystem path of the staged file.
    pub fn path(&self) -> &Path {
        &self.path
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::local::LocalDisk;
    use crate::test_helpers::MemoryDisk;
    use bytes::Bytes;
    use vodpipe_core::DiskSettings;

    #[tokio::test]
    async fn test_local_disk_source_is_borrowed_in_place() {
        let dir = tempfile::tempdir().unwrap();
        let settings =
            DiskSettings::local("local", dir.path().to_str().unwrap(), "http://localhost");
        let disk = LocalDisk::new(&settings).await.unwrap();
        disk.put("videos/a/source.mp4", Bytes::from_static(b"mp4"), "video/mp4")
            .await
            .unwrap();

        let staged = StagedSource::new(&disk, "videos/a/source.mp4").await.unwrap();
        assert!(staged.path().starts_with(dir.path()));
        assert_eq!(std::fs::read(staged.path()).unwrap(), b"mp4");
    }

    #[tokio::test]
    async fn test_local_disk_missing_source_is_not_found() {
        let dir = tempfile::tempdir().unwrap();
        let settings =
            DiskSettings::local("local", dir.path().to_str().unwrap(), "http://localhost");
        let disk = LocalDisk::new(&settings).await.unwrap();

        let result = StagedSource::new(&disk, "videos/a/source.mp4").await;
        assert!(matches!(result, Err(StorageError::NotFound(_))));
    }

    #[tokio::test]
    async fn test_remote_disk_source_is_copied_and_cleaned_up() {
        let disk = MemoryDisk::new("mem");
        disk.put("videos/a/source.mp4", Bytes::from_static(b"remote"), "video/mp4")
            .await
            .unwrap();

        let staged = StagedSource::new(&disk, "videos/a/source.mp4").await.unwrap();
        let staged_path = staged.path().to_path_buf();
        assert_eq!(std::fs::read(&staged_path).unwrap(), b"remote");
        assert!(staged_path.ends_with("source.mp4"));

        drop(staged);
        assert!(!staged_path.exists());
    }
}
