//! Disk abstraction trait
//!
//! This module defines the Disk trait that all storage backends must implement.

use async_trait::async_trait;
use bytes::Bytes;
use std::path::PathBuf;
use thiserror::Error;
use uuid::Uuid;

/// Storage operation errors
#[derive(Debug, Error)]
pub enum StorageError {
    #[error("File not found: {0}")]
    NotFound(String),

    #[error("Access denied: {0}")]
    Denied(String),

    #[error("Storage unavailable: {0}")]
    Unavailable(String),

    #[error("Invalid storage path: {0}")]
    InvalidPath(String),

    #[error("Unknown disk: {0}")]
    UnknownDisk(String),

    #[error("IO error: {0}")]
    IoError(#[from] std::io::Error),

    #[error("Configuration error: {0}")]
    ConfigError(String),
}

/// Result type for storage operations
pub type StorageResult<T> = Result<T, StorageError>;

/// Storage abstraction trait
///
/// All storage backends (object store, local filesystem) must implement this
/// trait. Pipeline stages and the migrator work against it without coupling to
/// backend details.
///
/// **Path format:** Paths are `/`-separated keys relative to the disk root,
/// for example `videos/{asset_id}/hls/master.m3u8`. Paths must not contain
/// `..` segments or a leading `/`. Path generation is centralized in the
/// `paths` module so all callers stay consistent.
#[async_trait]
pub trait Disk: Send + Sync {
    /// The configured name of this disk (e.g. "local", "s3main").
    fn name(&self) -> &str;

    /// Check if a file exists.
    async fn exists(&self, path: &str) -> StorageResult<bool>;

    /// Write data to a path, overwriting any existing file.
    /// Returns the public URL for the stored file.
    async fn put(&self, path: &str, data: Bytes, content_type: &str) -> StorageResult<String>;

    /// Read the full contents of a file.
    async fn get(&self, path: &str) -> StorageResult<Bytes>;

    /// Delete a file. Deleting a missing file is not an error.
    async fn delete(&self, path: &str) -> StorageResult<()>;

    /// Delete every file under a prefix. A prefix with no files is a no-op.
    async fn delete_prefix(&self, prefix: &str) -> StorageResult<()>;

    /// List all file paths under a prefix, sorted, relative to the disk root.
    async fn list(&self, prefix: &str) -> StorageResult<Vec<String>>;

    /// Absolute filesystem path for a stored file, if this disk is backed by
    /// the local filesystem. Remote disks return None and callers must stage
    /// a temporary copy instead.
    fn local_path(&self, path: &str) -> Option<PathBuf>;

    /// Deterministic public URL for a path, derived from configuration alone.
    /// Does not check that the file exists.
    fn public_url(&self, path: &str) -> String;

    /// Round-trip probe: write a small object, read it back, delete it.
    /// Used to verify credentials and reachability before bulk operations.
    async fn test_connection(&self) -> StorageResult<()> {
        let probe_path = format!(".connection-test/{}.bin", Uuid::new_v4());
        let payload = Bytes::from_static(b"vodpipe connection test");

        self.put(&probe_path, payload.clone(), "application/octet-stream")
            .await
            .map_err(|e| connection_failure(self.name(), "write", e))?;
        let read_back = self
            .get(&probe_path)
            .await
            .map_err(|e| connection_failure(self.name(), "read", e))?;
        if read_back != payload {
            return Err(StorageError::Unavailable(format!(
                "connection test failed for disk '{}': probe read back different bytes",
                self.name()
            )));
        }
        self.delete(&probe_path)
            .await
            .map_err(|e| connection_failure(self.name(), "cleanup", e))?;

        tracing::debug!(disk = %self.name(), "Connection test passed");
        Ok(())
    }
}

fn connection_failure(disk: &str, stage: &str, err: StorageError) -> StorageError {
    StorageError::Unavailable(format!(
        "connection test failed for disk '{}' during {}: {}",
        disk, stage, err
    ))
}

/// Validate a storage path and split it into segments.
///
/// Rejects empty paths, absolute paths, and any `..` traversal segment.
pub(crate) fn validate_path(path: &str) -> StorageResult<()> {
    if path.is_empty() {
        return Err(StorageError::InvalidPath("path is empty".to_string()));
    }
    if path.starts_with('/') {
        return Err(StorageError::InvalidPath(format!(
            "path must be relative: {}",
            path
        )));
    }
    if path.split('/').any(|segment| segment == "..") {
        return Err(StorageError::InvalidPath(format!(
            "path contains traversal: {}",
            path
        )));
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_validate_path_accepts_nested_keys() {
        assert!(validate_path("videos/abc/hls/master.m3u8").is_ok());
        assert!(validate_path("probe.bin").is_ok());
    }

    #[test]
    fn test_validate_path_rejects_traversal() {
        let result = validate_path("videos/../../etc/passwd");
        assert!(matches!(result, Err(StorageError::InvalidPath(_))));
    }

    #[test]
    fn test_validate_path_rejects_absolute() {
        let result = validate_path("/etc/passwd");
        assert!(matches!(result, Err(StorageError::InvalidPath(_))));
    }

    #[test]
    fn test_validate_path_rejects_empty() {
        let result = validate_path("");
        assert!(matches!(result, Err(StorageError::InvalidPath(_))));
    }
}
