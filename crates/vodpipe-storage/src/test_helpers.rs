//! Test helpers: in-memory storage backend
//!
//! Used by unit tests across the workspace to exercise storage-dependent
//! code without touching the filesystem or network.

use crate::disk::{validate_path, Disk, StorageError, StorageResult};
use async_trait::async_trait;
use bytes::Bytes;
use std::collections::HashMap;
use std::path::PathBuf;
use std::sync::Mutex;

/// In-memory Disk implementation.
///
/// `local_path` always returns None, so callers take the same staging path
/// they would for a remote disk. Failure injection knobs let tests simulate
/// outages and partial writes.
pub struct MemoryDisk {
    name: String,
    files: Mutex<HashMap<String, Bytes>>,
    unavailable: Mutex<bool>,
    fail_puts_containing: Mutex<Option<String>>,
}

impl MemoryDisk {
    pub fn new(name: &str) -> Self {
        Self {
            name: name.to_string(),
            files: Mutex::new(HashMap::new()),
            unavailable: Mutex::new(false),
            fail_puts_containing: Mutex::new(None),
        }
    }

    /// Make every operation fail with `StorageError::Unavailable`.
    pub fn set_unavailable(&self, unavailable: bool) {
        *self.unavailable.lock().unwrap() = unavailable;
    }

    /// Make puts whose path contains the given substring fail.
    pub fn fail_puts_containing(&self, needle: &str) {
        *self.fail_puts_containing.lock().unwrap() = Some(needle.to_string());
    }

    /// All stored paths, sorted.
    pub fn paths(&self) -> Vec<String> {
        let mut paths: Vec<String> = self.files.lock().unwrap().keys().cloned().collect();
        paths.sort();
        paths
    }

    pub fn file_count(&self) -> usize {
        self.files.lock().unwrap().len()
    }

    fn check_available(&self, path: &str) -> StorageResult<()> {
        if *self.unavailable.lock().unwrap() {
            return Err(StorageError::Unavailable(format!(
                "{}: disk '{}' is offline",
                path, self.name
            )));
        }
        Ok(())
    }
}

fn under_prefix(path: &str, prefix: &str) -> bool {
    path == prefix || path.starts_with(&format!("{}/", prefix.trim_end_matches('/')))
}

#[async_trait]
impl Disk for MemoryDisk {
    fn name(&self) -> &str {
        &self.name
    }

    async fn exists(&self, path: &str) -> StorageResult<bool> {
        validate_path(path)?;
        self.check_available(path)?;
        Ok(self.files.lock().unwrap().contains_key(path))
    }

    async fn put(&self, path: &str, data: Bytes, _content_type: &str) -> StorageResult<String> {
        validate_path(path)?;
        self.check_available(path)?;
        if let Some(needle) = self.fail_puts_containing.lock().unwrap().as_deref() {
            if path.contains(needle) {
                return Err(StorageError::Unavailable(format!(
                    "{}: injected put failure",
                    path
                )));
            }
        }
        self.files.lock().unwrap().insert(path.to_string(), data);
        Ok(self.public_url(path))
    }

    async fn get(&self, path: &str) -> StorageResult<Bytes> {
        validate_path(path)?;
        self.check_available(path)?;
        self.files
            .lock()
            .unwrap()
            .get(path)
            .cloned()
            .ok_or_else(|| StorageError::NotFound(path.to_string()))
    }

    async fn delete(&self, path: &str) -> StorageResult<()> {
        validate_path(path)?;
        self.check_available(path)?;
        self.files.lock().unwrap().remove(path);
        Ok(())
    }

    async fn delete_prefix(&self, prefix: &str) -> StorageResult<()> {
        validate_path(prefix)?;
        self.check_available(prefix)?;
        self.files
            .lock()
            .unwrap()
            .retain(|path, _| !under_prefix(path, prefix));
        Ok(())
    }

    async fn list(&self, prefix: &str) -> StorageResult<Vec<String>> {
        validate_path(prefix)?;
        self.check_available(prefix)?;
        let mut paths: Vec<String> = self
            .files
            .lock()
            .unwrap()
            .keys()
            .filter(|path| under_prefix(path, prefix))
            .cloned()
            .collect();
        paths.sort();
        Ok(paths)
    }

    fn local_path(&self, _path: &str) -> Option<PathBuf> {
        None
    }

    fn public_url(&self, path: &str) -> String {
        format!("memory://{}/{}", self.name, path)
    }
}
