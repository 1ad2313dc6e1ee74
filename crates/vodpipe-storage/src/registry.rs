//! Registry of configured storage disks

use crate::disk::{Disk, StorageError, StorageResult};
use crate::local::LocalDisk;
use crate::s3::ObjectStoreDisk;
use std::collections::HashMap;
use std::sync::Arc;
use vodpipe_core::{DiskKind, PipelineConfig};

/// All configured disks, keyed by name.
///
/// Built once at startup; pipeline stages and the migrator resolve disks by
/// name through it.
pub struct DiskRegistry {
    disks: HashMap<String, Arc<dyn Disk>>,
    default_disk: String,
}

impl DiskRegistry {
    /// Build every disk named in the configuration.
    pub async fn from_config(config: &PipelineConfig) -> StorageResult<Self> {
        let mut disks: HashMap<String, Arc<dyn Disk>> = HashMap::new();
        for settings in &config.disks {
            let disk: Arc<dyn Disk> = match settings.kind {
                DiskKind::Local => Arc::new(LocalDisk::new(settings).await?),
                DiskKind::ObjectStore => Arc::new(ObjectStoreDisk::new(settings)?),
            };
            disks.insert(settings.name.clone(), disk);
        }
        Self::with_disks_map(disks, &config.default_disk)
    }

    /// Build a registry from already-constructed disks. Used by tests.
    pub fn with_disks(disks: Vec<Arc<dyn Disk>>, default_disk: &str) -> StorageResult<Self> {
        let mut map: HashMap<String, Arc<dyn Disk>> = HashMap::new();
        for disk in disks {
            map.insert(disk.name().to_string(), disk);
        }
        Self::with_disks_map(map, default_disk)
    }

    fn with_disks_map(
        disks: HashMap<String, Arc<dyn Disk>>,
        default_disk: &str,
    ) -> StorageResult<Self> {
        if disks.is_empty() {
            return Err(StorageError::ConfigError(
                "no disks configured".to_string(),
            ));
        }
        if !disks.contains_key(default_disk) {
            return Err(StorageError::ConfigError(format!(
                "default disk '{}' is not configured",
                default_disk
            )));
        }
        Ok(Self {
            disks,
            default_disk: default_disk.to_string(),
        })
    }

    /// Resolve a disk by name.
    pub fn get(&self, name: &str) -> StorageResult<Arc<dyn Disk>> {
        self.disks
            .get(name)
            .cloned()
            .ok_or_else(|| StorageError::UnknownDisk(name.to_string()))
    }

    /// The disk new uploads and acquisitions land on.
    pub fn default_disk(&self) -> StorageResult<Arc<dyn Disk>> {
        self.get(&self.default_disk)
    }

    pub fn default_name(&self) -> &str {
        &self.default_disk
    }

    pub fn names(&self) -> Vec<&str> {
        let mut names: Vec<&str> = self.disks.keys().map(String::as_str).collect();
        names.sort_unstable();
        names
    }
}
