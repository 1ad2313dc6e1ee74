//! Cross-disk storage migration
//!
//! Copies every file belonging to selected assets from a source disk to a
//! target disk, then repoints each asset record. The disk flip is per-asset
//! and all-or-nothing: an asset is only repointed after every one of its
//! files copied successfully. There is no rollback; files already copied for
//! a failed asset stay on the target and are overwritten on the next run.

use crate::disk::{Disk, StorageError};
use crate::paths;
use crate::registry::DiskRegistry;
use std::collections::BTreeSet;
use std::sync::Arc;
use thiserror::Error;
use uuid::Uuid;
use vodpipe_core::{AssetStore, StoreError, VideoAsset};

#[derive(Debug, Error)]
pub enum MigrateError {
    #[error("source and target are both '{0}', nothing to migrate")]
    SameDisk(String),

    #[error(transparent)]
    Storage(#[from] StorageError),

    #[error("asset store error: {0}")]
    Store(#[from] StoreError),
}

/// What to migrate and how.
#[derive(Debug, Clone)]
pub struct MigrationOptions {
    pub from: String,
    pub to: String,
    /// Migrate at most this many assets; None migrates everything.
    pub limit: Option<usize>,
    /// Plan only: enumerate and count, but write nothing and skip the
    /// target connection test.
    pub dry_run: bool,
}

#[derive(Debug, Clone)]
pub struct MigrationFailure {
    pub asset_id: Uuid,
    pub reason: String,
}

/// Outcome of one migration run.
#[derive(Debug, Default)]
pub struct MigrationReport {
    pub dry_run: bool,
    /// Assets fully copied and repointed (or counted, in a dry run).
    pub migrated: usize,
    /// Assets selected but carrying no files.
    pub skipped: usize,
    pub files_copied: usize,
    pub failures: Vec<MigrationFailure>,
}

impl MigrationReport {
    pub fn is_success(&self) -> bool {
        self.failures.is_empty()
    }
}

impl std::fmt::Display for MigrationReport {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(
            f,
            "{}migrated {} asset(s) ({} file(s)), skipped {}, failed {}",
            if self.dry_run { "[dry run] " } else { "" },
            self.migrated,
            self.files_copied,
            self.skipped,
            self.failures.len()
        )
    }
}

/// Moves asset files between configured disks.
pub struct Migrator {
    registry: Arc<DiskRegistry>,
    store: Arc<dyn AssetStore>,
}

impl Migrator {
    pub fn new(registry: Arc<DiskRegistry>, store: Arc<dyn AssetStore>) -> Self {
        Self { registry, store }
    }

    pub async fn run(&self, options: &MigrationOptions) -> Result<MigrationReport, MigrateError> {
        if options.from == options.to {
            return Err(MigrateError::SameDisk(options.from.clone()));
        }
        let source = self.registry.get(&options.from)?;
        let target = self.registry.get(&options.to)?;

        if !options.dry_run {
            target.test_connection().await?;
        }

        let assets = self.store.list_on_disk(&options.from, options.limit).await?;
        tracing::info!(
            from = %options.from,
            to = %options.to,
            assets = assets.len(),
            dry_run = options.dry_run,
            "Starting storage migration"
        );

        let mut report = MigrationReport {
            dry_run: options.dry_run,
            ..MigrationReport::default()
        };

        for mut asset in assets {
            let files = match collect_files(source.as_ref(), &asset).await {
                Ok(files) => files,
                Err(e) => {
                    tracing::warn!(asset_id = %asset.id, error = %e, "Failed to enumerate asset files");
                    report.failures.push(MigrationFailure {
                        asset_id: asset.id,
                        reason: format!("enumeration failed: {}", e),
                    });
                    continue;
                }
            };

            if files.is_empty() {
                tracing::debug!(asset_id = %asset.id, "Asset has no files, skipping");
                report.skipped += 1;
                continue;
            }

            if options.dry_run {
                report.migrated += 1;
                report.files_copied += files.len();
                continue;
            }

            match copy_files(source.as_ref(), target.as_ref(), &files).await {
                Ok(copied) => {
                    asset.relocate(&options.to);
                    match self.store.update(&asset).await {
                        Ok(()) => {
                            tracing::info!(
                                asset_id = %asset.id,
                                files = copied,
                                "Asset migrated"
                            );
                            report.migrated += 1;
                            report.files_copied += copied;
                        }
                        Err(e) => {
                            report.failures.push(MigrationFailure {
                                asset_id: asset.id,
                                reason: format!("record update failed after copy: {}", e),
                            });
                        }
                    }
                }
                Err(e) => {
                    tracing::warn!(asset_id = %asset.id, error = %e, "Asset migration failed");
                    report.failures.push(MigrationFailure {
                        asset_id: asset.id,
                        reason: e.to_string(),
                    });
                }
            }
        }

        tracing::info!(
            from = %options.from,
            to = %options.to,
            migrated = report.migrated,
            skipped = report.skipped,
            files_copied = report.files_copied,
            failures = report.failures.len(),
            dry_run = options.dry_run,
            "Storage migration finished"
        );
        Ok(report)
    }
}

/// Every file belonging to the asset: the union of the paths its record
/// references and whatever is stored under its prefix. The union covers
/// records that reference files outside the prefix as well as files (HLS
/// segments, renditions) the record does not track individually.
async fn collect_files(source: &dyn Disk, asset: &VideoAsset) -> Result<Vec<String>, StorageError> {
    let mut files: BTreeSet<String> = asset.file_references().into_iter().collect();
    for path in source.list(&paths::asset_prefix(asset.id)).await? {
        files.insert(path);
    }
    Ok(files.into_iter().collect())
}

async fn copy_files(
    source: &dyn Disk,
    target: &dyn Disk,
    files: &[String],
) -> Result<usize, StorageError> {
    let mut copied = 0;
    for path in files {
        let data = source.get(path).await?;
        target
            .put(path, data, paths::content_type_for(path))
            .await?;
        copied += 1;
    }
    Ok(copied)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_helpers::MemoryDisk;
    use bytes::Bytes;
    use vodpipe_core::MemoryAssetStore;

    async fn seed_asset_with_files(disk: &MemoryDisk) -> VideoAsset {
        let mut asset = VideoAsset::new_upload(disk.name(), "placeholder");
        asset.video_path = Some(paths::source_path(asset.id, "mp4"));
        asset.thumbnail_path = Some(paths::thumbnail_path(asset.id, 0));

        for path in [
            paths::source_path(asset.id, "mp4"),
            paths::thumbnail_path(asset.id, 0),
            // Untracked by the record, only discoverable by listing
            paths::hls_segment_path(asset.id, "240p", 0),
        ] {
            disk.put(&path, Bytes::from_static(b"data"), "application/octet-stream")
                .await
                .unwrap();
        }
        asset
    }

    fn options(from: &str, to: &str) -> MigrationOptions {
        MigrationOptions {
            from: from.to_string(),
            to: to.to_string(),
            limit: None,
            dry_run: false,
        }
    }

    async fn fixture() -> (Arc<MemoryDisk>, Arc<MemoryDisk>, Arc<DiskRegistry>) {
        let old_disk = Arc::new(MemoryDisk::new("old"));
        let new_disk = Arc::new(MemoryDisk::new("new"));
        let registry = Arc::new(
            DiskRegistry::with_disks(vec![old_disk.clone(), new_disk.clone()], "old").unwrap(),
        );
        (old_disk, new_disk, registry)
    }

    #[tokio::test]
    async fn test_migration_copies_files_and_repoints_asset() {
        let (old_disk, new_disk, registry) = fixture().await;
        let asset = seed_asset_with_files(&old_disk).await;
        let asset_id = asset.id;
        let store = Arc::new(MemoryAssetStore::new());
        store.insert(asset).await.unwrap();

        let migrator = Migrator::new(registry, store.clone());
        let report = migrator.run(&options("old", "new")).await.unwrap();

        assert!(report.is_success());
        assert_eq!(report.migrated, 1);
        assert_eq!(report.files_copied, 3);
        assert_eq!(new_disk.file_count(), 3);

        let migrated = store.get(asset_id).await.unwrap();
        assert_eq!(migrated.storage_disk.as_deref(), Some("new"));
        // Paths are disk-relative and unchanged
        assert_eq!(
            migrated.video_path,
            Some(paths::source_path(asset_id, "mp4"))
        );
    }

    #[tokio::test]
    async fn test_dry_run_writes_nothing() {
        let (old_disk, new_disk, registry) = fixture().await;
        let asset = seed_asset_with_files(&old_disk).await;
        let asset_id = asset.id;
        let store = Arc::new(MemoryAssetStore::new());
        store.insert(asset).await.unwrap();

        // An unavailable target must not matter: dry runs skip the
        // connection test and never write.
        new_disk.set_unavailable(true);

        let migrator = Migrator::new(registry, store.clone());
        let mut opts = options("old", "new");
        opts.dry_run = true;
        let report = migrator.run(&opts).await.unwrap();

        assert!(report.dry_run);
        assert_eq!(report.migrated, 1);
        assert_eq!(report.files_copied, 3);
        assert_eq!(new_disk.file_count(), 0);
        assert_eq!(
            store.get(asset_id).await.unwrap().storage_disk.as_deref(),
            Some("old")
        );
    }

    #[tokio::test]
    async fn test_failed_copy_leaves_asset_on_source() {
        let (old_disk, new_disk, registry) = fixture().await;
        let asset = seed_asset_with_files(&old_disk).await;
        let asset_id = asset.id;
        let store = Arc::new(MemoryAssetStore::new());
        store.insert(asset).await.unwrap();

        new_disk.fail_puts_containing("source.mp4");

        let migrator = Migrator::new(registry, store.clone());
        let report = migrator.run(&options("old", "new")).await.unwrap();

        assert_eq!(report.migrated, 0);
        assert_eq!(report.failures.len(), 1);
        assert_eq!(report.failures[0].asset_id, asset_id);
        assert_eq!(
            store.get(asset_id).await.unwrap().storage_disk.as_deref(),
            Some("old")
        );
    }

    #[tokio::test]
    async fn test_rerun_after_migration_selects_nothing() {
        let (old_disk, _new_disk, registry) = fixture().await;
        let asset = seed_asset_with_files(&old_disk).await;
        let store = Arc::new(MemoryAssetStore::new());
        store.insert(asset).await.unwrap();

        let migrator = Migrator::new(registry, store);
        let first = migrator.run(&options("old", "new")).await.unwrap();
        assert_eq!(first.migrated, 1);

        let second = migrator.run(&options("old", "new")).await.unwrap();
        assert_eq!(second.migrated, 0);
        assert_eq!(second.skipped, 0);
        assert!(second.is_success());
    }

    #[tokio::test]
    async fn test_asset_without_files_is_skipped() {
        let (old_disk, _new_disk, registry) = fixture().await;
        let mut asset = VideoAsset::new_upload(old_disk.name(), "placeholder");
        asset.video_path = None;
        let store = Arc::new(MemoryAssetStore::new());
        store.insert(asset).await.unwrap();

        let migrator = Migrator::new(registry, store);
        let report = migrator.run(&options("old", "new")).await.unwrap();

        assert_eq!(report.migrated, 0);
        assert_eq!(report.skipped, 1);
    }

    #[tokio::test]
    async fn test_unreachable_target_aborts_before_any_copy() {
        let (old_disk, new_disk, registry) = fixture().await;
        let asset = seed_asset_with_files(&old_disk).await;
        let store = Arc::new(MemoryAssetStore::new());
        store.insert(asset).await.unwrap();

        new_disk.set_unavailable(true);

        let migrator = Migrator::new(registry, store);
        let result = migrator.run(&options("old", "new")).await;

        assert!(matches!(
            result,
            Err(MigrateError::Storage(StorageError::Unavailable(_)))
        ));
    }

    #[tokio::test]
    async fn test_same_disk_is_rejected() {
        let (_old_disk, _new_disk, registry) = fixture().await;
        let migrator = Migrator::new(registry, Arc::new(MemoryAssetStore::new()));

        let result = migrator.run(&options("old", "old")).await;
        assert!(matches!(result, Err(MigrateError::SameDisk(_))));
    }

    #[tokio::test]
    async fn test_unknown_target_is_rejected() {
        let (_old_disk, _new_disk, registry) = fixture().await;
        let migrator = Migrator::new(registry, Arc::new(MemoryAssetStore::new()));

        let result = migrator.run(&options("old", "archive")).await;
        assert!(matches!(
            result,
            Err(MigrateError::Storage(StorageError::UnknownDisk(_)))
        ));
    }

    #[tokio::test]
    async fn test_limit_bounds_selection() {
        let (old_disk, _new_disk, registry) = fixture().await;
        let store = Arc::new(MemoryAssetStore::new());
        for _ in 0..3 {
            let asset = seed_asset_with_files(&old_disk).await;
            store.insert(asset).await.unwrap();
        }

        let migrator = Migrator::new(registry, store.clone());
        let mut opts = options("old", "new");
        opts.limit = Some(2);
        let report = migrator.run(&opts).await.unwrap();

        assert_eq!(report.migrated, 2);
        let remaining = store.list_on_disk("old", None).await.unwrap();
        assert_eq!(remaining.len(), 1);
    }
}
