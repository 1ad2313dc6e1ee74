//! Vodpipe Storage Library
//!
//! Storage abstraction and backends for the ingestion pipeline: the Disk
//! trait, local filesystem and S3-compatible implementations, the disk
//! registry, the shared path layout, source staging, and cross-disk
//! migration.
//!
//! # Storage path format
//!
//! Paths are `/`-separated keys relative to the disk root. Every file of one
//! asset lives under `videos/{asset_id}/`; see the `paths` module for the
//! full layout. Paths must not contain `..` segments or a leading `/`.

pub mod disk;
pub mod local;
pub mod migrate;
pub mod paths;
pub mod registry;
pub mod s3;
pub mod stage;
pub mod test_helpers;

// Re-export commonly used types
pub use disk::{Disk, StorageError, StorageResult};
pub use local::LocalDisk;
pub use migrate::{MigrateError, MigrationOptions, MigrationReport, Migrator};
pub use registry::DiskRegistry;
pub use s3::ObjectStoreDisk;
pub use stage::StagedSource;
