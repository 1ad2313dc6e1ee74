//! Vodpipe Core Library
//!
//! This crate provides the shared domain models, configuration, event hooks,
//! and the asset persistence seam used by every other vodpipe component.

pub mod config;
pub mod events;
pub mod job_error;
pub mod models;
pub mod store;

// Re-export commonly used types
pub use config::PipelineConfig;
pub use events::{EventSink, NoopEventSink, RecordingEventSink};
pub use job_error::{JobError, JobResultExt};
pub use models::asset::{AssetStatus, EmbeddedSource, SourceKind, VideoAsset};
pub use models::disk::{DiskKind, DiskSettings, DiskVisibility};
pub use models::job::{Job, JobKind};
pub use store::{AssetStore, MemoryAssetStore, StoreError, StoreResult};
