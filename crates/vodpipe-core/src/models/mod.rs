pub mod asset;
pub mod disk;
pub mod job;

pub use asset::{AssetStatus, EmbeddedSource, SourceKind, VideoAsset};
pub use disk::{DiskKind, DiskSettings, DiskVisibility};
pub use job::{Job, JobKind};
