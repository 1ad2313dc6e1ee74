//! Vodpipe Media Processing Library
//!
//! This crate runs the video pipeline: probing sources with ffprobe,
//! transcoding the quality ladder with ffmpeg, packaging HLS, producing
//! thumbnails and scrubber tracks, and acquiring provider-hosted videos.

pub mod acquire;
pub mod error;
pub mod ffmpeg;
pub mod ladder;
pub mod manifest;
pub mod probe;
pub mod provider;
pub mod thumbs;
pub mod transcode;

pub mod test_helpers;

// Re-export commonly used types
pub use acquire::AcquisitionOrchestrator;
pub use error::{PipelineError, PipelineResult};
pub use ffmpeg::{FfmpegTranscoder, Transcoder};
pub use ladder::{eligible_rungs, QualityRung, QUALITY_LADDER};
pub use probe::{FfprobeProbe, MediaProbe, SourceMetadata};
pub use provider::{HttpProviderClient, ProviderClient, ProviderVideoInfo};
pub use transcode::{TranscodeOrchestrator, TranscodeSettings};
