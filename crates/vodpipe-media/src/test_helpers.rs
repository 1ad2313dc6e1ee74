//! Test helpers: fake probe, transcoder, and provider client
//!
//! Deterministic stand-ins for the external capabilities, so pipeline tests
//! run without ffmpeg binaries or network access. The fake transcoder writes
//! real placeholder files so upload paths are exercised end to end.

use crate::error::{PipelineError, PipelineResult};
use crate::ladder::QualityRung;
use crate::probe::{MediaProbe, SourceMetadata};
use crate::provider::{ProviderClient, ProviderVideoInfo};
use async_trait::async_trait;
use bytes::Bytes;
use std::collections::HashMap;
use std::path::Path;
use std::sync::Mutex;

/// Metadata for a synthetic 16:9 source of the given height.
pub fn source_metadata(height: u32, duration_seconds: u64) -> SourceMetadata {
    SourceMetadata {
        duration_seconds,
        width: height * 16 / 9,
        height,
        codec: "h264".to_string(),
        framerate: Some(30.0),
    }
}

enum ProbeMode {
    Metadata(SourceMetadata),
    Unreadable,
    NoVideoStream,
}

/// MediaProbe returning a fixed response.
pub struct FakeProbe {
    mode: ProbeMode,
}

impl FakeProbe {
    pub fn returning(metadata: SourceMetadata) -> Self {
        Self {
            mode: ProbeMode::Metadata(metadata),
        }
    }

    pub fn unreadable() -> Self {
        Self {
            mode: ProbeMode::Unreadable,
        }
    }

    pub fn no_video_stream() -> Self {
        Self {
            mode: ProbeMode::NoVideoStream,
        }
    }
}

#[async_trait]
impl MediaProbe for FakeProbe {
    async fn probe(&self, _path: &Path) -> PipelineResult<SourceMetadata> {
        match &self.mode {
            ProbeMode::Metadata(metadata) => Ok(metadata.clone()),
            ProbeMode::Unreadable => Err(PipelineError::ProbeFailed(
                "injected probe failure".to_string(),
            )),
            ProbeMode::NoVideoStream => Err(PipelineError::NoVideoStream),
        }
    }
}

/// Transcoder that writes placeholder output files instead of encoding.
#[derive(Default)]
pub struct FakeTranscoder {
    encoded: Mutex<Vec<String>>,
    frame_timestamps: Mutex<Vec<u64>>,
    fail_on_label: Mutex<Option<String>>,
}

impl FakeTranscoder {
    pub fn new() -> Self {
        Self::default()
    }

    /// Fail the encode of one specific rung.
    pub fn fail_on(&self, label: &str) {
        *self.fail_on_label.lock().unwrap() = Some(label.to_string());
    }

    /// Labels encoded so far, in order.
    pub fn encoded_labels(&self) -> Vec<String> {
        self.encoded.lock().unwrap().clone()
    }

    /// Timestamps frames were extracted at, in order.
    pub fn frame_timestamps(&self) -> Vec<u64> {
        self.frame_timestamps.lock().unwrap().clone()
    }
}

#[async_trait]
impl crate::ffmpeg::Transcoder for FakeTranscoder {
    async fn encode_rendition(
        &self,
        _input: &Path,
        rung: QualityRung,
        output: &Path,
    ) -> PipelineResult<()> {
        if self.fail_on_label.lock().unwrap().as_deref() == Some(rung.label) {
            return Err(PipelineError::EncodeFailed(format!(
                "injected encode failure for {}",
                rung.label
            )));
        }
        tokio::fs::write(output, format!("encoded {}", rung.label)).await?;
        self.encoded.lock().unwrap().push(rung.label.to_string());
        Ok(())
    }

    async fn package_hls(
        &self,
        _rendition: &Path,
        output_dir: &Path,
        _segment_seconds: u32,
    ) -> PipelineResult<()> {
        tokio::fs::create_dir_all(output_dir).await?;
        tokio::fs::write(output_dir.join("index.m3u8"), "#EXTM3U\n").await?;
        tokio::fs::write(output_dir.join("segment_000.ts"), "segment").await?;
        tokio::fs::write(output_dir.join("segment_001.ts"), "segment").await?;
        Ok(())
    }

    async fn extract_frame(
        &self,
        _input: &Path,
        timestamp_seconds: u64,
        output: &Path,
    ) -> PipelineResult<()> {
        tokio::fs::write(output, "jpeg").await?;
        self.frame_timestamps.lock().unwrap().push(timestamp_seconds);
        Ok(())
    }
}

/// ProviderClient serving canned metadata and files from memory.
pub struct FakeProviderClient {
    info: Option<ProviderVideoInfo>,
    files: Mutex<HashMap<String, Bytes>>,
    requested: Mutex<Vec<String>>,
}

impl FakeProviderClient {
    pub fn new(info: ProviderVideoInfo) -> Self {
        Self {
            info: Some(info),
            files: Mutex::new(HashMap::new()),
            requested: Mutex::new(Vec::new()),
        }
    }

    /// Client whose metadata endpoint is down.
    pub fn unreachable() -> Self {
        Self {
            info: None,
            files: Mutex::new(HashMap::new()),
            requested: Mutex::new(Vec::new()),
        }
    }

    /// Make a URL downloadable.
    pub fn serve(&self, url: &str, data: &[u8]) {
        self.files
            .lock()
            .unwrap()
            .insert(url.to_string(), Bytes::copy_from_slice(data));
    }

    /// URLs passed to download, in order (including failed attempts).
    pub fn requested_urls(&self) -> Vec<String> {
        self.requested.lock().unwrap().clone()
    }
}

#[async_trait]
impl ProviderClient for FakeProviderClient {
    async fn video_info(&self, provider_video_id: &str) -> PipelineResult<ProviderVideoInfo> {
        match &self.info {
            Some(info) => Ok(info.clone()),
            None => Err(PipelineError::Provider(format!(
                "metadata request for '{}' timed out",
                provider_video_id
            ))),
        }
    }

    async fn download(&self, url: &str) -> PipelineResult<Bytes> {
        self.requested.lock().unwrap().push(url.to_string());
        self.files
            .lock()
            .unwrap()
            .get(url)
            .cloned()
            .ok_or_else(|| PipelineError::Provider(format!("download of '{}' returned 404", url)))
    }
}
