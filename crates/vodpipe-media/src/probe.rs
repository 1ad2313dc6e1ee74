//! Media inspection via ffprobe

use crate::error::{PipelineError, PipelineResult};
use async_trait::async_trait;
use serde::Serialize;
use std::path::Path;
use tokio::process::Command;

/// Structured stream metadata for a source file.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct SourceMetadata {
    /// Truncated to whole seconds.
    pub duration_seconds: u64,
    pub width: u32,
    pub height: u32,
    pub codec: String,
    pub framerate: Option<f32>,
}

/// Media inspection capability.
#[async_trait]
pub trait MediaProbe: Send + Sync {
    async fn probe(&self, path: &Path) -> PipelineResult<SourceMetadata>;
}

/// ffprobe-backed implementation.
pub struct FfprobeProbe {
    ffprobe_path: String,
}

impl FfprobeProbe {
    pub fn new(ffprobe_path: &str) -> Self {
        Self {
            ffprobe_path: ffprobe_path.to_string(),
        }
    }
}

#[async_trait]
impl MediaProbe for FfprobeProbe {
    #[tracing::instrument(skip(self, path), fields(ffmpeg.operation = "probe"))]
    async fn probe(&self, path: &Path) -> PipelineResult<SourceMetadata> {
        let start = std::time::Instant::now();

        if !path.try_exists()? {
            return Err(PipelineError::ProbeFailed(format!(
                "source file does not exist: {}",
                path.display()
            )));
        }

        let output = Command::new(&self.ffprobe_path)
            .args([
                "-v",
                "quiet",
                "-print_format",
                "json",
                "-show_format",
                "-show_streams",
                "-select_streams",
                "v:0",
            ])
            .arg(path)
            .kill_on_drop(true)
            .output()
            .await
            .map_err(|e| PipelineError::ProbeFailed(format!("failed to execute ffprobe: {}", e)))?;

        if !output.status.success() {
            return Err(PipelineError::ProbeFailed(format!(
                "ffprobe exited with {}: {}",
                output.status,
                String::from_utf8_lossy(&output.stderr)
            )));
        }

        let metadata = parse_probe_output(&output.stdout)?;

        tracing::info!(
            duration_ms = start.elapsed().as_secs_f64() * 1000.0,
            video_duration = metadata.duration_seconds,
            width = metadata.width,
            height = metadata.height,
            codec = %metadata.codec,
            "Video probe completed"
        );

        Ok(metadata)
    }
}

fn parse_probe_output(stdout: &[u8]) -> PipelineResult<SourceMetadata> {
    let probe_data: serde_json::Value = serde_json::from_slice(stdout)
        .map_err(|e| PipelineError::ProbeFailed(format!("unparseable ffprobe output: {}", e)))?;

    let stream = probe_data["streams"]
        .get(0)
        .ok_or(PipelineError::NoVideoStream)?;

    let duration = probe_data["format"]["duration"]
        .as_str()
        .and_then(|d| d.parse::<f64>().ok())
        .ok_or_else(|| PipelineError::ProbeFailed("could not parse duration".to_string()))?;

    let width = stream["width"]
        .as_u64()
        .ok_or_else(|| PipelineError::ProbeFailed("could not parse width".to_string()))?
        as u32;

    let height = stream["height"]
        .as_u64()
        .ok_or_else(|| PipelineError::ProbeFailed("could not parse height".to_string()))?
        as u32;

    let codec = stream["codec_name"]
        .as_str()
        .unwrap_or("unknown")
        .to_string();

    let framerate = stream["r_frame_rate"].as_str().and_then(|r| {
        let parts: Vec<&str> = r.split('/').collect();
        if parts.len() == 2 {
            let num: f32 = parts[0].parse().ok()?;
            let den: f32 = parts[1].parse().ok()?;
            if den != 0.0 {
                Some(num / den)
            } else {
                None
            }
        } else {
            None
        }
    });

    Ok(SourceMetadata {
        duration_seconds: duration as u64,
        width,
        height,
        codec,
        framerate,
    })
}
