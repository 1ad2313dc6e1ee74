//! Transcoder capability backed by ffmpeg
//!
//! All invocations pass arguments as a vector to the process API; nothing is
//! ever interpolated into a shell string.

use crate::error::{PipelineError, PipelineResult};
use crate::ladder::QualityRung;
use async_trait::async_trait;
use std::path::Path;
use std::process::Stdio;
use std::time::Instant;
use tokio::process::Command;

/// Transcoder capability.
#[async_trait]
pub trait Transcoder: Send + Sync {
    /// Encode the source into one rendition at the given output path,
    /// overwriting any previous output.
    async fn encode_rendition(
        &self,
        input: &Path,
        rung: QualityRung,
        output: &Path,
    ) -> PipelineResult<()>;

    /// Segment an encoded rendition for HLS delivery: `segment_%03d.ts`
    /// files plus an `index.m3u8` sub-manifest, all under `output_dir`.
    async fn package_hls(
        &self,
        rendition: &Path,
        output_dir: &Path,
        segment_seconds: u32,
    ) -> PipelineResult<()>;

    /// Extract a single frame as a JPEG at the given timestamp.
    async fn extract_frame(
        &self,
        input: &Path,
        timestamp_seconds: u64,
        output: &Path,
    ) -> PipelineResult<()>;
}

pub struct FfmpegTranscoder {
    ffmpeg_path: String,
}

impl FfmpegTranscoder {
    pub fn new(ffmpeg_path: &str) -> Self {
        Self {
            ffmpeg_path: ffmpeg_path.to_string(),
        }
    }

    async fn run_ffmpeg(&self, args: &[String], operation: &str) -> PipelineResult<()> {
        let output = Command::new(&self.ffmpeg_path)
            .args(args)
            .stdout(Stdio::null())
            .stderr(Stdio::piped())
            .kill_on_drop(true)
            .output()
            .await
            .map_err(|e| {
                PipelineError::EncodeFailed(format!(
                    "failed to execute ffmpeg for {}: {}",
                    operation, e
                ))
            })?;

        if !output.status.success() {
            let stderr = String::from_utf8_lossy(&output.stderr);
            return Err(PipelineError::EncodeFailed(format!(
                "{} failed: {}",
                operation, stderr
            )));
        }
        Ok(())
    }
}

fn rendition_args(input: &Path, rung: QualityRung, output: &Path) -> Vec<String> {
    vec![
        "-y".to_string(),
        "-i".to_string(),
        input.to_string_lossy().to_string(),
        "-c:v".to_string(),
        "libx264".to_string(),
        "-preset".to_string(),
        "fast".to_string(),
        "-profile:v".to_string(),
        "main".to_string(),
        "-vf".to_string(),
        format!("scale={}:{}", rung.width, rung.height),
        "-b:v".to_string(),
        format!("{}k", rung.video_bitrate_kbps),
        "-maxrate".to_string(),
        format!("{}k", (rung.video_bitrate_kbps as f32 * 1.2) as u32),
        "-bufsize".to_string(),
        format!("{}k", rung.video_bitrate_kbps * 2),
        "-c:a".to_string(),
        "aac".to_string(),
        "-b:a".to_string(),
        "128k".to_string(),
        "-ac".to_string(),
        "2".to_string(),
        "-ar".to_string(),
        "48000".to_string(),
        "-movflags".to_string(),
        "+faststart".to_string(),
        output.to_string_lossy().to_string(),
    ]
}

fn hls_args(rendition: &Path, output_dir: &Path, segment_seconds: u32) -> Vec<String> {
    let playlist = output_dir.join("index.m3u8");
    let segment_pattern = output_dir.join("segment_%03d.ts");
    vec![
        "-y".to_string(),
        "-i".to_string(),
        rendition.to_string_lossy().to_string(),
        // The rendition is already encoded at target quality; repackage only
        "-c".to_string(),
        "copy".to_string(),
        "-f".to_string(),
        "hls".to_string(),
        "-hls_time".to_string(),
        segment_seconds.to_string(),
        "-hls_playlist_type".to_string(),
        "vod".to_string(),
        "-hls_segment_filename".to_string(),
        segment_pattern.to_string_lossy().to_string(),
        playlist.to_string_lossy().to_string(),
    ]
}

fn frame_args(input: &Path, timestamp_seconds: u64, output: &Path) -> Vec<String> {
    vec![
        "-y".to_string(),
        "-ss".to_string(),
        timestamp_seconds.to_string(),
        "-i".to_string(),
        input.to_string_lossy().to_string(),
        "-frames:v".to_string(),
        "1".to_string(),
        "-q:v".to_string(),
        "2".to_string(),
        output.to_string_lossy().to_string(),
    ]
}

#[async_trait]
impl Transcoder for FfmpegTranscoder {
    #[tracing::instrument(skip(self, input, output), fields(rendition = %rung.label))]
    async fn encode_rendition(
        &self,
        input: &Path,
        rung: QualityRung,
        output: &Path,
    ) -> PipelineResult<()> {
        let start = Instant::now();
        let args = rendition_args(input, rung, output);
        self.run_ffmpeg(&args, &format!("{} encode", rung.label))
            .await?;

        if !output.try_exists()? {
            return Err(PipelineError::EncodeFailed(format!(
                "{} encode produced no output file",
                rung.label
            )));
        }

        tracing::info!(
            rendition = %rung.label,
            duration_ms = start.elapsed().as_secs_f64() * 1000.0,
            "Rendition encoded"
        );
        Ok(())
    }

    async fn package_hls(
        &self,
        rendition: &Path,
        output_dir: &Path,
        segment_seconds: u32,
    ) -> PipelineResult<()> {
        tokio::fs::create_dir_all(output_dir).await?;
        let args = hls_args(rendition, output_dir, segment_seconds);
        self.run_ffmpeg(&args, "HLS packaging").await?;

        if !output_dir.join("index.m3u8").try_exists()? {
            return Err(PipelineError::EncodeFailed(
                "HLS packaging produced no sub-manifest".to_string(),
            ));
        }
        Ok(())
    }

    async fn extract_frame(
        &self,
        input: &Path,
        timestamp_seconds: u64,
        output: &Path,
    ) -> PipelineResult<()> {
        let args = frame_args(input, timestamp_seconds, output);
        self.run_ffmpeg(&args, "frame extraction").await?;

        if !output.try_exists()? {
            return Err(PipelineError::EncodeFailed(
                "frame extraction produced no output file".to_string(),
            ));
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ladder::QUALITY_LADDER;
    use std::path::PathBuf;

    #[test]
    fn test_rendition_args_carry_rung_parameters() {
        let rung = QUALITY_LADDER[3]; // 720p
        let args = rendition_args(
            &PathBuf::from("/tmp/in.mp4"),
            rung,
            &PathBuf::from("/tmp/out/720p.mp4"),
        );

        assert!(args.contains(&"scale=1280:720".to_string()));
        assert!(args.contains(&"2800k".to_string()));
        assert!(args.contains(&"3360k".to_string())); // maxrate 1.2x
        assert!(args.contains(&"5600k".to_string())); // bufsize 2x
        assert!(args.contains(&"+faststart".to_string()));
        assert_eq!(args.last().unwrap(), "/tmp/out/720p.mp4");
    }

    #[test]
    fn test_rendition_args_overwrite_previous_output() {
        let args = rendition_args(
            &PathBuf::from("in.mp4"),
            QUALITY_LADDER[0],
            &PathBuf::from("out.mp4"),
        );
        assert_eq!(args[0], "-y");
    }

    #[test]
    fn test_hls_args_copy_streams_without_reencoding() {
        let args = hls_args(&PathBuf::from("720p.mp4"), &PathBuf::from("/tmp/hls/720p"), 10);

        let c_pos = args.iter().position(|a| a == "-c").unwrap();
        assert_eq!(args[c_pos + 1], "copy");
        assert!(args.contains(&"10".to_string()));
        assert!(args.contains(&"vod".to_string()));
        assert!(args.iter().any(|a| a.ends_with("segment_%03d.ts")));
        assert!(args.last().unwrap().ends_with("index.m3u8"));
    }

    #[test]
    fn test_frame_args_seek_before_input() {
        let args = frame_args(&PathBuf::from("in.mp4"), 42, &PathBuf::from("thumb.jpg"));

        let ss_pos = args.iter().position(|a| a == "-ss").unwrap();
        let i_pos = args.iter().position(|a| a == "-i").unwrap();
        assert!(ss_pos < i_pos);
        assert_eq!(args[ss_pos + 1], "42");
        assert!(args.contains(&"-frames:v".to_string()));
    }
}
