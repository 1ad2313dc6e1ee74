//! Configuration module
//!
//! All tunables are read once at startup into a `PipelineConfig`, which is
//! then passed into the storage registry, the orchestrators, and the job
//! queue at construction time. Nothing in the pipeline reads ambient
//! environment state after this point.

use std::env;

use crate::models::disk::{DiskKind, DiskSettings, DiskVisibility};

// Defaults
const HLS_SEGMENT_SECONDS: u32 = 10;
const THUMBNAIL_COUNT: u32 = 5;
const JOB_QUEUE_MAX_WORKERS: usize = 4;
const TRANSCODE_MAX_ATTEMPTS: u32 = 3;
const TRANSCODE_TIMEOUT_SECS: u64 = 3600;
const TRANSCODE_RETRY_BACKOFF_SECS: u64 = 30;
const ACQUIRE_MAX_ATTEMPTS: u32 = 2;
const ACQUIRE_TIMEOUT_SECS: u64 = 7200;
const ACQUIRE_RETRY_BACKOFF_SECS: u64 = 60;

/// Pipeline configuration
#[derive(Clone, Debug)]
pub struct PipelineConfig {
    pub disks: Vec<DiskSettings>,
    pub default_disk: String,
    // External tool paths
    pub ffmpeg_path: String,
    pub ffprobe_path: String,
    // Transcode output configuration
    pub hls_segment_seconds: u32,
    pub thumbnail_count: u32,
    pub quality_ladder: Vec<String>,
    // Job queue configuration
    pub max_workers: usize,
    pub transcode_max_attempts: u32,
    pub transcode_timeout_seconds: u64,
    pub transcode_retry_backoff_seconds: u64,
    pub acquire_max_attempts: u32,
    pub acquire_timeout_seconds: u64,
    pub acquire_retry_backoff_seconds: u64,
    // Provider API configuration (remote acquisition)
    pub provider_api_url: Option<String>,
    pub provider_api_key: Option<String>,
}

impl Default for PipelineConfig {
    fn default() -> Self {
        PipelineConfig {
            disks: Vec::new(),
            default_disk: "local".to_string(),
            ffmpeg_path: "ffmpeg".to_string(),
            ffprobe_path: "ffprobe".to_string(),
            hls_segment_seconds: HLS_SEGMENT_SECONDS,
            thumbnail_count: THUMBNAIL_COUNT,
            quality_ladder: vec![
                "240p".to_string(),
                "360p".to_string(),
                "480p".to_string(),
                "720p".to_string(),
                "1080p".to_string(),
            ],
            max_workers: JOB_QUEUE_MAX_WORKERS,
            transcode_max_attempts: TRANSCODE_MAX_ATTEMPTS,
            transcode_timeout_seconds: TRANSCODE_TIMEOUT_SECS,
            transcode_retry_backoff_seconds: TRANSCODE_RETRY_BACKOFF_SECS,
            acquire_max_attempts: ACQUIRE_MAX_ATTEMPTS,
            acquire_timeout_seconds: ACQUIRE_TIMEOUT_SECS,
            acquire_retry_backoff_seconds: ACQUIRE_RETRY_BACKOFF_SECS,
            provider_api_url: None,
            provider_api_key: None,
        }
    }
}

impl PipelineConfig {
    pub fn from_env() -> Result<Self, anyhow::Error> {
        dotenvy::dotenv().ok();

        let disk_names: Vec<String> = env::var("VODPIPE_DISKS")
            .unwrap_or_else(|_| "local".to_string())
            .split(',')
            .map(|s| s.trim().to_string())
            .filter(|s| !s.is_empty())
            .collect();

        let mut disks = Vec::with_capacity(disk_names.len());
        for name in &disk_names {
            disks.push(disk_settings_from_env(name)?);
        }

        let default_disk = env::var("DEFAULT_DISK")
            .ok()
            .or_else(|| disk_names.first().cloned())
            .unwrap_or_else(|| "local".to_string());

        let config = PipelineConfig {
            disks,
            default_disk,
            ffmpeg_path: env::var("FFMPEG_PATH").unwrap_or_else(|_| "ffmpeg".to_string()),
            ffprobe_path: env::var("FFPROBE_PATH").unwrap_or_else(|_| "ffprobe".to_string()),
            hls_segment_seconds: env::var("HLS_SEGMENT_SECONDS")
                .unwrap_or_else(|_| HLS_SEGMENT_SECONDS.to_string())
                .parse()
                .unwrap_or(HLS_SEGMENT_SECONDS),
            thumbnail_count: env::var("THUMBNAIL_COUNT")
                .unwrap_or_else(|_| THUMBNAIL_COUNT.to_string())
                .parse()
                .unwrap_or(THUMBNAIL_COUNT),
            quality_ladder: env::var("QUALITY_LADDER")
                .unwrap_or_else(|_| "240p,360p,480p,720p,1080p".to_string())
                .split(',')
                .map(|s| s.trim().to_string())
                .filter(|s| !s.is_empty())
                .collect(),
            max_workers: env::var("JOB_QUEUE_MAX_WORKERS")
                .unwrap_or_else(|_| JOB_QUEUE_MAX_WORKERS.to_string())
                .parse()
                .unwrap_or(JOB_QUEUE_MAX_WORKERS),
            transcode_max_attempts: env::var("TRANSCODE_MAX_ATTEMPTS")
                .unwrap_or_else(|_| TRANSCODE_MAX_ATTEMPTS.to_string())
                .parse()
                .unwrap_or(TRANSCODE_MAX_ATTEMPTS),
            transcode_timeout_seconds: env::var("TRANSCODE_TIMEOUT_SECONDS")
                .unwrap_or_else(|_| TRANSCODE_TIMEOUT_SECS.to_string())
                .parse()
                .unwrap_or(TRANSCODE_TIMEOUT_SECS),
            transcode_retry_backoff_seconds: env::var("TRANSCODE_RETRY_BACKOFF_SECONDS")
                .unwrap_or_else(|_| TRANSCODE_RETRY_BACKOFF_SECS.to_string())
                .parse()
                .unwrap_or(TRANSCODE_RETRY_BACKOFF_SECS),
            acquire_max_attempts: env::var("ACQUIRE_MAX_ATTEMPTS")
                .unwrap_or_else(|_| ACQUIRE_MAX_ATTEMPTS.to_string())
                .parse()
                .unwrap_or(ACQUIRE_MAX_ATTEMPTS),
            acquire_timeout_seconds: env::var("ACQUIRE_TIMEOUT_SECONDS")
                .unwrap_or_else(|_| ACQUIRE_TIMEOUT_SECS.to_string())
                .parse()
                .unwrap_or(ACQUIRE_TIMEOUT_SECS),
            acquire_retry_backoff_seconds: env::var("ACQUIRE_RETRY_BACKOFF_SECONDS")
                .unwrap_or_else(|_| ACQUIRE_RETRY_BACKOFF_SECS.to_string())
                .parse()
                .unwrap_or(ACQUIRE_RETRY_BACKOFF_SECS),
            provider_api_url: env::var("PROVIDER_API_URL").ok().filter(|s| !s.is_empty()),
            provider_api_key: env::var("PROVIDER_API_KEY").ok().filter(|s| !s.is_empty()),
        };

        config.validate()?;
        Ok(config)
    }

    pub fn validate(&self) -> Result<(), anyhow::Error> {
        if self.disks.is_empty() {
            return Err(anyhow::anyhow!(
                "VODPIPE_DISKS must name at least one disk"
            ));
        }
        for disk in &self.disks {
            disk.validate()?;
        }
        if !self.disks.iter().any(|d| d.name == self.default_disk) {
            return Err(anyhow::anyhow!(
                "DEFAULT_DISK '{}' is not among the configured disks",
                self.default_disk
            ));
        }
        if self.hls_segment_seconds == 0 {
            return Err(anyhow::anyhow!("HLS_SEGMENT_SECONDS must be at least 1"));
        }
        if self.thumbnail_count == 0 {
            return Err(anyhow::anyhow!("THUMBNAIL_COUNT must be at least 1"));
        }
        if self.quality_ladder.is_empty() {
            return Err(anyhow::anyhow!(
                "QUALITY_LADDER must name at least one rendition"
            ));
        }
        if self.transcode_max_attempts == 0 || self.acquire_max_attempts == 0 {
            return Err(anyhow::anyhow!("retry attempt counts must be at least 1"));
        }
        Ok(())
    }

    pub fn disk(&self, name: &str) -> Option<&DiskSettings> {
        self.disks.iter().find(|d| d.name == name)
    }
}

fn disk_settings_from_env(name: &str) -> Result<DiskSettings, anyhow::Error> {
    let prefix = format!("DISK_{}", name.to_uppercase());
    let var = |suffix: &str| env::var(format!("{}_{}", prefix, suffix)).ok();

    let kind = match var("KIND").unwrap_or_else(|| "local".to_string()).as_str() {
        "local" => DiskKind::Local,
        "s3" | "object_store" => DiskKind::ObjectStore,
        other => {
            return Err(anyhow::anyhow!(
                "{}_KIND '{}' is not a known disk kind (local, s3)",
                prefix,
                other
            ))
        }
    };

    let visibility = match var("VISIBILITY")
        .unwrap_or_else(|| "public".to_string())
        .as_str()
    {
        "public" => DiskVisibility::Public,
        "private" => DiskVisibility::Private,
        other => {
            return Err(anyhow::anyhow!(
                "{}_VISIBILITY '{}' is not a known visibility (public, private)",
                prefix,
                other
            ))
        }
    };

    Ok(DiskSettings {
        name: name.to_string(),
        kind,
        visibility,
        root: var("ROOT"),
        base_url: var("BASE_URL"),
        bucket: var("BUCKET"),
        region: var("REGION"),
        endpoint: var("ENDPOINT"),
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    fn test_config() -> PipelineConfig {
        PipelineConfig {
            disks: vec![DiskSettings::local(
                "local",
                "/var/media",
                "http://localhost:4000/media",
            )],
            default_disk: "local".to_string(),
            ffmpeg_path: "ffmpeg".to_string(),
            ffprobe_path: "ffprobe".to_string(),
            hls_segment_seconds: 10,
            thumbnail_count: 5,
            quality_ladder: vec!["240p".to_string(), "720p".to_string()],
            max_workers: 4,
            transcode_max_attempts: 3,
            transcode_timeout_seconds: 3600,
            transcode_retry_backoff_seconds: 30,
            acquire_max_attempts: 2,
            acquire_timeout_seconds: 7200,
            acquire_retry_backoff_seconds: 60,
            provider_api_url: None,
            provider_api_key: None,
        }
    }

    #[test]
    fn test_valid_config_passes() {
        assert!(test_config().validate().is_ok());
    }

    #[test]
    fn test_default_disk_must_be_configured() {
        let mut config = test_config();
        config.default_disk = "archive".to_string();
        let err = config.validate().unwrap_err();
        assert!(err.to_string().contains("DEFAULT_DISK"));
    }

    #[test]
    fn test_zero_segment_duration_rejected() {
        let mut config = test_config();
        config.hls_segment_seconds = 0;
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_empty_ladder_rejected() {
        let mut config = test_config();
        config.quality_ladder.clear();
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_disk_lookup_by_name() {
        let config = test_config();
        assert!(config.disk("local").is_some());
        assert!(config.disk("archive").is_none());
    }
}
