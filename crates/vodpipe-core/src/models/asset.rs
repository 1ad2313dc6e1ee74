use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt::{Display, Formatter, Result as FmtResult};
use std::str::FromStr;
use uuid::Uuid;

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash)]
#[serde(rename_all = "snake_case")]
pub enum AssetStatus {
    Pending,
    PendingDownload,
    Downloading,
    DownloadFailed,
    Processing,
    Processed,
    Failed,
}

impl Display for AssetStatus {
    fn fmt(&self, f: &mut Formatter<'_>) -> FmtResult {
        match self {
            AssetStatus::Pending => write!(f, "pending"),
            AssetStatus::PendingDownload => write!(f, "pending_download"),
            AssetStatus::Downloading => write!(f, "downloading"),
            AssetStatus::DownloadFailed => write!(f, "download_failed"),
            AssetStatus::Processing => write!(f, "processing"),
            AssetStatus::Processed => write!(f, "processed"),
            AssetStatus::Failed => write!(f, "failed"),
        }
    }
}

impl FromStr for AssetStatus {
    type Err = anyhow::Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "pending" => Ok(AssetStatus::Pending),
            "pending_download" => Ok(AssetStatus::PendingDownload),
            "downloading" => Ok(AssetStatus::Downloading),
            "download_failed" => Ok(AssetStatus::DownloadFailed),
            "processing" => Ok(AssetStatus::Processing),
            "processed" => Ok(AssetStatus::Processed),
            "failed" => Ok(AssetStatus::Failed),
            _ => Err(anyhow::anyhow!("Invalid asset status: {}", s)),
        }
    }
}

/// Where an embedded video lives until it is acquired.
///
/// Cleared wholesale when acquisition flips the asset to a native source;
/// the provider name survives only in the acquisition log line.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Default)]
pub struct EmbeddedSource {
    pub provider_name: String,
    pub provider_video_id: Option<String>,
    pub watch_url: Option<String>,
    pub embed_url: Option<String>,
    pub thumbnail_url: Option<String>,
    pub preview_url: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum SourceKind {
    Native,
    Embedded(EmbeddedSource),
}

/// The unit of work for the whole pipeline.
///
/// File reference fields hold disk-relative paths. Resolving them to real
/// locations requires the disk named in `storage_disk`, which only the storage
/// layer knows how to interpret.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct VideoAsset {
    pub id: Uuid,
    pub source: SourceKind,
    pub status: AssetStatus,
    pub storage_disk: Option<String>,
    pub video_path: Option<String>,
    pub thumbnail_path: Option<String>,
    pub preview_path: Option<String>,
    pub scrubber_track_path: Option<String>,
    pub duration_seconds: Option<u64>,
    pub available_qualities: Vec<String>,
    pub file_size_bytes: Option<u64>,
    pub processing_started_at: Option<DateTime<Utc>>,
    pub processing_completed_at: Option<DateTime<Utc>>,
    pub failure_reason: Option<String>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl VideoAsset {
    /// A freshly uploaded native video, ready for transcoding.
    pub fn new_upload(disk: &str, video_path: &str) -> Self {
        let now = Utc::now();
        VideoAsset {
            id: Uuid::new_v4(),
            source: SourceKind::Native,
            status: AssetStatus::Pending,
            storage_disk: Some(disk.to_string()),
            video_path: Some(video_path.to_string()),
            thumbnail_path: None,
            preview_path: None,
            scrubber_track_path: None,
            duration_seconds: None,
            available_qualities: Vec::new(),
            file_size_bytes: None,
            processing_started_at: None,
            processing_completed_at: None,
            failure_reason: None,
            created_at: now,
            updated_at: now,
        }
    }

    /// A video hosted by a third-party provider, pending acquisition.
    pub fn new_embedded(embedded: EmbeddedSource) -> Self {
        let now = Utc::now();
        VideoAsset {
            id: Uuid::new_v4(),
            source: SourceKind::Embedded(embedded),
            status: AssetStatus::PendingDownload,
            storage_disk: None,
            video_path: None,
            thumbnail_path: None,
            preview_path: None,
            scrubber_track_path: None,
            duration_seconds: None,
            available_qualities: Vec::new(),
            file_size_bytes: None,
            processing_started_at: None,
            processing_completed_at: None,
            failure_reason: None,
            created_at: now,
            updated_at: now,
        }
    }

    pub fn is_embedded(&self) -> bool {
        matches!(self.source, SourceKind::Embedded(_))
    }

    pub fn embedded(&self) -> Option<&EmbeddedSource> {
        match &self.source {
            SourceKind::Embedded(e) => Some(e),
            SourceKind::Native => None,
        }
    }

    pub fn provider_video_id(&self) -> Option<&str> {
        self.embedded()
            .and_then(|e| e.provider_video_id.as_deref())
    }

    /// All file references currently set, in a stable order.
    pub fn file_references(&self) -> Vec<String> {
        [
            &self.video_path,
            &self.thumbnail_path,
            &self.preview_path,
            &self.scrubber_track_path,
        ]
        .into_iter()
        .flatten()
        .cloned()
        .collect()
    }

    pub fn begin_processing(&mut self) {
        self.status = AssetStatus::Processing;
        self.processing_started_at = Some(Utc::now());
        self.failure_reason = None;
        self.touch();
    }

    pub fn complete_processing(&mut self, qualities: Vec<String>) {
        self.status = AssetStatus::Processed;
        self.processing_completed_at = Some(Utc::now());
        self.available_qualities = qualities;
        self.failure_reason = None;
        self.touch();
    }

    pub fn fail_processing(&mut self, reason: &str) {
        self.status = AssetStatus::Failed;
        self.failure_reason = Some(reason.to_string());
        self.touch();
    }

    pub fn begin_download(&mut self) {
        self.status = AssetStatus::Downloading;
        self.failure_reason = None;
        self.touch();
    }

    pub fn fail_download(&mut self, reason: &str) {
        self.status = AssetStatus::DownloadFailed;
        self.failure_reason = Some(reason.to_string());
        self.touch();
    }

    /// Flip an embedded asset to native custody after a successful download.
    ///
    /// Clears every embedded field except the provider name, points the file
    /// references at the downloaded artifacts, and marks the asset Processed
    /// with the single "original" quality. A later transcode run may replace
    /// that quality set with a full ladder.
    pub fn complete_acquisition(
        &mut self,
        disk: &str,
        video_path: String,
        thumbnail_path: Option<String>,
        preview_path: Option<String>,
        file_size_bytes: u64,
    ) {
        let provider_name = self
            .embedded()
            .map(|e| e.provider_name.clone())
            .unwrap_or_default();
        self.source = SourceKind::Native;
        self.status = AssetStatus::Processed;
        self.storage_disk = Some(disk.to_string());
        self.video_path = Some(video_path);
        self.thumbnail_path = thumbnail_path;
        self.preview_path = preview_path;
        self.file_size_bytes = Some(file_size_bytes);
        self.available_qualities = vec!["original".to_string()];
        self.processing_completed_at = Some(Utc::now());
        self.failure_reason = None;
        self.touch();
        tracing::debug!(asset_id = %self.id, provider = %provider_name, "asset acquired from provider");
    }

    /// Point the asset at a different storage disk. File paths are
    /// disk-relative and unchanged by relocation.
    pub fn relocate(&mut self, disk: &str) {
        self.storage_disk = Some(disk.to_string());
        self.touch();
    }

    fn touch(&mut self) {
        self.updated_at = Utc::now();
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn embedded_source(video_id: Option<&str>) -> EmbeddedSource {
        EmbeddedSource {
            provider_name: "exampletube".to_string(),
            provider_video_id: video_id.map(|s| s.to_string()),
            watch_url: Some("https://exampletube.test/watch/abc".to_string()),
            embed_url: Some("https://exampletube.test/embed/abc".to_string()),
            thumbnail_url: Some("https://cdn.exampletube.test/abc.jpg".to_string()),
            preview_url: Some("https://cdn.exampletube.test/abc.webp".to_string()),
        }
    }

    #[test]
    fn test_status_display() {
        assert_eq!(AssetStatus::Pending.to_string(), "pending");
        assert_eq!(AssetStatus::PendingDownload.to_string(), "pending_download");
        assert_eq!(AssetStatus::Downloading.to_string(), "downloading");
        assert_eq!(AssetStatus::DownloadFailed.to_string(), "download_failed");
        assert_eq!(AssetStatus::Processing.to_string(), "processing");
        assert_eq!(AssetStatus::Processed.to_string(), "processed");
        assert_eq!(AssetStatus::Failed.to_string(), "failed");
    }

    #[test]
    fn test_status_from_str() {
        assert_eq!(
            "pending_download".parse::<AssetStatus>().unwrap(),
            AssetStatus::PendingDownload
        );
        assert_eq!(
            "processed".parse::<AssetStatus>().unwrap(),
            AssetStatus::Processed
        );
        assert!("uploading".parse::<AssetStatus>().is_err());
    }

    #[test]
    fn test_status_serde_round_trip() {
        let json = serde_json::to_string(&AssetStatus::DownloadFailed).unwrap();
        assert_eq!(json, "\"download_failed\"");
        let back: AssetStatus = serde_json::from_str(&json).unwrap();
        assert_eq!(back, AssetStatus::DownloadFailed);
    }

    #[test]
    fn test_new_upload_starts_pending_with_disk_set() {
        let asset = VideoAsset::new_upload("local", "videos/abc/source.mp4");
        assert_eq!(asset.status, AssetStatus::Pending);
        assert_eq!(asset.storage_disk.as_deref(), Some("local"));
        assert_eq!(asset.video_path.as_deref(), Some("videos/abc/source.mp4"));
        assert!(asset.available_qualities.is_empty());
        assert!(asset.duration_seconds.is_none());
        assert!(!asset.is_embedded());
    }

    #[test]
    fn test_new_embedded_starts_pending_download() {
        let asset = VideoAsset::new_embedded(embedded_source(Some("abc")));
        assert_eq!(asset.status, AssetStatus::PendingDownload);
        assert!(asset.is_embedded());
        assert_eq!(asset.provider_video_id(), Some("abc"));
        assert!(asset.storage_disk.is_none());
        assert!(asset.video_path.is_none());
    }

    #[test]
    fn test_processing_transitions_stamp_timestamps() {
        let mut asset = VideoAsset::new_upload("local", "videos/abc/source.mp4");
        asset.begin_processing();
        assert_eq!(asset.status, AssetStatus::Processing);
        assert!(asset.processing_started_at.is_some());
        assert!(asset.processing_completed_at.is_none());

        asset.complete_processing(vec!["240p".to_string(), "360p".to_string()]);
        assert_eq!(asset.status, AssetStatus::Processed);
        assert!(asset.processing_completed_at.is_some());
        assert_eq!(asset.available_qualities, vec!["240p", "360p"]);
        assert!(asset.failure_reason.is_none());
    }

    #[test]
    fn test_fail_processing_records_reason() {
        let mut asset = VideoAsset::new_upload("local", "videos/abc/source.mp4");
        asset.begin_processing();
        asset.fail_processing("probe failed: no such file");
        assert_eq!(asset.status, AssetStatus::Failed);
        assert_eq!(
            asset.failure_reason.as_deref(),
            Some("probe failed: no such file")
        );
        // Partial progress survives for the next attempt.
        assert!(asset.processing_started_at.is_some());
    }

    #[test]
    fn test_retry_clears_previous_failure_reason() {
        let mut asset = VideoAsset::new_upload("local", "videos/abc/source.mp4");
        asset.begin_processing();
        asset.fail_processing("encode failed");
        asset.begin_processing();
        assert_eq!(asset.status, AssetStatus::Processing);
        assert!(asset.failure_reason.is_none());
    }

    #[test]
    fn test_download_failure_keeps_embedded_source() {
        let mut asset = VideoAsset::new_embedded(embedded_source(Some("abc")));
        asset.begin_download();
        assert_eq!(asset.status, AssetStatus::Downloading);
        asset.fail_download("original and fallback downloads failed");
        assert_eq!(asset.status, AssetStatus::DownloadFailed);
        assert!(asset.is_embedded());
        assert!(asset.failure_reason.is_some());
    }

    #[test]
    fn test_complete_acquisition_flips_to_native() {
        let mut asset = VideoAsset::new_embedded(embedded_source(Some("abc")));
        let id = asset.id;
        asset.begin_download();
        asset.complete_acquisition(
            "local",
            format!("videos/{}/source.mp4", id),
            Some(format!("videos/{}/thumbs/thumb_000.jpg", id)),
            None,
            42_000_000,
        );

        assert_eq!(asset.status, AssetStatus::Processed);
        assert_eq!(asset.source, SourceKind::Native);
        assert_eq!(asset.storage_disk.as_deref(), Some("local"));
        assert_eq!(asset.available_qualities, vec!["original"]);
        assert_eq!(asset.file_size_bytes, Some(42_000_000));
        assert!(asset.video_path.is_some());
        assert!(asset.preview_path.is_none());
        assert!(asset.processing_completed_at.is_some());
    }

    #[test]
    fn test_file_references_skips_absent_fields() {
        let mut asset = VideoAsset::new_upload("local", "videos/abc/source.mp4");
        asset.thumbnail_path = Some("videos/abc/thumbs/thumb_000.jpg".to_string());
        let refs = asset.file_references();
        assert_eq!(
            refs,
            vec![
                "videos/abc/source.mp4".to_string(),
                "videos/abc/thumbs/thumb_000.jpg".to_string(),
            ]
        );
    }

    #[test]
    fn test_source_kind_serde_tagging() {
        let native = serde_json::to_value(SourceKind::Native).unwrap();
        assert_eq!(native["kind"], "native");

        let embedded = serde_json::to_value(SourceKind::Embedded(embedded_source(Some("abc"))))
            .unwrap();
        assert_eq!(embedded["kind"], "embedded");
        assert_eq!(embedded["provider_name"], "exampletube");
        assert_eq!(embedded["provider_video_id"], "abc");
    }
}
