//! Job handler seam between the queue and the pipeline orchestrators.
//!
//! The queue calls `run` for each attempt. A timed-out attempt is dropped at
//! its deadline and never records anything, so the queue calls `on_timeout`
//! to let the handler stamp the failure on the asset.

use async_trait::async_trait;
use std::sync::Arc;
use uuid::Uuid;
use vodpipe_core::{AssetStore, JobError};
use vodpipe_media::{AcquisitionOrchestrator, TranscodeOrchestrator};

/// Execution seam for one job kind.
#[async_trait]
pub trait JobHandler: Send + Sync {
    /// Run one attempt to completion.
    async fn run(&self, asset_id: Uuid) -> Result<(), JobError>;

    /// Record the failure of an attempt that was dropped at its deadline.
    async fn on_timeout(&self, asset_id: Uuid);
}

/// Runs the transcode pipeline for claimed assets.
pub struct TranscodeJobHandler {
    orchestrator: TranscodeOrchestrator,
    store: Arc<dyn AssetStore>,
}

impl TranscodeJobHandler {
    pub fn new(orchestrator: TranscodeOrchestrator, store: Arc<dyn AssetStore>) -> Self {
        Self {
            orchestrator,
            store,
        }
    }
}

#[async_trait]
impl JobHandler for TranscodeJobHandler {
    async fn run(&self, asset_id: Uuid) -> Result<(), JobError> {
        self.orchestrator.run(asset_id).await.map_err(JobError::from)
    }

    async fn on_timeout(&self, asset_id: Uuid) {
        let mut asset = match self.store.get(asset_id).await {
            Ok(asset) => asset,
            Err(e) => {
                tracing::error!(asset_id = %asset_id, error = %e, "Cannot record processing timeout");
                return;
            }
        };
        asset.fail_processing("processing timed out");
        if let Err(e) = self.store.update(&asset).await {
            tracing::error!(asset_id = %asset_id, error = %e, "Cannot record processing timeout");
        }
    }
}

/// Runs provider acquisition for claimed assets.
pub struct AcquireJobHandler {
    orchestrator: AcquisitionOrchestrator,
    store: Arc<dyn AssetStore>,
}

impl AcquireJobHandler {
    pub fn new(orchestrator: AcquisitionOrchestrator, store: Arc<dyn AssetStore>) -> Self {
        Self {
            orchestrator,
            store,
        }
    }
}

#[async_trait]
impl JobHandler for AcquireJobHandler {
    async fn run(&self, asset_id: Uuid) -> Result<(), JobError> {
        self.orchestrator.run(asset_id).await.map_err(JobError::from)
    }

    async fn on_timeout(&self, asset_id: Uuid) {
        let mut asset = match self.store.get(asset_id).await {
            Ok(asset) => asset,
            Err(e) => {
                tracing::error!(asset_id = %asset_id, error = %e, "Cannot record download timeout");
                return;
            }
        };
        asset.fail_download("download timed out");
        if let Err(e) = self.store.update(&asset).await {
            tracing::error!(asset_id = %asset_id, error = %e, "Cannot record download timeout");
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use bytes::Bytes;
    use vodpipe_core::{
        AssetStatus, EmbeddedSource, MemoryAssetStore, NoopEventSink, VideoAsset,
    };
    use vodpipe_media::test_helpers::{
        source_metadata, FakeProbe, FakeProviderClient, FakeTranscoder,
    };
    use vodpipe_media::{ProviderVideoInfo, TranscodeSettings};
    use vodpipe_storage::test_helpers::MemoryDisk;
    use vodpipe_storage::{paths, Disk, DiskRegistry};

    fn settings() -> TranscodeSettings {
        TranscodeSettings {
            hls_segment_seconds: 10,
            thumbnail_count: 2,
            quality_labels: vec!["240p".to_string(), "360p".to_string()],
        }
    }

    async fn transcode_handler(
        probe: FakeProbe,
    ) -> (TranscodeJobHandler, Arc<MemoryAssetStore>, Uuid) {
        let disk = Arc::new(MemoryDisk::new("main"));
        let registry = Arc::new(DiskRegistry::with_disks(vec![disk.clone()], "main").unwrap());
        let store = Arc::new(MemoryAssetStore::new());

        let mut asset = VideoAsset::new_upload("main", "placeholder");
        asset.video_path = Some(paths::source_path(asset.id, "mp4"));
        disk.put(
            &paths::source_path(asset.id, "mp4"),
            Bytes::from_static(b"source"),
            "video/mp4",
        )
        .await
        .unwrap();
        let asset_id = asset.id;
        store.insert(asset).await.unwrap();

        let orchestrator = TranscodeOrchestrator::new(
            store.clone(),
            registry,
            Arc::new(probe),
            Arc::new(FakeTranscoder::new()),
            Arc::new(NoopEventSink),
            settings(),
        );
        (
            TranscodeJobHandler::new(orchestrator, store.clone()),
            store,
            asset_id,
        )
    }

    #[tokio::test]
    async fn test_transcode_run_completes() {
        let (handler, store, asset_id) =
            transcode_handler(FakeProbe::returning(source_metadata(360, 20))).await;

        handler.run(asset_id).await.unwrap();

        let asset = store.get(asset_id).await.unwrap();
        assert_eq!(asset.status, AssetStatus::Processed);
    }

    #[tokio::test]
    async fn test_transcode_permanent_errors_stay_permanent() {
        let (handler, _store, asset_id) = transcode_handler(FakeProbe::no_video_stream()).await;

        let err = handler.run(asset_id).await.unwrap_err();
        assert!(!err.is_retryable());
    }

    #[tokio::test]
    async fn test_transcode_timeout_marks_asset_failed() {
        let (handler, store, asset_id) =
            transcode_handler(FakeProbe::returning(source_metadata(360, 20))).await;

        handler.on_timeout(asset_id).await;

        let asset = store.get(asset_id).await.unwrap();
        assert_eq!(asset.status, AssetStatus::Failed);
        assert_eq!(
            asset.failure_reason.as_deref(),
            Some("processing timed out")
        );
    }

    #[tokio::test]
    async fn test_acquire_timeout_marks_download_failed() {
        let disk = Arc::new(MemoryDisk::new("main"));
        let registry = Arc::new(DiskRegistry::with_disks(vec![disk], "main").unwrap());
        let store = Arc::new(MemoryAssetStore::new());

        let asset = VideoAsset::new_embedded(EmbeddedSource {
            provider_name: "vimeo".to_string(),
            provider_video_id: Some("42".to_string()),
            watch_url: None,
            embed_url: None,
            thumbnail_url: None,
            preview_url: None,
        });
        let asset_id = asset.id;
        store.insert(asset).await.unwrap();

        let orchestrator = AcquisitionOrchestrator::new(
            store.clone(),
            registry,
            Arc::new(FakeProviderClient::new(ProviderVideoInfo::default())),
            Arc::new(NoopEventSink),
        );
        let handler = AcquireJobHandler::new(orchestrator, store.clone());

        handler.on_timeout(asset_id).await;

        let asset = store.get(asset_id).await.unwrap();
        assert_eq!(asset.status, AssetStatus::DownloadFailed);
        assert_eq!(asset.failure_reason.as_deref(), Some("download timed out"));
    }
}
