//! Video transcoding orchestration: stage → probe → thumbnails → ladder →
//! HLS → manifest → persist.

use crate::error::{PipelineError, PipelineResult};
use crate::ffmpeg::Transcoder;
use crate::ladder::{eligible_rungs, ladder_from_labels};
use crate::manifest::{self, ProducedRendition};
use crate::probe::MediaProbe;
use crate::thumbs::{scrubber_track, thumbnail_timestamps};
use bytes::Bytes;
use std::path::Path;
use std::sync::Arc;
use tempfile::TempDir;
use uuid::Uuid;
use vodpipe_core::{AssetStore, EventSink, PipelineConfig, VideoAsset};
use vodpipe_storage::{paths, Disk, DiskRegistry, StagedSource};

/// Transcode tunables, fixed at construction.
#[derive(Clone)]
pub struct TranscodeSettings {
    pub hls_segment_seconds: u32,
    pub thumbnail_count: u32,
    pub quality_labels: Vec<String>,
}

impl TranscodeSettings {
    pub fn from_config(config: &PipelineConfig) -> Self {
        Self {
            hls_segment_seconds: config.hls_segment_seconds,
            thumbnail_count: config.thumbnail_count,
            quality_labels: config.quality_ladder.clone(),
        }
    }
}

/// Orchestrates the full processing run for one asset: materialize the
/// source, probe it, produce thumbnails and the eligible ladder renditions,
/// package HLS, upload everything, and record the outcome on the asset.
pub struct TranscodeOrchestrator {
    store: Arc<dyn AssetStore>,
    registry: Arc<DiskRegistry>,
    probe: Arc<dyn MediaProbe>,
    transcoder: Arc<dyn Transcoder>,
    events: Arc<dyn EventSink>,
    settings: TranscodeSettings,
}

impl TranscodeOrchestrator {
    pub fn new(
        store: Arc<dyn AssetStore>,
        registry: Arc<DiskRegistry>,
        probe: Arc<dyn MediaProbe>,
        transcoder: Arc<dyn Transcoder>,
        events: Arc<dyn EventSink>,
        settings: TranscodeSettings,
    ) -> Self {
        Self {
            store,
            registry,
            probe,
            transcoder,
            events,
            settings,
        }
    }

    /// Run the pipeline for one asset. On failure the asset is marked
    /// `Failed` with the triggering error as its failure reason; artifacts
    /// already uploaded are kept, and a re-run overwrites them.
    pub async fn run(&self, asset_id: Uuid) -> Result<(), PipelineError> {
        let mut asset = self.store.get(asset_id).await?;
        tracing::info!(asset_id = %asset_id, "Starting video processing");

        asset.begin_processing();
        self.store.update(&asset).await?;

        match self.process(&mut asset).await {
            Ok(qualities) => {
                asset.complete_processing(qualities);
                self.store.update(&asset).await?;

                if let Err(reason) = self.events.asset_processed(asset.id).await {
                    tracing::warn!(
                        asset_id = %asset.id,
                        error = %reason,
                        "Processed event delivery failed"
                    );
                }

                tracing::info!(asset_id = %asset.id, "Video processing completed successfully");
                Ok(())
            }
            Err(e) => {
                tracing::warn!(asset_id = %asset.id, error = %e, "Video processing failed");
                asset.fail_processing(&e.to_string());
                if let Err(update_err) = self.store.update(&asset).await {
                    tracing::error!(
                        asset_id = %asset.id,
                        error = %update_err,
                        "Failed to record processing failure"
                    );
                }
                Err(e)
            }
        }
    }

    async fn process(&self, asset: &mut VideoAsset) -> PipelineResult<Vec<String>> {
        let disk_name = asset
            .storage_disk
            .clone()
            .ok_or(PipelineError::MissingSource)?;
        let video_path = asset
            .video_path
            .clone()
            .ok_or(PipelineError::MissingSource)?;
        let disk = self.registry.get(&disk_name)?;

        // Resolve the ladder up front so a bad label fails before any work
        let ladder = ladder_from_labels(&self.settings.quality_labels)?;

        let staged = StagedSource::new(disk.as_ref(), &video_path).await?;
        let metadata = self.probe.probe(staged.path()).await?;

        // Persist duration and size immediately so partial progress is
        // visible even if a later step fails
        asset.duration_seconds = Some(metadata.duration_seconds);
        asset.file_size_bytes = Some(tokio::fs::metadata(staged.path()).await?.len());
        self.store.update(asset).await?;

        let scratch = TempDir::new()?;

        let timestamps =
            thumbnail_timestamps(metadata.duration_seconds, self.settings.thumbnail_count);
        self.produce_thumbnails(asset, disk.as_ref(), staged.path(), scratch.path(), &timestamps)
            .await?;

        let rungs = eligible_rungs(&ladder, metadata.height);
        if rungs.is_empty() {
            return Err(PipelineError::NoEligibleRenditions(metadata.height));
        }
        tracing::info!(
            asset_id = %asset.id,
            source_height = metadata.height,
            renditions = rungs.len(),
            "Transcoding ladder renditions"
        );

        let mut produced = Vec::with_capacity(rungs.len());
        for rung in &rungs {
            let rendition_file = scratch.path().join(format!("{}.mp4", rung.label));
            self.transcoder
                .encode_rendition(staged.path(), *rung, &rendition_file)
                .await?;

            let rendition_path = paths::rendition_path(asset.id, rung.label);
            let data = tokio::fs::read(&rendition_file).await?;
            disk.put(
                &rendition_path,
                Bytes::from(data),
                paths::content_type_for(&rendition_path),
            )
            .await?;

            let hls_dir = scratch.path().join("hls").join(rung.label);
            self.transcoder
                .package_hls(&rendition_file, &hls_dir, self.settings.hls_segment_seconds)
                .await?;
            upload_hls_dir(disk.as_ref(), asset.id, rung.label, &hls_dir).await?;

            produced.push(ProducedRendition::new(*rung));
        }

        let master = manifest::master_playlist(&produced);
        let master_path = paths::master_playlist_path(asset.id);
        disk.put(
            &master_path,
            Bytes::from(master),
            paths::content_type_for(&master_path),
        )
        .await?;

        Ok(produced
            .iter()
            .map(|r| r.rung.label.to_string())
            .collect())
    }

    async fn produce_thumbnails(
        &self,
        asset: &mut VideoAsset,
        disk: &dyn Disk,
        source: &Path,
        scratch: &Path,
        timestamps: &[u64],
    ) -> PipelineResult<()> {
        for (i, &at) in timestamps.iter().enumerate() {
            let frame_file = scratch.join(format!("thumb_{:03}.jpg", i));
            self.transcoder
                .extract_frame(source, at, &frame_file)
                .await?;

            let stored = paths::thumbnail_path(asset.id, i as u32);
            let data = tokio::fs::read(&frame_file).await?;
            disk.put(&stored, Bytes::from(data), paths::content_type_for(&stored))
                .await?;
        }
        asset.thumbnail_path = Some(paths::thumbnail_path(asset.id, 0));

        let track = scrubber_track(
            asset.duration_seconds.unwrap_or_default(),
            timestamps,
        );
        let track_path = paths::scrubber_track_path(asset.id);
        disk.put(
            &track_path,
            Bytes::from(track),
            paths::content_type_for(&track_path),
        )
        .await?;
        asset.scrubber_track_path = Some(track_path);

        tracing::info!(
            asset_id = %asset.id,
            thumbnails = timestamps.len(),
            "Thumbnails uploaded"
        );
        Ok(())
    }
}

async fn upload_hls_dir(
    disk: &dyn Disk,
    asset_id: Uuid,
    label: &str,
    hls_dir: &Path,
) -> PipelineResult<()> {
    let mut uploaded = 0usize;
    let mut entries = tokio::fs::read_dir(hls_dir).await?;
    while let Some(entry) = entries.next_entry().await? {
        let path = entry.path();
        let name = match path.file_name().and_then(|n| n.to_str()) {
            Some(name) => name.to_string(),
            None => continue,
        };
        if name != "index.m3u8" && !name.ends_with(".ts") {
            continue;
        }

        let data = tokio::fs::read(&path).await?;
        let stored = paths::hls_file_path(asset_id, label, &name);
        disk.put(&stored, Bytes::from(data), paths::content_type_for(&stored))
            .await?;
        uploaded += 1;
    }

    tracing::info!(
        asset_id = %asset_id,
        rendition = %label,
        files = uploaded,
        "Rendition variant uploaded"
    );
    Ok(())
}
