//! Acquisition of provider-hosted videos into our own storage.

use crate::error::{PipelineError, PipelineResult};
use crate::provider::{url_extension, ProviderClient, ProviderVideoInfo};
use bytes::Bytes;
use std::sync::Arc;
use uuid::Uuid;
use vodpipe_core::{AssetStore, EventSink, VideoAsset};
use vodpipe_storage::{paths, Disk, DiskRegistry};

/// Downloads an embedded asset's best available representation from its
/// provider, stores it on the default disk, and flips the asset to native
/// custody. Artwork (thumbnail, preview) is copied when available but never
/// blocks the acquisition.
pub struct AcquisitionOrchestrator {
    store: Arc<dyn AssetStore>,
    registry: Arc<DiskRegistry>,
    provider: Arc<dyn ProviderClient>,
    events: Arc<dyn EventSink>,
}

impl AcquisitionOrchestrator {
    pub fn new(
        store: Arc<dyn AssetStore>,
        registry: Arc<DiskRegistry>,
        provider: Arc<dyn ProviderClient>,
        events: Arc<dyn EventSink>,
    ) -> Self {
        Self {
            store,
            registry,
            provider,
            events,
        }
    }

    /// Acquire one asset. Assets without a provider video id are skipped.
    /// On failure the asset is marked `DownloadFailed` with every attempted
    /// representation in its failure reason.
    pub async fn run(&self, asset_id: Uuid) -> Result<(), PipelineError> {
        let mut asset = self.store.get(asset_id).await?;
        let video_id = match asset.provider_video_id() {
            Some(id) => id.to_string(),
            None => {
                tracing::info!(asset_id = %asset_id, "Asset has no provider video id, nothing to acquire");
                return Ok(());
            }
        };
        tracing::info!(asset_id = %asset_id, provider_video_id = %video_id, "Starting acquisition");

        asset.begin_download();
        self.store.update(&asset).await?;

        match self.acquire(&mut asset, &video_id).await {
            Ok(()) => {
                self.store.update(&asset).await?;

                if let Err(reason) = self.events.asset_processed(asset.id).await {
                    tracing::warn!(
                        asset_id = %asset.id,
                        error = %reason,
                        "Processed event delivery failed"
                    );
                }

                tracing::info!(asset_id = %asset.id, "Acquisition completed successfully");
                Ok(())
            }
            Err(e) => {
                tracing::warn!(asset_id = %asset.id, error = %e, "Acquisition failed");
                asset.fail_download(&e.to_string());
                if let Err(update_err) = self.store.update(&asset).await {
                    tracing::error!(
                        asset_id = %asset.id,
                        error = %update_err,
                        "Failed to record acquisition failure"
                    );
                }
                Err(e)
            }
        }
    }

    async fn acquire(&self, asset: &mut VideoAsset, video_id: &str) -> PipelineResult<()> {
        let disk = self.registry.default_disk()?;
        let info = self.provider.video_info(video_id).await?;

        let (data, source_url) = self.download_video(&info).await?;
        let extension = url_extension(&source_url).unwrap_or_else(|| "mp4".to_string());
        let video_path = paths::source_path(asset.id, &extension);
        let file_size_bytes = data.len() as u64;
        disk.put(&video_path, data, paths::content_type_for(&video_path))
            .await?;
        tracing::info!(
            asset_id = %asset.id,
            path = %video_path,
            size_bytes = file_size_bytes,
            "Source video stored"
        );

        let thumbnail_path = match &info.thumbnail_url {
            Some(url) => {
                self.fetch_artwork(disk.as_ref(), url, paths::thumbnail_path(asset.id, 0))
                    .await
            }
            None => None,
        };
        let preview_path = match &info.preview_url {
            Some(url) => {
                let extension = url_extension(url).unwrap_or_else(|| "gif".to_string());
                self.fetch_artwork(disk.as_ref(), url, paths::preview_path(asset.id, &extension))
                    .await
            }
            None => None,
        };

        asset.complete_acquisition(
            disk.name(),
            video_path,
            thumbnail_path,
            preview_path,
            file_size_bytes,
        );
        Ok(())
    }

    /// Try the original first, then the best fallback. Every failed attempt
    /// is recorded so the final error names what was tried.
    async fn download_video(&self, info: &ProviderVideoInfo) -> PipelineResult<(Bytes, String)> {
        let mut attempted = Vec::new();

        if info.has_original {
            match &info.original_url {
                Some(url) => match self.provider.download(url).await {
                    Ok(data) => return Ok((data, url.clone())),
                    Err(e) => {
                        tracing::warn!(url = %url, error = %e, "Original download failed, trying fallback");
                        attempted.push(format!("original ({})", e));
                    }
                },
                None => attempted.push("original (no url in metadata)".to_string()),
            }
        }

        if let Some(fallback) = info.best_fallback() {
            match self.provider.download(&fallback.url).await {
                Ok(data) => return Ok((data, fallback.url.clone())),
                Err(e) => {
                    tracing::warn!(url = %fallback.url, error = %e, "Fallback download failed");
                    attempted.push(format!("{}p fallback ({})", fallback.height, e));
                }
            }
        }

        if attempted.is_empty() {
            Err(PipelineError::Provider(
                "provider reports no downloadable representations".to_string(),
            ))
        } else {
            Err(PipelineError::Provider(format!(
                "all download attempts failed: {}",
                attempted.join("; ")
            )))
        }
    }

    /// Best-effort artwork copy. Failures are logged and reported as absent.
    async fn fetch_artwork(&self, disk: &dyn Disk, url: &str, stored: String) -> Option<String> {
        let data = match self.provider.download(url).await {
            Ok(data) => data,
            Err(e) => {
                tracing::warn!(url = %url, error = %e, "Artwork download failed, continuing without it");
                return None;
            }
        };
        match disk
            .put(&stored, data, paths::content_type_for(&stored))
            .await
        {
            Ok(_) => Some(stored),
            Err(e) => {
                tracing::warn!(path = %stored, error = %e, "Artwork upload failed, continuing without it");
                None
            }
        }
    }
}
