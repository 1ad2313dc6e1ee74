//! Asset persistence seam
//!
//! Durable storage of VideoAsset records belongs to an external collaborator
//! (the application database). The pipeline only needs the narrow interface
//! below, so it is expressed as a trait with an in-memory implementation used
//! by tests and the operator CLI.

use crate::models::asset::VideoAsset;
use async_trait::async_trait;
use std::collections::HashMap;
use std::sync::Arc;
use thiserror::Error;
use tokio::sync::Mutex;
use uuid::Uuid;

#[derive(Error, Debug)]
pub enum StoreError {
    #[error("Asset not found: {0}")]
    NotFound(Uuid),

    #[error("Asset already exists: {0}")]
    Conflict(Uuid),

    #[error("Store backend error: {0}")]
    Backend(String),
}

pub type StoreResult<T> = Result<T, StoreError>;

/// Read and write access to VideoAsset records.
///
/// `update` replaces the whole record. The per-asset uniqueness rule in the
/// job queue guarantees no two pipeline runs race on the same asset, so
/// read-modify-write through this trait is safe.
#[async_trait]
pub trait AssetStore: Send + Sync {
    async fn get(&self, id: Uuid) -> StoreResult<VideoAsset>;

    async fn insert(&self, asset: VideoAsset) -> StoreResult<()>;

    async fn update(&self, asset: &VideoAsset) -> StoreResult<()>;

    /// Assets whose file references live on the named disk, oldest first.
    async fn list_on_disk(&self, disk: &str, limit: Option<usize>)
        -> StoreResult<Vec<VideoAsset>>;

    async fn list_all(&self) -> StoreResult<Vec<VideoAsset>>;
}

/// In-memory store used by tests and the CLI's JSON-index workflows.
#[derive(Clone, Default)]
pub struct MemoryAssetStore {
    assets: Arc<Mutex<HashMap<Uuid, VideoAsset>>>,
}

impl MemoryAssetStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub async fn seed(assets: Vec<VideoAsset>) -> StoreResult<Self> {
        let store = Self::new();
        for asset in assets {
            store.insert(asset).await?;
        }
        Ok(store)
    }
}

fn sorted_oldest_first(mut assets: Vec<VideoAsset>) -> Vec<VideoAsset> {
    assets.sort_by(|a, b| a.created_at.cmp(&b.created_at).then(a.id.cmp(&b.id)));
    assets
}

#[async_trait]
impl AssetStore for MemoryAssetStore {
    async fn get(&self, id: Uuid) -> StoreResult<VideoAsset> {
        self.assets
            .lock()
            .await
            .get(&id)
            .cloned()
            .ok_or(StoreError::NotFound(id))
    }

    async fn insert(&self, asset: VideoAsset) -> StoreResult<()> {
        let mut assets = self.assets.lock().await;
        if assets.contains_key(&asset.id) {
            return Err(StoreError::Conflict(asset.id));
        }
        assets.insert(asset.id, asset);
        Ok(())
    }

    async fn update(&self, asset: &VideoAsset) -> StoreResult<()> {
        let mut assets = self.assets.lock().await;
        if !assets.contains_key(&asset.id) {
            return Err(StoreError::NotFound(asset.id));
        }
        assets.insert(asset.id, asset.clone());
        Ok(())
    }

    async fn list_on_disk(
        &self,
        disk: &str,
        limit: Option<usize>,
    ) -> StoreResult<Vec<VideoAsset>> {
        let assets = self.assets.lock().await;
        let matching: Vec<VideoAsset> = assets
            .values()
            .filter(|a| a.storage_disk.as_deref() == Some(disk))
            .cloned()
            .collect();
        let mut sorted = sorted_oldest_first(matching);
        if let Some(limit) = limit {
            sorted.truncate(limit);
        }
        Ok(sorted)
    }

    async fn list_all(&self) -> StoreResult<Vec<VideoAsset>> {
        let assets = self.assets.lock().await;
        Ok(sorted_oldest_first(assets.values().cloned().collect()))
    }
}
