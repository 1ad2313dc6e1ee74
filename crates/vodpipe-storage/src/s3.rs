//! S3-compatible object store backend

use crate::disk::{validate_path, Disk, StorageError, StorageResult};
use async_trait::async_trait;
use bytes::Bytes;
use futures::StreamExt;
use object_store::aws::{AmazonS3, AmazonS3Builder};
use object_store::path::Path;
use object_store::{Error as ObjectStoreError, ObjectStore, ObjectStoreExt, PutPayload};
use std::path::PathBuf;
use std::time::Instant;
use vodpipe_core::DiskSettings;

/// S3-compatible object store backend.
///
/// Works against AWS S3 or any S3-compatible provider via a custom endpoint
/// (MinIO, Cloudflare R2, etc.). Credentials are resolved from the process
/// environment by the underlying client.
pub struct ObjectStoreDisk {
    name: String,
    store: AmazonS3,
    bucket: String,
    region: String,
    endpoint: Option<String>,
}

impl ObjectStoreDisk {
    pub fn new(settings: &DiskSettings) -> StorageResult<Self> {
        let bucket = settings.bucket.clone().ok_or_else(|| {
            StorageError::ConfigError(format!("object store disk '{}' has no bucket", settings.name))
        })?;
        let region = settings.region.clone().ok_or_else(|| {
            StorageError::ConfigError(format!("object store disk '{}' has no region", settings.name))
        })?;

        let mut builder = AmazonS3Builder::from_env()
            .with_region(region.clone())
            .with_bucket_name(bucket.clone());

        // Custom endpoint for S3-compatible providers
        if let Some(endpoint) = &settings.endpoint {
            builder = builder
                .with_endpoint(endpoint.clone())
                .with_allow_http(true);
        }

        let store = builder.build().map_err(|e| {
            StorageError::ConfigError(format!(
                "failed to build object store client for disk '{}': {}",
                settings.name, e
            ))
        })?;

        tracing::info!(
            disk = %settings.name,
            bucket = %bucket,
            region = %region,
            "Object store disk initialized"
        );

        Ok(Self {
            name: settings.name.clone(),
            store,
            bucket,
            region,
            endpoint: settings.endpoint.clone(),
        })
    }
}

fn classify(path: &str, err: ObjectStoreError) -> StorageError {
    match &err {
        ObjectStoreError::NotFound { .. } => StorageError::NotFound(path.to_string()),
        ObjectStoreError::PermissionDenied { .. } | ObjectStoreError::Unauthenticated { .. } => {
            StorageError::Denied(format!("{}: {}", path, err))
        }
        _ => StorageError::Unavailable(format!("{}: {}", path, err)),
    }
}

#[async_trait]
impl Disk for ObjectStoreDisk {
    fn name(&self) -> &str {
        &self.name
    }

    async fn exists(&self, path: &str) -> StorageResult<bool> {
        validate_path(path)?;
        let location = Path::from(path);
        match self.store.head(&location).await {
            Ok(_) => Ok(true),
            Err(ObjectStoreError::NotFound { .. }) => Ok(false),
            Err(e) => Err(classify(path, e)),
        }
    }

    async fn put(&self, path: &str, data: Bytes, _content_type: &str) -> StorageResult<String> {
        validate_path(path)?;
        let start = Instant::now();
        let location = Path::from(path);
        let size_bytes = data.len();

        self.store
            .put(&location, PutPayload::from(data))
            .await
            .map_err(|e| classify(path, e))?;

        tracing::info!(
            disk = %self.name,
            path = %path,
            size_bytes = size_bytes,
            duration_ms = start.elapsed().as_secs_f64() * 1000.0,
            "File written to object store"
        );

        Ok(self.public_url(path))
    }

    async fn get(&self, path: &str) -> StorageResult<Bytes> {
        validate_path(path)?;
        let location = Path::from(path);
        let result = self
            .store
            .get(&location)
            .await
            .map_err(|e| classify(path, e))?;
        let data = result.bytes().await.map_err(|e| classify(path, e))?;
        Ok(data)
    }

    async fn delete(&self, path: &str) -> StorageResult<()> {
        validate_path(path)?;
        let location = Path::from(path);
        match self.store.delete(&location).await {
            Ok(()) => {
                tracing::info!(disk = %self.name, path = %path, "File deleted from object store");
                Ok(())
            }
            Err(ObjectStoreError::NotFound { .. }) => Ok(()),
            Err(e) => Err(classify(path, e)),
        }
    }

    async fn delete_prefix(&self, prefix: &str) -> StorageResult<()> {
        let paths = self.list(prefix).await?;
        for path in &paths {
            self.delete(path).await?;
        }
        tracing::info!(
            disk = %self.name,
            prefix = %prefix,
            objects = paths.len(),
            "Prefix deleted from object store"
        );
        Ok(())
    }

    async fn list(&self, prefix: &str) -> StorageResult<Vec<String>> {
        validate_path(prefix)?;
        let location = Path::from(prefix);
        let mut stream = self.store.list(Some(&location));

        let mut paths = Vec::new();
        while let Some(entry) = stream.next().await {
            let meta = entry.map_err(|e| classify(prefix, e))?;
            paths.push(meta.location.to_string());
        }
        paths.sort();
        Ok(paths)
    }

    fn local_path(&self, _path: &str) -> Option<PathBuf> {
        None
    }

    fn public_url(&self, path: &str) -> String {
        match &self.endpoint {
            // Path-style URL for S3-compatible providers
            Some(endpoint) => format!("{}/{}/{}", endpoint.trim_end_matches('/'), self.bucket, path),
            None => format!("https://{}.s3.{}.amazonaws.com/{}", self.bucket, self.region, path),
        }
    }
}
