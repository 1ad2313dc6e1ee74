//! Provider API client for embedded video acquisition

use crate::error::{PipelineError, PipelineResult};
use async_trait::async_trait;
use bytes::Bytes;
use serde::Deserialize;
use std::time::Duration;

/// One pre-transcoded fallback file the provider can serve.
#[derive(Debug, Clone, Deserialize)]
pub struct FallbackFile {
    pub height: u32,
    pub url: String,
}

/// Source representations the provider holds for one video.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct ProviderVideoInfo {
    pub has_original: bool,
    pub original_url: Option<String>,
    #[serde(default)]
    pub fallbacks: Vec<FallbackFile>,
    pub thumbnail_url: Option<String>,
    pub preview_url: Option<String>,
}

impl ProviderVideoInfo {
    /// Highest-resolution fallback, if any.
    pub fn best_fallback(&self) -> Option<&FallbackFile> {
        self.fallbacks.iter().max_by_key(|f| f.height)
    }
}

/// Provider API capability.
#[async_trait]
pub trait ProviderClient: Send + Sync {
    /// Fetch availability metadata for a provider video id.
    async fn video_info(&self, provider_video_id: &str) -> PipelineResult<ProviderVideoInfo>;

    /// Download a provider-hosted file in full.
    async fn download(&self, url: &str) -> PipelineResult<Bytes>;
}

/// HTTP client against the provider's REST API.
///
/// Metadata lives at `{api_url}/videos/{id}`; download URLs come from the
/// metadata response and are fetched as-is.
pub struct HttpProviderClient {
    client: reqwest::Client,
    api_url: String,
    api_key: Option<String>,
}

impl HttpProviderClient {
    pub fn new(api_url: &str, api_key: Option<&str>) -> PipelineResult<Self> {
        let client = reqwest::Client::builder()
            .timeout(Duration::from_secs(600))
            .build()
            .map_err(|e| PipelineError::Provider(format!("failed to create HTTP client: {}", e)))?;

        Ok(Self {
            client,
            api_url: api_url.trim_end_matches('/').to_string(),
            api_key: api_key.map(str::to_string),
        })
    }
}

#[async_trait]
impl ProviderClient for HttpProviderClient {
    async fn video_info(&self, provider_video_id: &str) -> PipelineResult<ProviderVideoInfo> {
        let url = format!("{}/videos/{}", self.api_url, provider_video_id);

        let mut request = self.client.get(&url);
        if let Some(key) = &self.api_key {
            request = request.header("Authorization", format!("Bearer {}", key));
        }

        let response = request
            .send()
            .await
            .map_err(|e| PipelineError::Provider(format!("metadata request failed: {}", e)))?;

        if !response.status().is_success() {
            return Err(PipelineError::Provider(format!(
                "metadata request for '{}' returned {}",
                provider_video_id,
                response.status()
            )));
        }

        response
            .json::<ProviderVideoInfo>()
            .await
            .map_err(|e| PipelineError::Provider(format!("unparseable metadata response: {}", e)))
    }

    async fn download(&self, url: &str) -> PipelineResult<Bytes> {
        let start = std::time::Instant::now();

        let response = self
            .client
            .get(url)
            .send()
            .await
            .map_err(|e| PipelineError::Provider(format!("download request failed: {}", e)))?;

        if !response.status().is_success() {
            return Err(PipelineError::Provider(format!(
                "download of '{}' returned {}",
                url,
                response.status()
            )));
        }

        let data = response
            .bytes()
            .await
            .map_err(|e| PipelineError::Provider(format!("failed to read download body: {}", e)))?;

        tracing::info!(
            url = %url,
            size_bytes = data.len(),
            duration_ms = start.elapsed().as_secs_f64() * 1000.0,
            "Provider file downloaded"
        );
        Ok(data)
    }
}

/// File extension taken from a URL's final path segment, lowercased.
/// Query strings and fragments are ignored.
pub fn url_extension(url: &str) -> Option<String> {
    let path = url.split(['?', '#']).next()?;
    let name = path.rsplit('/').next()?;
    let (stem, extension) = name.rsplit_once('.')?;
    if stem.is_empty() || extension.is_empty() || extension.len() > 5 {
        return None;
    }
    if !extension.chars().all(|c| c.is_ascii_alphanumeric()) {
        return None;
    }
    Some(extension.to_ascii_lowercase())
}
