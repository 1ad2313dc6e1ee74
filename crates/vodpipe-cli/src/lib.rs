use anyhow::Context;
use std::path::Path;
use vodpipe_core::VideoAsset;

/// Read an asset index file: a JSON array of assets.
pub fn load_index(path: &Path) -> anyhow::Result<Vec<VideoAsset>> {
    let data = std::fs::read_to_string(path)
        .with_context(|| format!("Failed to read asset index {}", path.display()))?;
    serde_json::from_str(&data)
        .with_context(|| format!("Asset index {} is not valid JSON", path.display()))
}

/// Rewrite the asset index in place.
pub fn save_index(path: &Path, assets: &[VideoAsset]) -> anyhow::Result<()> {
    let data = serde_json::to_string_pretty(assets).context("Serialize asset index")?;
    std::fs::write(path, data)
        .with_context(|| format!("Failed to write asset index {}", path.display()))?;
    Ok(())
}

/// Initialize tracing for CLI binaries.
pub fn init_tracing() {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("info")),
        )
        .init();
}
