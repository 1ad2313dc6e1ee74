//! Vodpipe CLI: operator commands for the media pipeline.
//!
//! Disks are configured through the environment (VODPIPE_DISKS plus
//! DISK_<NAME>_* variables); the asset index file stands in for the asset
//! database and is rewritten in place by commands that change assets.

use anyhow::Context;
use clap::{Parser, Subcommand};
use serde::Serialize;
use std::path::PathBuf;
use std::sync::Arc;
use uuid::Uuid;
use vodpipe_cli::{init_tracing, load_index, save_index};
use vodpipe_core::{AssetStore, MemoryAssetStore, NoopEventSink, PipelineConfig};
use vodpipe_media::{
    AcquisitionOrchestrator, FfmpegTranscoder, FfprobeProbe, HttpProviderClient, MediaProbe,
    TranscodeOrchestrator, TranscodeSettings,
};
use vodpipe_storage::{DiskRegistry, MigrationOptions, Migrator};

#[derive(Parser)]
#[command(name = "vodpipe", about = "Vodpipe media pipeline CLI")]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Copy every asset on one disk to another and repoint the records
    Migrate {
        /// Source disk name
        #[arg(long)]
        from: String,
        /// Target disk name
        #[arg(long)]
        to: String,
        /// Migrate at most this many assets
        #[arg(long)]
        limit: Option<usize>,
        /// Report what would move without copying anything
        #[arg(long)]
        dry_run: bool,
        /// JSON asset index file, rewritten in place
        #[arg(long)]
        index: PathBuf,
    },
    /// Probe a local media file and print its stream metadata
    Probe {
        /// Path to the media file
        file: PathBuf,
    },
    /// Run the transcode pipeline for one asset
    Transcode {
        /// Asset UUID
        id: String,
        /// JSON asset index file, rewritten in place
        #[arg(long)]
        index: PathBuf,
    },
    /// Download one embedded asset from its provider
    Acquire {
        /// Asset UUID
        id: String,
        /// JSON asset index file, rewritten in place
        #[arg(long)]
        index: PathBuf,
    },
}

fn print_json(value: &impl Serialize) -> anyhow::Result<()> {
    let out = serde_json::to_string_pretty(value).context("Serialize output")?;
    println!("{}", out);
    Ok(())
}

fn parse_asset_id(id: &str) -> anyhow::Result<Uuid> {
    id.parse()
        .with_context(|| format!("'{}' is not a valid asset UUID", id))
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    init_tracing();
    dotenvy::dotenv().ok();

    let cli = Cli::parse();

    match cli.command {
        Commands::Migrate {
            from,
            to,
            limit,
            dry_run,
            index,
        } => migrate(from, to, limit, dry_run, index).await,
        Commands::Probe { file } => probe(file).await,
        Commands::Transcode { id, index } => transcode(parse_asset_id(&id)?, index).await,
        Commands::Acquire { id, index } => acquire(parse_asset_id(&id)?, index).await,
    }
}

async fn migrate(
    from: String,
    to: String,
    limit: Option<usize>,
    dry_run: bool,
    index: PathBuf,
) -> anyhow::Result<()> {
    let config = PipelineConfig::from_env().context("Failed to load configuration")?;
    let registry = Arc::new(
        DiskRegistry::from_config(&config)
            .await
            .context("Failed to build disk registry")?,
    );
    let store = Arc::new(MemoryAssetStore::seed(load_index(&index)?).await?);

    let migrator = Migrator::new(registry, store.clone());
    let report = migrator
        .run(&MigrationOptions {
            from,
            to,
            limit,
            dry_run,
        })
        .await?;

    println!("{}", report);
    for failure in &report.failures {
        println!("  failed {}: {}", failure.asset_id, failure.reason);
    }

    if !report.dry_run {
        save_index(&index, &store.list_all().await?)?;
    }

    if !report.is_success() {
        anyhow::bail!("{} asset(s) failed to migrate", report.failures.len());
    }
    Ok(())
}

async fn probe(file: PathBuf) -> anyhow::Result<()> {
    let ffprobe_path = std::env::var("FFPROBE_PATH").unwrap_or_else(|_| "ffprobe".to_string());
    let probe = FfprobeProbe::new(&ffprobe_path);
    let metadata = probe.probe(&file).await?;
    print_json(&metadata)
}

async fn transcode(id: Uuid, index: PathBuf) -> anyhow::Result<()> {
    let config = PipelineConfig::from_env().context("Failed to load configuration")?;
    let registry = Arc::new(
        DiskRegistry::from_config(&config)
            .await
            .context("Failed to build disk registry")?,
    );
    let store = Arc::new(MemoryAssetStore::seed(load_index(&index)?).await?);

    let orchestrator = TranscodeOrchestrator::new(
        store.clone(),
        registry,
        Arc::new(FfprobeProbe::new(&config.ffprobe_path)),
        Arc::new(FfmpegTranscoder::new(&config.ffmpeg_path)),
        Arc::new(NoopEventSink),
        TranscodeSettings::from_config(&config),
    );

    // The run stamps its outcome on the asset either way, so the index is
    // rewritten before any error is surfaced.
    let result = orchestrator.run(id).await;
    save_index(&index, &store.list_all().await?)?;
    result?;

    print_json(&store.get(id).await?)
}

async fn acquire(id: Uuid, index: PathBuf) -> anyhow::Result<()> {
    let config = PipelineConfig::from_env().context("Failed to load configuration")?;
    let registry = Arc::new(
        DiskRegistry::from_config(&config)
            .await
            .context("Failed to build disk registry")?,
    );
    let store = Arc::new(MemoryAssetStore::seed(load_index(&index)?).await?);

    let api_url = config
        .provider_api_url
        .as_deref()
        .context("PROVIDER_API_URL must be set to acquire embedded videos")?;
    let provider = HttpProviderClient::new(api_url, config.provider_api_key.as_deref())?;

    let orchestrator = AcquisitionOrchestrator::new(
        store.clone(),
        registry,
        Arc::new(provider),
        Arc::new(NoopEventSink),
    );

    let result = orchestrator.run(id).await;
    save_index(&index, &store.list_all().await?)?;
    result?;

    print_json(&store.get(id).await?)
}
