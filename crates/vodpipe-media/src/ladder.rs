//! The quality ladder

use crate::error::{PipelineError, PipelineResult};

/// One target rendition: label, resolution, video bitrate.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct QualityRung {
    pub label: &'static str,
    pub width: u32,
    pub height: u32,
    pub video_bitrate_kbps: u32,
}

/// Every rung the pipeline knows how to produce, ascending by resolution.
pub const QUALITY_LADDER: [QualityRung; 5] = [
    QualityRung {
        label: "240p",
        width: 426,
        height: 240,
        video_bitrate_kbps: 400,
    },
    QualityRung {
        label: "360p",
        width: 640,
        height: 360,
        video_bitrate_kbps: 800,
    },
    QualityRung {
        label: "480p",
        width: 854,
        height: 480,
        video_bitrate_kbps: 1400,
    },
    QualityRung {
        label: "720p",
        width: 1280,
        height: 720,
        video_bitrate_kbps: 2800,
    },
    QualityRung {
        label: "1080p",
        width: 1920,
        height: 1080,
        video_bitrate_kbps: 5000,
    },
];

/// Resolve configured quality labels against the known ladder.
///
/// The result preserves the ladder's ascending order regardless of how the
/// labels are listed in configuration.
pub fn ladder_from_labels(labels: &[String]) -> PipelineResult<Vec<QualityRung>> {
    for label in labels {
        if !QUALITY_LADDER.iter().any(|rung| rung.label == label) {
            return Err(PipelineError::UnknownQuality(label.clone()));
        }
    }
    Ok(QUALITY_LADDER
        .iter()
        .filter(|rung| labels.iter().any(|label| label == rung.label))
        .copied()
        .collect())
}

/// Rungs whose target height does not exceed the source height. Never
/// upscale.
pub fn eligible_rungs(ladder: &[QualityRung], source_height: u32) -> Vec<QualityRung> {
    ladder
        .iter()
        .filter(|rung| rung.height <= source_height)
        .copied()
        .collect()
}
