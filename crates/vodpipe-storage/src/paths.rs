//! Shared storage path layout for video assets.
//!
//! Everything belonging to one asset lives under `videos/{asset_id}/`:
//!
//! - `source.{ext}` - the original upload or acquired file
//! - `thumbs/thumb_{nnn}.jpg` - still thumbnails
//! - `thumbs/scrubber.vtt` - WebVTT track mapping timestamps to thumbnails
//! - `renditions/{label}.mp4` - progressive MP4 per ladder rung
//! - `hls/{label}/index.m3u8` + `hls/{label}/segment_{nnn}.ts` - HLS variants
//! - `hls/master.m3u8` - the master playlist
//!
//! All path generation is centralized here so backends, the transcoder, and
//! the migrator agree on layout.

use uuid::Uuid;

/// Prefix under which every file of the given asset is stored.
pub fn asset_prefix(asset_id: Uuid) -> String {
    format!("videos/{}", asset_id)
}

pub fn source_path(asset_id: Uuid, extension: &str) -> String {
    format!("videos/{}/source.{}", asset_id, extension)
}

pub fn thumbnail_path(asset_id: Uuid, index: u32) -> String {
    format!("videos/{}/thumbs/thumb_{:03}.jpg", asset_id, index)
}

pub fn scrubber_track_path(asset_id: Uuid) -> String {
    format!("videos/{}/thumbs/scrubber.vtt", asset_id)
}

pub fn preview_path(asset_id: Uuid, extension: &str) -> String {
    format!("videos/{}/preview.{}", asset_id, extension)
}

pub fn rendition_path(asset_id: Uuid, label: &str) -> String {
    format!("videos/{}/renditions/{}.mp4", asset_id, label)
}

pub fn hls_variant_index_path(asset_id: Uuid, label: &str) -> String {
    format!("videos/{}/hls/{}/index.m3u8", asset_id, label)
}

pub fn hls_segment_path(asset_id: Uuid, label: &str, segment: u32) -> String {
    format!("videos/{}/hls/{}/segment_{:03}.ts", asset_id, label, segment)
}

/// Path for an HLS file whose name the segmenter chose (sub-manifest or
/// segment).
pub fn hls_file_path(asset_id: Uuid, label: &str, file_name: &str) -> String {
    format!("videos/{}/hls/{}/{}", asset_id, label, file_name)
}

pub fn master_playlist_path(asset_id: Uuid) -> String {
    format!("videos/{}/hls/master.m3u8", asset_id)
}

/// MIME type for a stored file, derived from its extension.
pub fn content_type_for(path: &str) -> &'static str {
    let extension = path.rsplit('.').next().unwrap_or_default();
    match extension {
        "m3u8" => "application/vnd.apple.mpegurl",
        "ts" => "video/mp2t",
        "mp4" => "video/mp4",
        "webm" => "video/webm",
        "mov" => "video/quicktime",
        "mkv" => "video/x-matroska",
        "jpg" | "jpeg" => "image/jpeg",
        "png" => "image/png",
        "gif" => "image/gif",
        "webp" => "image/webp",
        "vtt" => "text/vtt",
        _ => "application/octet-stream",
    }
}
