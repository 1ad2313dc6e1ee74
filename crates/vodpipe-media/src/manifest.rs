//! Adaptive-streaming manifest generation

use crate::ladder::QualityRung;

/// A rendition that was actually produced, with its sub-manifest location
/// relative to the master playlist.
#[derive(Debug, Clone)]
pub struct ProducedRendition {
    pub rung: QualityRung,
    pub playlist_path: String,
}

impl ProducedRendition {
    pub fn new(rung: QualityRung) -> Self {
        Self {
            playlist_path: format!("{}/index.m3u8", rung.label),
            rung,
        }
    }
}

/// Render the master playlist. Entries ascend by bitrate; each points at the
/// rendition's sub-manifest.
pub fn master_playlist(renditions: &[ProducedRendition]) -> String {
    let mut entries: Vec<&ProducedRendition> = renditions.iter().collect();
    entries.sort_by_key(|r| r.rung.video_bitrate_kbps);

    let mut playlist = String::from("#EXTM3U\n#EXT-X-VERSION:3\n\n");
    for rendition in entries {
        playlist.push_str(&format!(
            "#EXT-X-STREAM-INF:BANDWIDTH={},RESOLUTION={}x{}\n{}\n\n",
            rendition.rung.video_bitrate_kbps as u64 * 1000,
            rendition.rung.width,
            rendition.rung.height,
            rendition.playlist_path
        ));
    }
    playlist
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ladder::QUALITY_LADDER;

    #[test]
    fn test_master_playlist_lists_every_rendition_ascending() {
        let renditions: Vec<ProducedRendition> =
            QUALITY_LADDER.iter().map(|r| ProducedRendition::new(*r)).collect();

        let playlist = master_playlist(&renditions);

        assert!(playlist.starts_with("#EXTM3U\n#EXT-X-VERSION:3\n"));

        let bandwidths: Vec<u64> = playlist
            .lines()
            .filter_map(|line| line.strip_prefix("#EXT-X-STREAM-INF:BANDWIDTH="))
            .filter_map(|rest| rest.split(',').next())
            .filter_map(|bw| bw.parse().ok())
            .collect();
        assert_eq!(bandwidths, vec![400000, 800000, 1400000, 2800000, 5000000]);

        assert!(playlist.contains("RESOLUTION=426x240\n240p/index.m3u8"));
        assert!(playlist.contains("RESOLUTION=1920x1080\n1080p/index.m3u8"));
    }

    #[test]
    fn test_entries_are_sorted_even_if_input_is_not() {
        let mut renditions: Vec<ProducedRendition> =
            QUALITY_LADDER.iter().map(|r| ProducedRendition::new(*r)).collect();
        renditions.reverse();

        let playlist = master_playlist(&renditions);
        let first_inf = playlist
            .lines()
            .find(|l| l.starts_with("#EXT-X-STREAM-INF"))
            .unwrap();
        assert!(first_inf.contains("BANDWIDTH=400000"));
    }

    #[test]
    fn test_single_rendition_playlist() {
        let playlist = master_playlist(&[ProducedRendition::new(QUALITY_LADDER[0])]);
        assert_eq!(
            playlist,
            "#EXTM3U\n#EXT-X-VERSION:3\n\n#EXT-X-STREAM-INF:BANDWIDTH=400000,RESOLUTION=426x240\n240p/index.m3u8\n\n"
        );
    }
}
