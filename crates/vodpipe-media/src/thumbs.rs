//! Thumbnail planning and scrubber track generation

/// Capture timestamps (whole seconds) for a fixed count of evenly spaced
/// thumbnails. Spacing is `duration / (count + 1)`, floor-divided, so the
/// frames sit strictly inside the clip rather than at its edges.
///
/// Short clips can floor the spacing to zero; the timestamps then collapse
/// onto second zero, which extracts the first frame repeatedly.
pub fn thumbnail_timestamps(duration_seconds: u64, count: u32) -> Vec<u64> {
    let spacing = duration_seconds / (u64::from(count) + 1);
    (1..=u64::from(count)).map(|i| spacing * i).collect()
}

/// WebVTT scrubber track mapping playback ranges to thumbnail images.
///
/// Cue boundaries sit at the midpoints between consecutive capture times, so
/// hovering anywhere in the clip resolves to the nearest thumbnail. Image
/// references are relative file names; the track is stored next to the
/// thumbnails it references.
pub fn scrubber_track(duration_seconds: u64, timestamps: &[u64]) -> String {
    let mut track = String::from("WEBVTT\n");

    for (i, &at) in timestamps.iter().enumerate() {
        let cue_start = if i == 0 {
            0
        } else {
            (timestamps[i - 1] + at) / 2
        };
        let cue_end = if i + 1 == timestamps.len() {
            duration_seconds
        } else {
            (at + timestamps[i + 1]) / 2
        };

        track.push_str(&format!(
            "\n{} --> {}\nthumb_{:03}.jpg\n",
            format_timestamp(cue_start),
            format_timestamp(cue_end),
            i
        ));
    }
    track
}

fn format_timestamp(seconds: u64) -> String {
    format!(
        "{:02}:{:02}:{:02}.000",
        seconds / 3600,
        (seconds % 3600) / 60,
        seconds % 60
    )
}
