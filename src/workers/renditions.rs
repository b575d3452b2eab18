use std::path::Path;

/// One encoded variant of a source at a specific height.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Rendition {
    pub height: u32,
    /// Peak bandwidth in bits/sec, as advertised in the master playlist.
    pub bandwidth: u32,
    /// Playlist location relative to the `hls/` prefix.
    pub playlist_path: String,
}

impl Rendition {
    pub fn for_height(height: u32) -> Self {
        Self {
            height,
            bandwidth: bandwidth_for_height(height),
            playlist_path: format!("{}p/playlist.m3u8", height),
        }
    }
}

pub fn choose_video_bitrate(height: u32) -> &'static str {
    match height {
        h if h >= 1080 => "5000k",
        h if h >= 720 => "2800k",
        h if h >= 480 => "1400k",
        h if h >= 360 => "800k",
        _ => "400k",
    }
}

pub fn choose_audio_bitrate(height: u32) -> &'static str {
    if height >= 720 {
        "128k"
    } else {
        "96k"
    }
}

pub fn bandwidth_for_height(height: u32) -> u32 {
    match height {
        h if h >= 1080 => 5_000_000,
        h if h >= 720 => 2_800_000,
        h if h >= 480 => 1_400_000,
        h if h >= 360 => 800_000,
        _ => 400_000,
    }
}

/// Plan the rendition ladder: requested heights capped at the source
/// height, the source height itself always included, ascending and
/// deduplicated.
pub fn plan_ladder(requested: &[u32], source_height: u32) -> Vec<u32> {
    let mut ladder: Vec<u32> = requested
        .iter()
        .copied()
        .filter(|&h| h <= source_height)
        .collect();
    ladder.push(source_height);
    ladder.sort_unstable();
    ladder.dedup();
    ladder
}

/// Width the `scale=-2:h` filter produces for a target height, from the
/// source aspect ratio, rounded to even.
pub fn scaled_width(source_width: u32, source_height: u32, height: u32) -> u32 {
    let width = source_width as f64 * height as f64 / source_height as f64;
    ((width / 2.0).round() as u32) * 2
}

/// Full ffmpeg argument list for one rendition. The encoder writes only
/// into `rendition_dir`; nothing touches object storage here.
pub fn build_encode_args(
    input: &Path,
    rendition_dir: &Path,
    height: u32,
    has_audio: bool,
) -> Vec<String> {
    let mut args: Vec<String> = vec![
        "-hide_banner".into(),
        "-y".into(),
        "-i".into(),
        input.display().to_string(),
        "-c:v".into(),
        "libx264".into(),
        "-b:v".into(),
        choose_video_bitrate(height).into(),
        "-profile:v".into(),
        "main".into(),
        "-pix_fmt".into(),
        "yuv420p".into(),
        "-vf".into(),
        format!("scale=-2:{}", height),
        // Fixed GOP so segment boundaries line up across renditions
        "-sc_threshold".into(),
        "0".into(),
        "-g".into(),
        "48".into(),
        "-keyint_min".into(),
        "48".into(),
    ];

    if has_audio {
        args.extend([
            "-c:a".into(),
            "aac".into(),
            "-b:a".into(),
            choose_audio_bitrate(height).into(),
            "-map".into(),
            "0:v:0".into(),
            "-map".into(),
            "0:a:0".into(),
        ]);
    } else {
        args.extend(["-map".into(), "0:v:0".into()]);
    }

    args.extend([
        "-f".into(),
        "hls".into(),
        "-hls_time".into(),
        "4".into(),
        "-hls_playlist_type".into(),
        "vod".into(),
        "-hls_list_size".into(),
        "0".into(),
        "-hls_segment_filename".into(),
        rendition_dir.join("segment%03d.ts").display().to_string(),
        rendition_dir.join("playlist.m3u8").display().to_string(),
    ]);

    args
}
