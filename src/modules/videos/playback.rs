use crate::common::response::ApiError;
use crate::state::AppState;
use axum::{
    extract::{Path, State},
    http::{header, StatusCode},
    response::{IntoResponse, Redirect, Response},
};
use std::time::Duration;
use tracing::{debug, error};

const SEGMENT_URL_VALIDITY: Duration = Duration::from_secs(60 * 60);

/// Playback proxy: playlists are fetched and rewritten so every URI
/// points back through this endpoint; segments are redirected to a
/// presigned URL so their bytes never pass through this process.
#[utoipa::path(
    get,
    path = "/v1/videos/{video_id}/playback/{asset_path}",
    params(
        ("video_id" = String, Path, description = "Video ID"),
        ("asset_path" = String, Path, description = "Path of the playlist or segment under the video prefix")
    ),
    responses(
        (status = 200, description = "Rewritten playlist"),
        (status = 307, description = "Redirect to presigned segment URL"),
        (status = 400, description = "Unsupported asset type"),
        (status = 404, description = "Playlist not found")
    ),
    tag = "Videos"
)]
pub async fn playback_proxy(
    State(state): State<AppState>,
    Path((video_id, asset_path)): Path<(String, String)>,
) -> Response {
    if !is_playable_asset(&asset_path) {
        return ApiError::bad_request("Invalid asset type").into_response();
    }

    let key = object_key_for_asset(&video_id, &asset_path);

    if asset_path.ends_with(".ts") {
        return match state.storage.presign_get(&key, SEGMENT_URL_VALIDITY).await {
            Ok(url) => Redirect::temporary(&url).into_response(),
            Err(e) => {
                error!("Failed to sign segment URL for '{}': {}", key, e);
                ApiError::internal("Failed to sign segment URL").into_response()
            }
        };
    }

    let bytes = match state.storage.get_object(&key).await {
        Ok(bytes) => bytes,
        Err(e) => {
            error!("S3 GET failed for key '{}': {}", key, e);
            return ApiError::not_found("Playlist not found").into_response();
        }
    };

    // The master grows while the job runs, so players must re-fetch it;
    // media playlists are immutable VOD output.
    let cache_control = if asset_path.ends_with("master.m3u8") {
        debug!(video_id = %video_id, "Serving master playlist with short cache time");
        "max-age=2, must-revalidate"
    } else {
        "max-age=3600"
    };

    let content = String::from_utf8_lossy(&bytes);
    let rewritten = rewrite_playlist(
        &content,
        &state.config.app_base_url,
        &video_id,
        &asset_path,
    );

    (
        StatusCode::OK,
        [
            (header::CONTENT_TYPE, "application/vnd.apple.mpegurl"),
            (header::CACHE_CONTROL, cache_control),
        ],
        rewritten,
    )
        .into_response()
}

pub fn is_playable_asset(asset_path: &str) -> bool {
    asset_path.ends_with(".m3u8") || asset_path.ends_with(".ts")
}

/// Object key for an asset served under a video's playback prefix. Must
/// agree with the keys the encode worker writes.
pub fn object_key_for_asset(video_id: &str, asset_path: &str) -> String {
    format!("{}/{}", video_id, asset_path.trim_start_matches('/'))
}

/// Rewrite every non-comment line of a playlist into a proxy URL
/// resolved against the playlist's own directory. Comments and blank
/// lines pass through verbatim.
pub fn rewrite_playlist(content: &str, base_url: &str, video_id: &str, asset_path: &str) -> String {
    let dir = parent_dir(asset_path.trim_start_matches('/'));

    let mut rewritten = String::with_capacity(content.len() * 2);
    for line in content.lines() {
        if line.starts_with('#') || line.trim().is_empty() {
            rewritten.push_str(line);
        } else {
            let joined = join_asset_path(dir, line);
            rewritten.push_str(&format!(
                "{}/v1/videos/{}/playback/{}",
                base_url, video_id, joined
            ));
        }
        rewritten.push('\n');
    }
    rewritten
}

fn parent_dir(path: &str) -> &str {
    match path.rfind('/') {
        Some(idx) => &path[..idx],
        None => "",
    }
}

/// Join a playlist-relative URI onto its directory and normalize `.`
/// and `..` components.
fn join_asset_path(dir: &str, uri: &str) -> String {
    let mut parts: Vec<&str> = Vec::new();
    for segment in dir.split('/').chain(uri.split('/')) {
        match segment {
            "" | "." => {}
            ".." => {
                parts.pop();
            }
            segment => parts.push(segment),
        }
    }
    parts.join("/")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn rejects_unsupported_extensions() {
        assert!(is_playable_asset("hls/master.m3u8"));
        assert!(is_playable_asset("hls/720p/segment001.ts"));
        assert!(!is_playable_asset("hls/720p/segment001.mp4"));
        assert!(!is_playable_asset("hls/.."));
    }

    #[test]
    fn master_uris_are_rewritten_to_proxy_urls() {
        let out = rewrite_playlist(
            "#EXTM3U\n720p/playlist.m3u8\n",
            "http://localhost:8080",
            "V",
            "hls/master.m3u8",
        );
        assert_eq!(
            out,
            "#EXTM3U\nhttp://localhost:8080/v1/videos/V/playback/hls/720p/playlist.m3u8\n"
        );
    }

    #[test]
    fn segment_uris_resolve_against_playlist_dir() {
        let out = rewrite_playlist(
            "#EXTINF:4.000000,\nsegment001.ts\n",
            "http://localhost:8080",
            "V",
            "hls/720p/playlist.m3u8",
        );
        assert_eq!(
            out,
            "#EXTINF:4.000000,\nhttp://localhost:8080/v1/videos/V/playback/hls/720p/segment001.ts\n"
        );
    }

    #[test]
    fn comments_and_blank_lines_pass_through() {
        let input = "#EXTM3U\n#EXT-X-VERSION:3\n\n#EXT-X-ENDLIST\n";
        let out = rewrite_playlist(input, "http://localhost:8080", "V", "hls/master.m3u8");
        assert_eq!(out, input);
    }

    #[test]
    fn dot_segments_are_normalized() {
        assert_eq!(join_asset_path("hls/720p", "../480p/playlist.m3u8"), "hls/480p/playlist.m3u8");
        assert_eq!(join_asset_path("hls", "./720p/playlist.m3u8"), "hls/720p/playlist.m3u8");
        assert_eq!(join_asset_path("", "master.m3u8"), "master.m3u8");
    }

    #[test]
    fn asset_key_matches_worker_layout() {
        assert_eq!(
            object_key_for_asset("V", "hls/720p/segment001.ts"),
            "V/hls/720p/segment001.ts"
        );
        assert_eq!(
            object_key_for_asset("V", "/hls/master.m3u8"),
            "V/hls/master.m3u8"
        );
    }
}
