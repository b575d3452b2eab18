use crate::modules::videos::dto::VideoDetailsResponse;
use crate::state::AppState;
use axum::{
    extract::{Path, State},
    response::IntoResponse,
    Json,
};

/// Video details. There is no metadata store; status and title are
/// mocked and only the playback URL is real.
#[utoipa::path(
    get,
    path = "/v1/videos/{video_id}",
    params(
        ("video_id" = String, Path, description = "Video ID")
    ),
    responses(
        (status = 200, description = "Video details", body = VideoDetailsResponse)
    ),
    tag = "Videos"
)]
pub async fn get_video_details(
    State(state): State<AppState>,
    Path(video_id): Path<String>,
) -> impl IntoResponse {
    let playback_url = format!(
        "{}/v1/videos/{}/playback/hls/master.m3u8",
        state.config.app_base_url, video_id
    );

    Json(VideoDetailsResponse {
        video_id,
        status: "PROCESSED".to_string(),
        title: "My Awesome Video".to_string(),
        playback_url,
    })
}
