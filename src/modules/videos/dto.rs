use serde::Serialize;
use utoipa::ToSchema;

#[derive(Debug, Serialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct VideoDetailsResponse {
    pub video_id: String,
    pub status: String,
    pub title: String,
    pub playback_url: String,
}
