use crate::state::AppState;
use axum::routing::get;
use axum::Router;

pub mod dto;
pub mod handler;
pub mod playback;

pub fn router() -> Router<AppState> {
    Router::new()
        .route("/videos/{video_id}", get(handler::get_video_details))
        .route(
            "/videos/{video_id}/playback/{*asset_path}",
            get(playback::playback_proxy),
        )
}
