use crate::state::AppState;
use axum::routing::post;
use axum::Router;

pub mod dto;
pub mod events;
pub mod handler;

pub fn router() -> Router<AppState> {
    Router::new().route("/jobs/transcoding", post(handler::create_transcoding_job))
}
