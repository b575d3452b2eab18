use crate::state::AppState;
use axum::routing::post;
use axum::Router;

pub mod dto;
pub mod handler;

pub fn router() -> Router<AppState> {
    Router::new().route("/uploads", post(handler::create_upload))
}
