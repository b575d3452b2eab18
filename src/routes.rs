use crate::state::AppState;
use axum::routing::get;
use axum::{Json, Router};
use utoipa::OpenApi;

pub fn configure_routes() -> Router<AppState> {
    Router::new()
        .route("/health", get(|| async { "ok" }))
        .route("/api-docs/openapi.json", get(openapi))
        .nest("/v1", v1_routes())
}

fn v1_routes() -> Router<AppState> {
    Router::new()
        .merge(crate::modules::uploads::router())
        .merge(crate::modules::jobs::router())
        .merge(crate::modules::videos::router())
}

async fn openapi() -> Json<utoipa::openapi::OpenApi> {
    Json(crate::docs::ApiDoc::openapi())
}
