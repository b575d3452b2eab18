use crate::common::response::ApiError;
use crate::modules::uploads::dto::{CreateUploadRequest, CreateUploadResponse};
use crate::state::AppState;
use axum::{extract::State, response::IntoResponse, Json};
use std::time::Duration;
use time::OffsetDateTime;
use tracing::{error, info};
use uuid::Uuid;

const UPLOAD_URL_VALIDITY: Duration = Duration::from_secs(15 * 60);

/// Issue a presigned PUT URL for a new source upload. Stateless: no
/// record of the intent is kept; the video id is minted here and the
/// client carries it forward into the encode job.
#[utoipa::path(
    post,
    path = "/v1/uploads",
    request_body = CreateUploadRequest,
    responses(
        (status = 200, description = "Presigned upload URL", body = CreateUploadResponse),
        (status = 400, description = "Bad Request"),
        (status = 500, description = "Internal Server Error")
    ),
    tag = "Uploads"
)]
pub async fn create_upload(
    State(state): State<AppState>,
    Json(req): Json<CreateUploadRequest>,
) -> impl IntoResponse {
    if req.file_name.trim().is_empty() {
        return ApiError::bad_request("file_name must not be empty").into_response();
    }

    let video_id = Uuid::new_v4().to_string();
    let object_key = format!("{}/source/{}", video_id, req.file_name);

    info!(video_id = %video_id, file_name = %req.file_name, "Creating upload intent");

    let url = match state.storage.presign_put(&object_key, UPLOAD_URL_VALIDITY).await {
        Ok(url) => url,
        Err(e) => {
            error!("Error generating presigned URL: {}", e);
            return ApiError::internal("Failed to generate presigned URL").into_response();
        }
    };

    let expires_at = OffsetDateTime::now_utc() + UPLOAD_URL_VALIDITY;
    let expires_at = (expires_at.unix_timestamp_nanos() / 1_000_000) as i64;

    Json(CreateUploadResponse {
        video_id,
        url,
        expires_at,
    })
    .into_response()
}
