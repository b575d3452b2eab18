use crate::common::response::ApiError;
use crate::infrastructure::queue::TASK_ENCODE_VIDEO;
use crate::modules::jobs::dto::EnqueueJobResponse;
use crate::modules::jobs::events::EncodeJob;
use crate::state::AppState;
use axum::{extract::State, response::IntoResponse, Json};
use tracing::{error, info};

const TARGET_FORMAT_HLS: &str = "hls";

#[utoipa::path(
    post,
    path = "/v1/jobs/transcoding",
    request_body = EncodeJob,
    responses(
        (status = 200, description = "Job enqueued", body = EnqueueJobResponse),
        (status = 400, description = "Bad Request"),
        (status = 500, description = "Internal Server Error")
    ),
    tag = "Jobs"
)]
pub async fn create_transcoding_job(
    State(state): State<AppState>,
    Json(req): Json<EncodeJob>,
) -> impl IntoResponse {
    if req.video_id.trim().is_empty() || req.input_file.trim().is_empty() {
        return ApiError::bad_request("video_id and input_file are required").into_response();
    }
    if req.target_format != TARGET_FORMAT_HLS {
        return ApiError::bad_request("Only the hls target format is supported").into_response();
    }
    if req.resolutions.is_empty() {
        return ApiError::bad_request("resolutions must not be empty").into_response();
    }

    let payload = match serde_json::to_value(&req) {
        Ok(payload) => payload,
        Err(e) => {
            error!("Failed to serialize job payload: {}", e);
            return ApiError::internal("Failed to create task").into_response();
        }
    };

    match state.queue.enqueue(TASK_ENCODE_VIDEO, payload).await {
        Ok(task_id) => {
            info!(video_id = %req.video_id, task_id = %task_id, "Enqueued encode job");
            Json(EnqueueJobResponse {
                message: "Encoding job has been queued".to_string(),
                task_id,
            })
            .into_response()
        }
        Err(e) => {
            error!("Failed to enqueue task: {}", e);
            ApiError::internal("Failed to enqueue task").into_response()
        }
    }
}
