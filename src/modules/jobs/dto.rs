use serde::Serialize;
use utoipa::ToSchema;

#[derive(Debug, Serialize, ToSchema)]
pub struct EnqueueJobResponse {
    pub message: String,
    pub task_id: String,
}
