use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

#[derive(Debug, Deserialize, ToSchema)]
pub struct CreateUploadRequest {
    pub file_name: String,
}

#[derive(Debug, Serialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct CreateUploadResponse {
    pub video_id: String,
    pub url: String,
    /// Expiry of the presigned URL, milliseconds since epoch.
    pub expires_at: i64,
}
