use crate::common::response::ErrorBody;
use crate::modules::jobs::dto::EnqueueJobResponse;
use crate::modules::jobs::events::EncodeJob;
use crate::modules::uploads::dto::{CreateUploadRequest, CreateUploadResponse};
use crate::modules::videos::dto::VideoDetailsResponse;
use utoipa::OpenApi;

#[derive(OpenApi)]
#[openapi(
    paths(
        crate::modules::uploads::handler::create_upload,
        crate::modules::jobs::handler::create_transcoding_job,
        crate::modules::videos::handler::get_video_details,
        crate::modules::videos::playback::playback_proxy,
    ),
    components(
        schemas(
            CreateUploadRequest,
            CreateUploadResponse,
            EncodeJob,
            EnqueueJobResponse,
            VideoDetailsResponse,
            ErrorBody
        )
    ),
    tags(
        (name = "Uploads", description = "Source upload intents"),
        (name = "Jobs", description = "Transcoding job queue"),
        (name = "Videos", description = "Video details and playback")
    )
)]
pub struct ApiDoc;
