use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

/// Queue payload for one encode job. Field names are the wire contract
/// shared with the worker; `video_id` must match the prefix the source
/// was uploaded under.
#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct EncodeJob {
    pub video_id: String,
    pub input_file: String,
    pub target_format: String,
    /// Requested rendition heights in pixels. Duplicates are tolerated
    /// and deduplicated when the ladder is planned.
    pub resolutions: Vec<u32>,
}

impl EncodeJob {
    /// Object key the source was uploaded under.
    pub fn source_key(&self) -> String {
        format!("{}/source/{}", self.video_id, self.input_file)
    }
}
