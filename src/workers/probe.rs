use crate::workers::pipeline::PipelineError;
use serde_json::Value;
use std::path::Path;
use std::process::Stdio;
use tokio::process::Command;

/// Dimensions of the first video stream and whether any audio stream
/// exists.
#[derive(Debug, Clone, Copy)]
pub struct ProbeResult {
    pub width: u32,
    pub height: u32,
    pub has_audio: bool,
}

/// Probe the downloaded source with ffprobe.
pub async fn probe_source(input: &Path) -> Result<ProbeResult, PipelineError> {
    let output = Command::new("ffprobe")
        .args(["-v", "error", "-print_format", "json", "-show_format", "-show_streams"])
        .arg(input)
        .stdin(Stdio::null())
        .stdout(Stdio::piped())
        .stderr(Stdio::piped())
        .output()
        .await
        .map_err(|e| PipelineError::BadSource(format!("failed to run ffprobe: {}", e)))?;

    if !output.status.success() {
        return Err(PipelineError::BadSource(format!(
            "ffprobe exited with {}: {}",
            output.status,
            String::from_utf8_lossy(&output.stderr).trim()
        )));
    }

    parse_probe_output(&String::from_utf8_lossy(&output.stdout))
}

/// Walk ffprobe's untyped JSON. Only the first video stream's
/// dimensions and the presence of any audio stream matter; every other
/// field and stream kind is ignored.
pub fn parse_probe_output(json: &str) -> Result<ProbeResult, PipelineError> {
    let value: Value = serde_json::from_str(json)
        .map_err(|e| PipelineError::BadSource(format!("unreadable ffprobe output: {}", e)))?;

    let streams = value
        .get("streams")
        .and_then(Value::as_array)
        .ok_or_else(|| PipelineError::BadSource("no streams in ffprobe output".to_string()))?;

    let mut video: Option<(u32, u32)> = None;
    let mut has_audio = false;

    for stream in streams {
        match stream.get("codec_type").and_then(Value::as_str) {
            Some("video") => {
                if video.is_none() {
                    let width = stream.get("width").and_then(Value::as_u64).unwrap_or(0);
                    let height = stream.get("height").and_then(Value::as_u64).unwrap_or(0);
                    video = Some((width as u32, height as u32));
                }
            }
            Some("audio") => has_audio = true,
            _ => {}
        }
    }

    match video {
        Some((width, height)) if width > 0 && height > 0 => Ok(ProbeResult {
            width,
            height,
            has_audio,
        }),
        Some(_) => Err(PipelineError::BadSource(
            "video stream has no usable dimensions".to_string(),
        )),
        None => Err(PipelineError::BadSource(
            "no video stream found in file".to_string(),
        )),
    }
}
