use crate::infrastructure::storage::ObjectStorage;
use crate::modules::jobs::events::EncodeJob;
use crate::workers::master::MasterPublisher;
use crate::workers::probe::{self, ProbeResult};
use crate::workers::renditions::{build_encode_args, plan_ladder, Rendition};
use std::fmt;
use std::future::Future;
use std::path::{Path, PathBuf};
use std::process::Stdio;
use std::sync::Arc;
use tempfile::TempDir;
use tokio::io::AsyncReadExt;
use tokio::process::Command;
use tokio::task::JoinSet;
use tokio_util::sync::CancellationToken;
use tracing::{debug, error, info};

const TARGET_FORMAT_HLS: &str = "hls";
const STDERR_TAIL_BYTES: usize = 1024;

#[derive(Debug)]
pub enum PipelineError {
    /// Object storage GET/PUT failed.
    Transport(anyhow::Error),
    /// Probe failed, no video stream, or the source is unusable.
    BadSource(String),
    /// One or more encoders failed; carries the aggregated detail.
    Encode(String),
    /// Master playlist upload failed.
    Publish(anyhow::Error),
    /// The job-scoped cancellation token fired.
    Cancelled,
    Io(std::io::Error),
}

impl fmt::Display for PipelineError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            PipelineError::Transport(e) => write!(f, "storage transport error: {}", e),
            PipelineError::BadSource(msg) => write!(f, "bad source: {}", msg),
            PipelineError::Encode(msg) => write!(f, "encode failed: {}", msg),
            PipelineError::Publish(e) => write!(f, "master publish failed: {}", e),
            PipelineError::Cancelled => write!(f, "job cancelled"),
            PipelineError::Io(e) => write!(f, "io error: {}", e),
        }
    }
}

impl std::error::Error for PipelineError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            PipelineError::Transport(e) | PipelineError::Publish(e) => Some(e.as_ref()),
            PipelineError::Io(e) => Some(e),
            _ => None,
        }
    }
}

impl From<std::io::Error> for PipelineError {
    fn from(err: std::io::Error) -> Self {
        PipelineError::Io(err)
    }
}

/// Consume one encode job to completion. The scratch directory is
/// removed on every exit path, success or not; objects already written
/// to storage are left in place.
pub async fn handle(
    job: EncodeJob,
    storage: Arc<dyn ObjectStorage>,
    cancel: CancellationToken,
) -> Result<(), PipelineError> {
    EncodingPipeline::new(job, storage)?.run(cancel).await
}

pub struct EncodingPipeline {
    job: EncodeJob,
    storage: Arc<dyn ObjectStorage>,
    scratch: TempDir,
}

impl EncodingPipeline {
    pub fn new(job: EncodeJob, storage: Arc<dyn ObjectStorage>) -> Result<Self, PipelineError> {
        let scratch = tempfile::Builder::new()
            .prefix(&format!("media-{}-", job.video_id))
            .tempdir()?;

        Ok(Self {
            job,
            storage,
            scratch,
        })
    }

    pub fn scratch_path(&self) -> &Path {
        self.scratch.path()
    }

    fn downloaded_path(&self) -> PathBuf {
        self.scratch.path().join(&self.job.input_file)
    }

    fn encoded_root(&self) -> PathBuf {
        self.scratch.path().join("encoded")
    }

    /// Run the pipeline, consuming it. Dropping `self` at the end is
    /// what guarantees scratch removal on every path.
    pub async fn run(self, cancel: CancellationToken) -> Result<(), PipelineError> {
        let video_id = self.job.video_id.clone();
        let result = self.execute(&cancel).await;
        if let Err(e) = &result {
            error!(video_id = %video_id, "Pipeline failed: {}", e);
        }
        result
    }

    async fn execute(&self, cancel: &CancellationToken) -> Result<(), PipelineError> {
        if self.job.target_format != TARGET_FORMAT_HLS {
            return Err(PipelineError::BadSource(format!(
                "unsupported target format '{}'",
                self.job.target_format
            )));
        }

        let video_id = &self.job.video_id;
        let source = self.downloaded_path();

        info!(video_id = %video_id, "Stage [1/3]: downloading source");
        with_cancel(cancel, self.storage.download(&self.job.source_key(), &source)).await?;

        info!(video_id = %video_id, "Stage [2/3]: probing source");
        let probed = tokio::select! {
            _ = cancel.cancelled() => Err(PipelineError::Cancelled),
            probed = probe::probe_source(&source) => probed,
        }?;
        info!(
            video_id = %video_id,
            width = probed.width,
            height = probed.height,
            has_audio = probed.has_audio,
            "Probe complete"
        );

        let ladder = plan_ladder(&self.job.resolutions, probed.height);
        if ladder.is_empty() {
            return Err(PipelineError::BadSource(
                "no eligible renditions for source".to_string(),
            ));
        }
        info!(video_id = %video_id, ladder = ?ladder, "Stage [3/3]: encoding ladder");

        self.encode_all(&ladder, probed, cancel).await
    }

    /// One concurrent encoder task per ladder height. Each task encodes
    /// into its own scratch directory, uploads its playlist and
    /// segments, and only then triggers a master republish, so the
    /// master never references an object that is not yet readable.
    async fn encode_all(
        &self,
        ladder: &[u32],
        probed: ProbeResult,
        cancel: &CancellationToken,
    ) -> Result<(), PipelineError> {
        let publisher = Arc::new(MasterPublisher::new(
            self.storage.clone(),
            &self.job.video_id,
            probed.width,
            probed.height,
        ));

        let mut tasks = JoinSet::new();
        for &height in ladder {
            tasks.spawn(encode_rendition(RenditionContext {
                video_id: self.job.video_id.clone(),
                input: self.downloaded_path(),
                encoded_root: self.encoded_root(),
                height,
                has_audio: probed.has_audio,
                storage: self.storage.clone(),
                publisher: publisher.clone(),
                cancel: cancel.clone(),
            }));
        }

        let mut failures: Vec<String> = Vec::new();
        while let Some(joined) = tasks.join_next().await {
            match joined {
                Ok(Ok(height)) => {
                    info!(video_id = %self.job.video_id, height, "Rendition complete")
                }
                Ok(Err(e)) => failures.push(e.to_string()),
                Err(e) => failures.push(format!("rendition task panicked: {}", e)),
            }
        }

        if !failures.is_empty() {
            return Err(PipelineError::Encode(failures.join("; ")));
        }
        Ok(())
    }
}

struct RenditionContext {
    video_id: String,
    input: PathBuf,
    encoded_root: PathBuf,
    height: u32,
    has_audio: bool,
    storage: Arc<dyn ObjectStorage>,
    publisher: Arc<MasterPublisher>,
    cancel: CancellationToken,
}

async fn encode_rendition(ctx: RenditionContext) -> Result<u32, PipelineError> {
    let rendition_dir = ctx.encoded_root.join("hls").join(format!("{}p", ctx.height));
    tokio::fs::create_dir_all(&rendition_dir).await?;

    let args = build_encode_args(&ctx.input, &rendition_dir, ctx.height, ctx.has_audio);
    debug!(height = ctx.height, "ffmpeg {}", args.join(" "));

    let mut child = Command::new("ffmpeg")
        .args(&args)
        .stdin(Stdio::null())
        .stdout(Stdio::null())
        .stderr(Stdio::piped())
        .kill_on_drop(true)
        .spawn()
        .map_err(|e| {
            PipelineError::Encode(format!("{}p: failed to start ffmpeg: {}", ctx.height, e))
        })?;

    // Drain stderr concurrently so a chatty encoder cannot block on a
    // full pipe; the captured text feeds the failure log.
    let mut stderr = child.stderr.take();
    let stderr_task = tokio::spawn(async move {
        let mut buf = String::new();
        if let Some(stderr) = stderr.as_mut() {
            let _ = stderr.read_to_string(&mut buf).await;
        }
        buf
    });

    let status = tokio::select! {
        _ = ctx.cancel.cancelled() => {
            let _ = child.kill().await;
            return Err(PipelineError::Cancelled);
        }
        status = child.wait() => status.map_err(|e| {
            PipelineError::Encode(format!("{}p: failed to wait for ffmpeg: {}", ctx.height, e))
        })?,
    };

    if !status.success() {
        let captured = stderr_task.await.unwrap_or_default();
        return Err(PipelineError::Encode(format!(
            "{}p: ffmpeg exited with {}: {}",
            ctx.height,
            status,
            tail(captured.trim(), STDERR_TAIL_BYTES)
        )));
    }

    upload_tree(
        ctx.storage.as_ref(),
        &rendition_dir,
        &ctx.encoded_root,
        &ctx.video_id,
        &ctx.cancel,
    )
    .await?;

    ctx.publisher
        .publish(Rendition::for_height(ctx.height))
        .await
        .map_err(PipelineError::Publish)?;

    Ok(ctx.height)
}

/// Upload every regular file under `dir`, keyed by its path relative to
/// the scratch `encoded/` root under the video id. `master.m3u8` is
/// never uploaded by the walk; it is published through the
/// `MasterPublisher` only.
pub(crate) async fn upload_tree(
    storage: &dyn ObjectStorage,
    dir: &Path,
    encoded_root: &Path,
    video_id: &str,
    cancel: &CancellationToken,
) -> Result<(), PipelineError> {
    for file in collect_files(dir)? {
        if file.file_name().is_some_and(|name| name == "master.m3u8") {
            continue;
        }
        let key = object_key_for(video_id, encoded_root, &file).ok_or_else(|| {
            PipelineError::Io(std::io::Error::other(format!(
                "file outside encoded root: {}",
                file.display()
            )))
        })?;
        debug!(key = %key, "Uploading {}", file.display());
        with_cancel(cancel, storage.upload(&file, &key)).await?;
    }
    Ok(())
}

/// Regular files under `dir`, recursively, in sorted order.
pub(crate) fn collect_files(dir: &Path) -> std::io::Result<Vec<PathBuf>> {
    let mut files = Vec::new();
    let mut stack = vec![dir.to_path_buf()];
    while let Some(current) = stack.pop() {
        for entry in std::fs::read_dir(&current)? {
            let entry = entry?;
            if entry.file_type()?.is_dir() {
                stack.push(entry.path());
            } else {
                files.push(entry.path());
            }
        }
    }
    files.sort();
    Ok(files)
}

pub(crate) fn object_key_for(video_id: &str, encoded_root: &Path, file: &Path) -> Option<String> {
    let relative = file.strip_prefix(encoded_root).ok()?;
    let relative = relative
        .components()
        .map(|c| c.as_os_str().to_string_lossy())
        .collect::<Vec<_>>()
        .join("/");
    Some(format!("{}/{}", video_id, relative))
}

async fn with_cancel<T>(
    cancel: &CancellationToken,
    fut: impl Future<Output = anyhow::Result<T>>,
) -> Result<T, PipelineError> {
    tokio::select! {
        _ = cancel.cancelled() => Err(PipelineError::Cancelled),
        result = fut => result.map_err(PipelineError::Transport),
    }
}

fn tail(s: &str, max: usize) -> &str {
    if s.len() <= max {
        return s;
    }
    let mut idx = s.len() - max;
    while !s.is_char_boundary(idx) {
        idx += 1;
    }
    &s[idx..]
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::infrastructure::storage::memory::MemoryStorage;
    use crate::modules::videos::playback::object_key_for_asset;

    fn job(video_id: &str) -> EncodeJob {
        EncodeJob {
            video_id: video_id.to_string(),
            input_file: "movie.mp4".to_string(),
            target_format: "hls".to_string(),
            resolutions: vec![360, 720],
        }
    }

    #[tokio::test]
    async fn scratch_is_removed_when_download_fails() {
        // storage holds no source object, so stage 1 fails
        let storage = Arc::new(MemoryStorage::new());
        let pipeline = EncodingPipeline::new(job("V"), storage).unwrap();
        let scratch = pipeline.scratch_path().to_path_buf();
        assert!(scratch.exists());

        let result = pipeline.run(CancellationToken::new()).await;
        assert!(matches!(result, Err(PipelineError::Transport(_))));
        assert!(!scratch.exists());
    }

    #[tokio::test]
    async fn scratch_is_removed_on_bad_target_format() {
        let storage = Arc::new(MemoryStorage::new());
        let mut bad_job = job("V");
        bad_job.target_format = "dash".to_string();

        let pipeline = EncodingPipeline::new(bad_job, storage).unwrap();
        let scratch = pipeline.scratch_path().to_path_buf();

        let result = pipeline.run(CancellationToken::new()).await;
        assert!(matches!(result, Err(PipelineError::BadSource(_))));
        assert!(!scratch.exists());
    }

    #[tokio::test]
    async fn upload_tree_writes_proxy_compatible_keys_and_skips_master() {
        let scratch = tempfile::tempdir().unwrap();
        let encoded_root = scratch.path().join("encoded");
        let rendition_dir = encoded_root.join("hls").join("720p");
        std::fs::create_dir_all(&rendition_dir).unwrap();
        std::fs::write(rendition_dir.join("segment000.ts"), b"ts0").unwrap();
        std::fs::write(rendition_dir.join("segment001.ts"), b"ts1").unwrap();
        std::fs::write(rendition_dir.join("playlist.m3u8"), b"#EXTM3U\n").unwrap();
        std::fs::write(encoded_root.join("hls").join("master.m3u8"), b"#EXTM3U\n").unwrap();

        let storage = MemoryStorage::new();
        upload_tree(
            &storage,
            &encoded_root,
            &encoded_root,
            "V",
            &CancellationToken::new(),
        )
        .await
        .unwrap();

        assert_eq!(
            storage.keys(),
            vec![
                "V/hls/720p/playlist.m3u8",
                "V/hls/720p/segment000.ts",
                "V/hls/720p/segment001.ts",
            ]
        );

        // the key the worker wrote is the key the proxy derives from the
        // playback URL of the same segment
        assert_eq!(
            object_key_for_asset("V", "hls/720p/segment000.ts"),
            "V/hls/720p/segment000.ts"
        );
    }

    #[test]
    fn object_key_is_relative_to_encoded_root() {
        let root = PathBuf::from("/scratch/encoded");
        let file = root.join("hls").join("360p").join("segment002.ts");
        assert_eq!(
            object_key_for("V", &root, &file).unwrap(),
            "V/hls/360p/segment002.ts"
        );
        assert!(object_key_for("V", &root, Path::new("/elsewhere/file.ts")).is_none());
    }

    #[test]
    fn tail_keeps_the_end() {
        assert_eq!(tail("short", 10), "short");
        assert_eq!(tail("0123456789", 4), "6789");
    }
}
