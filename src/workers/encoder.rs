use crate::infrastructure::queue::{QueueService, TASK_ENCODE_VIDEO};
use crate::infrastructure::storage::ObjectStorage;
use crate::modules::jobs::events::EncodeJob;
use crate::workers::pipeline;
use std::sync::Arc;
use tokio::time::{sleep, Duration};
use tokio_util::sync::CancellationToken;
use tracing::{error, info, warn};

const DEQUEUE_TIMEOUT_SECS: f64 = 5.0;

/// Consume encode tasks until cancelled. One job at a time per worker
/// process; parallelism lives inside a job (one encoder per rendition),
/// and operators scale by running more workers.
pub async fn run(queue: QueueService, storage: Arc<dyn ObjectStorage>, cancel: CancellationToken) {
    info!("🎥 Encode worker listening for jobs");

    loop {
        let task = tokio::select! {
            _ = cancel.cancelled() => break,
            task = queue.dequeue(DEQUEUE_TIMEOUT_SECS) => task,
        };

        let task = match task {
            Ok(Some(task)) => task,
            Ok(None) => continue,
            Err(e) => {
                error!("Error dequeuing task: {}", e);
                sleep(Duration::from_secs(2)).await;
                continue;
            }
        };

        if task.task_type != TASK_ENCODE_VIDEO {
            warn!(task_type = %task.task_type, task_id = %task.id, "Skipping unknown task type");
            continue;
        }

        let job: EncodeJob = match serde_json::from_value(task.payload) {
            Ok(job) => job,
            Err(e) => {
                error!(task_id = %task.id, "Failed to parse job payload: {}", e);
                continue;
            }
        };

        info!(video_id = %job.video_id, task_id = %task.id, "Starting encode job");

        // Tasks carry max_retry 0; a failed job is logged and dropped.
        match pipeline::handle(job.clone(), storage.clone(), cancel.child_token()).await {
            Ok(()) => info!(video_id = %job.video_id, task_id = %task.id, "✅ Job completed"),
            Err(e) => error!(video_id = %job.video_id, task_id = %task.id, "❌ Job failed: {}", e),
        }
    }

    info!("Encode worker stopped");
}
