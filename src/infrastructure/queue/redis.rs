use anyhow::Result;
use redis::{aio::MultiplexedConnection, AsyncCommands, Client};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use tracing::info;
use uuid::Uuid;

/// Task type identifier for video encode jobs.
pub const TASK_ENCODE_VIDEO: &str = "task:encode_video";

const TASK_QUEUE_KEY: &str = "mediaflow:tasks:encode";

/// Envelope pushed onto the task list. Encoding is expensive and partial
/// uploads are acceptable to leave behind, so tasks carry `max_retry: 0`
/// and a failed job is dead.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct QueuedTask {
    pub id: String,
    #[serde(rename = "type")]
    pub task_type: String,
    pub payload: Value,
    pub max_retry: u32,
}

#[derive(Clone)]
pub struct QueueService {
    client: Client,
}

impl QueueService {
    pub async fn new(connection_string: &str) -> Result<Self> {
        let client = Client::open(connection_string)?;

        // Test connection
        let _conn = client.get_multiplexed_async_connection().await?;

        info!("✅ Connected to Redis");
        Ok(Self { client })
    }

    async fn conn(&self) -> Result<MultiplexedConnection> {
        Ok(self.client.get_multiplexed_async_connection().await?)
    }

    /// Push a task onto the queue and return its id.
    pub async fn enqueue(&self, task_type: &str, payload: Value) -> Result<String> {
        let task = QueuedTask {
            id: Uuid::new_v4().to_string(),
            task_type: task_type.to_string(),
            payload,
            max_retry: 0,
        };
        let json = serde_json::to_string(&task)?;

        let mut conn = self.conn().await?;
        conn.lpush::<_, _, ()>(TASK_QUEUE_KEY, json).await?;

        Ok(task.id)
    }

    /// Pop the next task, blocking up to `timeout_secs`. Returns `None`
    /// on timeout so callers can check for shutdown between waits.
    pub async fn dequeue(&self, timeout_secs: f64) -> Result<Option<QueuedTask>> {
        let mut conn = self.conn().await?;

        let result: Option<(String, String)> = conn.brpop(TASK_QUEUE_KEY, timeout_secs).await?;
        match result {
            Some((_, json)) => Ok(Some(serde_json::from_str(&json)?)),
            None => Ok(None),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn task_envelope_wire_format() {
        let task = QueuedTask {
            id: "t-1".to_string(),
            task_type: TASK_ENCODE_VIDEO.to_string(),
            payload: serde_json::json!({"video_id": "v"}),
            max_retry: 0,
        };

        let json: Value = serde_json::from_str(&serde_json::to_string(&task).unwrap()).unwrap();
        assert_eq!(json["type"], "task:encode_video");
        assert_eq!(json["max_retry"], 0);
        assert_eq!(json["payload"]["video_id"], "v");
    }
}
