pub mod redis;

pub use redis::{QueueService, QueuedTask, TASK_ENCODE_VIDEO};
