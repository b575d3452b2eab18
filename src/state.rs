use crate::config::settings::AppConfig;
use crate::infrastructure::queue::QueueService;
use crate::infrastructure::storage::StorageService;

#[derive(Clone)]
pub struct AppState {
    pub config: AppConfig,
    pub storage: StorageService,
    pub queue: QueueService,
}

impl AppState {
    pub fn new(config: AppConfig, storage: StorageService, queue: QueueService) -> Self {
        Self {
            config,
            storage,
            queue,
        }
    }
}
