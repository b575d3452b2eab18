use dotenvy::dotenv;
use mediaflow::config::settings::AppConfig;
use mediaflow::infrastructure::queue::QueueService;
use mediaflow::infrastructure::storage::StorageService;
use mediaflow::workers::encoder;
use std::sync::Arc;
use tokio_util::sync::CancellationToken;
use tracing::info;
use tracing_subscriber::EnvFilter;

#[tokio::main]
async fn main() {
    dotenv().ok();

    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .init();

    info!("Starting encode worker...");

    let config = AppConfig::from_env().expect("missing required environment variables");

    let storage = StorageService::new(
        &config.s3_endpoint,
        &config.s3_bucket,
        &config.s3_access_key_id,
        &config.s3_access_key_secret,
    )
    .await;

    let queue = QueueService::new(&config.redis_url)
        .await
        .expect("failed to connect to Redis");

    let cancel = CancellationToken::new();
    {
        let cancel = cancel.clone();
        tokio::spawn(async move {
            if tokio::signal::ctrl_c().await.is_ok() {
                info!("Shutdown signal received, stopping worker...");
                cancel.cancel();
            }
        });
    }

    encoder::run(queue, Arc::new(storage), cancel).await;
}
