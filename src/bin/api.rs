use dotenvy::dotenv;
use mediaflow::app;
use mediaflow::config::settings::AppConfig;
use mediaflow::infrastructure::queue::QueueService;
use mediaflow::infrastructure::storage::StorageService;
use mediaflow::state::AppState;
use tracing::info;
use tracing_subscriber::EnvFilter;

#[tokio::main]
async fn main() {
    dotenv().ok();

    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .init();

    info!("Starting API server...");

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

    let addr = format!("0.0.0.0:{}", config.server_port);
    let state = AppState::new(config, storage, queue);
    let app = app::create_app(state);

    let listener = tokio::net::TcpListener::bind(&addr)
        .await
        .expect("failed to bind listener");
    info!("Server running on http://{}", addr);

    axum::serve(listener, app).await.expect("server error");
}
