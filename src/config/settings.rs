use crate::config::env::{self, EnvKey};
use serde::Deserialize;

#[derive(Clone, Debug, Deserialize)]
pub struct AppConfig {
    pub server_port: u16,
    pub redis_url: String,
    pub s3_bucket: String,
    pub s3_endpoint: String,
    pub s3_access_key_id: String,
    pub s3_access_key_secret: String,
    pub app_base_url: String,
    pub cors_allowed_origin: String,
}

impl AppConfig {
    pub fn from_env() -> Result<Self, std::env::VarError> {
        Ok(Self {
            server_port: env::get_parsed(EnvKey::ServerPort, 8080),
            redis_url: env::get(EnvKey::RedisUrl)?,
            s3_bucket: env::get(EnvKey::S3BucketName)?,
            s3_endpoint: env::get(EnvKey::S3Endpoint)?,
            s3_access_key_id: env::get(EnvKey::S3AccessKeyId)?,
            s3_access_key_secret: env::get(EnvKey::S3AccessKeySecret)?,
            app_base_url: env::get_or(EnvKey::AppBaseUrl, "http://localhost:8080"),
            cors_allowed_origin: env::get_or(EnvKey::CorsAllowedOrigin, "http://localhost:3000"),
        })
    }
}
