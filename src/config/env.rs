use std::env;
use std::str::FromStr;

pub enum EnvKey {
    ServerPort,
    RedisUrl,
    S3BucketName,
    S3Endpoint,
    S3AccessKeyId,
    S3AccessKeySecret,
    AppBaseUrl,
    CorsAllowedOrigin,
}

impl EnvKey {
    pub fn as_str(&self) -> &'static str {
        match self {
            EnvKey::ServerPort => "APP_PORT",
            EnvKey::RedisUrl => "REDIS_URL",
            EnvKey::S3BucketName => "S3_BUCKET_NAME",
            EnvKey::S3Endpoint => "S3_ENDPOINT",
            EnvKey::S3AccessKeyId => "S3_ACCESS_KEY_ID",
            EnvKey::S3AccessKeySecret => "S3_ACCESS_KEY_SECRET",
            EnvKey::AppBaseUrl => "APP_BASE_URL",
            EnvKey::CorsAllowedOrigin => "CORS_ALLOWED_ORIGIN",
        }
    }
}

pub fn get(key: EnvKey) -> Result<String, env::VarError> {
    env::var(key.as_str())
}

pub fn get_or(key: EnvKey, default: &str) -> String {
    env::var(key.as_str()).unwrap_or_else(|_| default.to_string())
}

pub fn get_parsed<T: FromStr>(key: EnvKey, default: T) -> T {
    match get(key) {
        Ok(val) => val.parse::<T>().unwrap_or(default),
        Err(_) => default,
    }
}
