use anyhow::Result;
use async_trait::async_trait;
use bytes::Bytes;
use std::path::Path;

pub mod s3;

pub use s3::StorageService;

/// Capability surface the encode worker needs from object storage.
///
/// `StorageService` is the production implementation; tests substitute an
/// in-memory store.
#[async_trait]
pub trait ObjectStorage: Send + Sync {
    /// Download an object to a local path.
    async fn download(&self, key: &str, local_path: &Path) -> Result<()>;

    /// Upload a local file under the given key.
    async fn upload(&self, local_path: &Path, key: &str) -> Result<()>;

    /// Put an in-memory body under the given key.
    async fn put_bytes(&self, key: &str, body: Bytes) -> Result<()>;
}

#[cfg(test)]
pub mod memory {
    use super::ObjectStorage;
    use anyhow::{anyhow, Result};
    use async_trait::async_trait;
    use bytes::Bytes;
    use std::collections::HashMap;
    use std::path::Path;
    use std::sync::Mutex;

    /// In-memory object store recording every put, in order.
    #[derive(Default)]
    pub struct MemoryStorage {
        objects: Mutex<HashMap<String, Vec<u8>>>,
        history: Mutex<Vec<(String, Vec<u8>)>>,
    }

    impl MemoryStorage {
        pub fn new() -> Self {
            Self::default()
        }

        pub fn with_object(self, key: &str, body: &[u8]) -> Self {
            self.objects
                .lock()
                .unwrap()
                .insert(key.to_string(), body.to_vec());
            self
        }

        pub fn get(&self, key: &str) -> Option<Vec<u8>> {
            self.objects.lock().unwrap().get(key).cloned()
        }

        pub fn keys(&self) -> Vec<String> {
            let mut keys: Vec<String> = self.objects.lock().unwrap().keys().cloned().collect();
            keys.sort();
            keys
        }

        /// Every body ever written for `key`, oldest first.
        pub fn puts_for(&self, key: &str) -> Vec<Vec<u8>> {
            self.history
                .lock()
                .unwrap()
                .iter()
                .filter(|(k, _)| k == key)
                .map(|(_, body)| body.clone())
                .collect()
        }

        fn record(&self, key: &str, body: Vec<u8>) {
            self.history
                .lock()
                .unwrap()
                .push((key.to_string(), body.clone()));
            self.objects.lock().unwrap().insert(key.to_string(), body);
        }
    }

    #[async_trait]
    impl ObjectStorage for MemoryStorage {
        async fn download(&self, key: &str, local_path: &Path) -> Result<()> {
            let body = self
                .get(key)
                .ok_or_else(|| anyhow!("no such object: {}", key))?;
            tokio::fs::write(local_path, body).await?;
            Ok(())
        }

        async fn upload(&self, local_path: &Path, key: &str) -> Result<()> {
            let body = tokio::fs::read(local_path).await?;
            self.record(key, body);
            Ok(())
        }

        async fn put_bytes(&self, key: &str, body: Bytes) -> Result<()> {
            self.record(key, body.to_vec());
            Ok(())
        }
    }
}
