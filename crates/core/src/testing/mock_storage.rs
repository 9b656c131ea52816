//! Mock object store for testing.

use async_trait::async_trait;
use std::collections::HashMap;
use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::sync::Arc;
use tokio::fs;
use tokio::sync::RwLock;
use uuid::Uuid;

use crate::storage::{ObjectStore, StorageError};

/// Mock implementation of the `ObjectStore` trait backed by an in-memory
/// object map.
#[derive(Clone, Default)]
pub struct MockObjectStore {
    objects: Arc<RwLock<HashMap<(String, String), Vec<u8>>>>,
    deleted: Arc<RwLock<Vec<(String, String)>>>,
    fail_uploads: Arc<AtomicBool>,
    fail_deletes: Arc<AtomicBool>,
    download_calls: Arc<AtomicUsize>,
}

impl MockObjectStore {
    /// Creates an empty mock store.
    pub fn new() -> Self {
        Self::default()
    }

    /// Seeds an object.
    pub async fn put_object(&self, bucket: &str, key: &str, bytes: Vec<u8>) {
        self.objects
            .write()
            .await
            .insert((bucket.to_string(), key.to_string()), bytes);
    }

    /// Reads an object back, if present.
    pub async fn object(&self, bucket: &str, key: &str) -> Option<Vec<u8>> {
        self.objects
            .read()
            .await
            .get(&(bucket.to_string(), key.to_string()))
            .cloned()
    }

    /// (bucket, key) pairs deleted so far.
    pub async fn deleted(&self) -> Vec<(String, String)> {
        self.deleted.read().await.clone()
    }

    /// Number of download calls made.
    pub fn download_calls(&self) -> usize {
        self.download_calls.load(Ordering::SeqCst)
    }

    /// Makes every upload fail.
    pub fn fail_uploads(&self, fail: bool) {
        self.fail_uploads.store(fail, Ordering::SeqCst);
    }

    /// Makes every delete fail.
    pub fn fail_deletes(&self, fail: bool) {
        self.fail_deletes.store(fail, Ordering::SeqCst);
    }
}

#[async_trait]
impl ObjectStore for MockObjectStore {
    fn name(&self) -> &str {
        "mock"
    }

    async fn download(
        &self,
        bucket: &str,
        key: &str,
        expected_size: u64,
        scratch_dir: &Path,
    ) -> Result<PathBuf, StorageError> {
        self.download_calls.fetch_add(1, Ordering::SeqCst);

        let bytes = self
            .object(bucket, key)
            .await
            .ok_or_else(|| StorageError::NotFound {
                bucket: bucket.to_string(),
                key: key.to_string(),
            })?;

        if bytes.len() as u64 != expected_size {
            return Err(StorageError::SizeMismatch {
                bucket: bucket.to_string(),
                key: key.to_string(),
                expected: expected_size,
                actual: bytes.len() as u64,
            });
        }

        let extension = key
            .rsplit('/')
            .next()
            .and_then(|name| name.rsplit_once('.'))
            .map(|(_, ext)| format!(".{}", ext))
            .unwrap_or_default();
        let local = scratch_dir.join(format!("{}{}", Uuid::new_v4(), extension));
        fs::write(&local, &bytes).await?;
        Ok(local)
    }

    async fn upload(&self, local: &Path, bucket: &str, key: &str) -> Result<(), StorageError> {
        if self.fail_uploads.load(Ordering::SeqCst) {
            return Err(StorageError::request_failed(500, "mock upload failure"));
        }

        let bytes = fs::read(local).await?;
        self.put_object(bucket, key, bytes).await;
        Ok(())
    }

    async fn delete(&self, bucket: &str, key: &str) -> Result<(), StorageError> {
        if self.fail_deletes.load(Ordering::SeqCst) {
            return Err(StorageError::request_failed(500, "mock delete failure"));
        }

        self.objects
            .write()
            .await
            .remove(&(bucket.to_string(), key.to_string()));
        self.deleted
            .write()
            .await
            .push((bucket.to_string(), key.to_string()));
        Ok(())
    }

    async fn exists(&self, bucket: &str, key: &str) -> Result<bool, StorageError> {
        Ok(self.object(bucket, key).await.is_some())
    }
}
