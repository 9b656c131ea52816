//! Bucket delivery backend.

use async_trait::async_trait;
use std::path::Path;
use std::sync::Arc;
use std::time::Instant;
use tokio::fs;
use tracing::{info, warn};

use crate::storage::ObjectStore;

use super::error::DeliveryError;
use super::traits::DeliveryBackend;
use super::types::Delivery;

/// Delivers artifacts into a second storage bucket.
pub struct BucketDelivery {
    store: Arc<dyn ObjectStore>,
    bucket: String,
    fail_on_overwrite: bool,
}

impl BucketDelivery {
    /// Creates a bucket backend writing through the given storage client.
    pub fn new(store: Arc<dyn ObjectStore>, bucket: impl Into<String>, fail_on_overwrite: bool) -> Self {
        Self {
            store,
            bucket: bucket.into(),
            fail_on_overwrite,
        }
    }

    fn upload_failed(&self, key: &str, source: crate::storage::StorageError) -> DeliveryError {
        DeliveryError::UploadFailed {
            bucket: self.bucket.clone(),
            key: key.to_string(),
            source,
        }
    }
}

#[async_trait]
impl DeliveryBackend for BucketDelivery {
    fn name(&self) -> &str {
        "bucket"
    }

    async fn deliver(&self, artifact: &Path, output_key: &str) -> Result<Delivery, DeliveryError> {
        if self.fail_on_overwrite
            && self
                .store
                .exists(&self.bucket, output_key)
                .await
                .map_err(|e| self.upload_failed(output_key, e))?
        {
            return Err(DeliveryError::DestinationExists {
                destination: format!("{}/{}", self.bucket, output_key),
            });
        }

        let size_bytes = fs::metadata(artifact).await?.len();
        let start = Instant::now();
        self.store
            .upload(artifact, &self.bucket, output_key)
            .await
            .map_err(|e| self.upload_failed(output_key, e))?;

        if let Err(e) = fs::remove_file(artifact).await {
            warn!(
                "failed to remove scratch artifact {}: {}",
                artifact.display(),
                e
            );
        }

        info!(
            "delivered {} ({} bytes) to {}/{}",
            output_key, size_bytes, self.bucket, output_key
        );

        Ok(Delivery {
            output_key: output_key.to_string(),
            destination: format!("{}/{}", self.bucket, output_key),
            size_bytes,
            duration_ms: start.elapsed().as_millis() as u64,
        })
    }

    async fn validate(&self) -> Result<(), DeliveryError> {
        // Bucket reachability is probed on first use; nothing to check
        // locally beyond configuration, which validates at startup.
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::testing::MockObjectStore;
    use tempfile::TempDir;

    async fn artifact(dir: &TempDir, bytes: &[u8]) -> std::path::PathBuf {
        let path = dir.path().join("artifact.jp2");
        fs::write(&path, bytes).await.unwrap();
        path
    }

    #[tokio::test]
    async fn test_deliver_uploads_and_consumes_scratch() {
        let scratch = TempDir::new().unwrap();
        let store = Arc::new(MockObjectStore::new());
        let backend = BucketDelivery::new(store.clone(), "ingest-out", false);

        let path = artifact(&scratch, b"converted").await;
        let delivery = backend.deliver(&path, "0001/1234.jp2").await.unwrap();

        assert_eq!(delivery.size_bytes, 9);
        assert_eq!(
            store.object("ingest-out", "0001/1234.jp2").await.unwrap(),
            b"converted"
        );
        assert!(!path.exists());
    }

    #[tokio::test]
    async fn test_overwrite_guard_refuses_existing_object() {
        let scratch = TempDir::new().unwrap();
        let store = Arc::new(MockObjectStore::new());
        store
            .put_object("ingest-out", "0001/1234.jp2", b"original".to_vec())
            .await;

        let backend = BucketDelivery::new(store.clone(), "ingest-out", true);
        let path = artifact(&scratch, b"replacement").await;
        let err = backend.deliver(&path, "0001/1234.jp2").await.unwrap_err();

        assert!(err.is_overwrite_skip());
        assert_eq!(
            store.object("ingest-out", "0001/1234.jp2").await.unwrap(),
            b"original"
        );
        assert!(path.exists());
    }

    #[tokio::test]
    async fn test_upload_failure_keeps_scratch() {
        let scratch = TempDir::new().unwrap();
        let store = Arc::new(MockObjectStore::new());
        store.fail_uploads(true);

        let backend = BucketDelivery::new(store, "ingest-out", false);
        let path = artifact(&scratch, b"converted").await;
        let err = backend.deliver(&path, "k.jp2").await.unwrap_err();

        assert!(matches!(err, DeliveryError::UploadFailed { .. }));
        assert!(path.exists());
    }
}
