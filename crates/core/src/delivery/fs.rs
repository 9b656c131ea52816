//! Filesystem delivery backend.

use async_trait::async_trait;
use std::path::{Path, PathBuf};
use std::time::Instant;
use tokio::fs;
use tracing::{info, warn};

use super::error::DeliveryError;
use super::traits::DeliveryBackend;
use super::types::Delivery;

/// Delivers artifacts into a directory tree under a configured root.
pub struct FsDelivery {
    root: PathBuf,
    fail_on_overwrite: bool,
}

impl FsDelivery {
    /// Creates a filesystem backend rooted at `root`.
    pub fn new(root: impl Into<PathBuf>, fail_on_overwrite: bool) -> Self {
        Self {
            root: root.into(),
            fail_on_overwrite,
        }
    }
}

#[async_trait]
impl DeliveryBackend for FsDelivery {
    fn name(&self) -> &str {
        "fs"
    }

    async fn deliver(&self, artifact: &Path, output_key: &str) -> Result<Delivery, DeliveryError> {
        let destination = self.root.join(output_key);

        if self.fail_on_overwrite && fs::try_exists(&destination).await? {
            return Err(DeliveryError::DestinationExists {
                destination: destination.display().to_string(),
            });
        }

        // Pre-existing directories are expected under redelivery.
        if let Some(parent) = destination.parent() {
            fs::create_dir_all(parent)
                .await
                .map_err(|e| DeliveryError::DirectoryCreationFailed {
                    path: parent.to_path_buf(),
                    source: e,
                })?;
        }

        let start = Instant::now();
        // Copy, never rename: the scratch area and the output root may live
        // on different devices.
        let size_bytes = fs::copy(artifact, &destination).await.map_err(|e| {
            DeliveryError::copy_failed(artifact.to_path_buf(), destination.clone(), e)
        })?;

        if let Err(e) = fs::remove_file(artifact).await {
            warn!(
                "failed to remove scratch artifact {}: {}",
                artifact.display(),
                e
            );
        }

        info!(
            "delivered {} ({} bytes) to {}",
            output_key,
            size_bytes,
            destination.display()
        );

        Ok(Delivery {
            output_key: output_key.to_string(),
            destination: destination.display().to_string(),
            size_bytes,
            duration_ms: start.elapsed().as_millis() as u64,
        })
    }

    async fn validate(&self) -> Result<(), DeliveryError> {
        fs::create_dir_all(&self.root)
            .await
            .map_err(|e| DeliveryError::DirectoryCreationFailed {
                path: self.root.clone(),
                source: e,
            })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    async fn scratch_artifact(dir: &TempDir, name: &str, bytes: &[u8]) -> PathBuf {
        let path = dir.path().join(name);
        fs::write(&path, bytes).await.unwrap();
        path
    }

    #[tokio::test]
    async fn test_deliver_creates_tree_and_consumes_scratch() {
        let scratch = TempDir::new().unwrap();
        let root = TempDir::new().unwrap();
        let artifact = scratch_artifact(&scratch, "a.jp2", b"artifact bytes").await;

        let backend = FsDelivery::new(root.path(), false);
        let delivery = backend.deliver(&artifact, "0001/1234.jp2").await.unwrap();

        assert_eq!(delivery.size_bytes, 14);
        let delivered = root.path().join("0001/1234.jp2");
        assert_eq!(fs::read(&delivered).await.unwrap(), b"artifact bytes");
        // Scratch copy is consumed.
        assert!(!artifact.exists());
    }

    #[tokio::test]
    async fn test_redelivery_is_idempotent_without_guard() {
        let scratch = TempDir::new().unwrap();
        let root = TempDir::new().unwrap();
        let backend = FsDelivery::new(root.path(), false);

        let first = scratch_artifact(&scratch, "a.jp2", b"same bytes").await;
        backend.deliver(&first, "x/y.jp2").await.unwrap();

        let second = scratch_artifact(&scratch, "b.jp2", b"same bytes").await;
        backend.deliver(&second, "x/y.jp2").await.unwrap();

        assert_eq!(
            fs::read(root.path().join("x/y.jp2")).await.unwrap(),
            b"same bytes"
        );
    }

    #[tokio::test]
    async fn test_overwrite_guard_refuses_and_keeps_existing_bytes() {
        let scratch = TempDir::new().unwrap();
        let root = TempDir::new().unwrap();
        let backend = FsDelivery::new(root.path(), true);

        let existing = root.path().join("x/y.jp2");
        fs::create_dir_all(existing.parent().unwrap()).await.unwrap();
        fs::write(&existing, b"original").await.unwrap();

        let artifact = scratch_artifact(&scratch, "a.jp2", b"replacement").await;
        let err = backend.deliver(&artifact, "x/y.jp2").await.unwrap_err();

        assert!(err.is_overwrite_skip());
        assert_eq!(fs::read(&existing).await.unwrap(), b"original");
        // On refusal the scratch artifact is left for the caller.
        assert!(artifact.exists());
    }

    #[tokio::test]
    async fn test_guard_disabled_overwrites() {
        let scratch = TempDir::new().unwrap();
        let root = TempDir::new().unwrap();
        let backend = FsDelivery::new(root.path(), false);

        let existing = root.path().join("y.jp2");
        fs::write(&existing, b"old").await.unwrap();

        let artifact = scratch_artifact(&scratch, "a.jp2", b"new").await;
        backend.deliver(&artifact, "y.jp2").await.unwrap();
        assert_eq!(fs::read(&existing).await.unwrap(), b"new");
    }

    #[tokio::test]
    async fn test_validate_creates_root() {
        let base = TempDir::new().unwrap();
        let root = base.path().join("deep/output/root");
        let backend = FsDelivery::new(&root, false);
        backend.validate().await.unwrap();
        assert!(root.is_dir());
    }
}
