//! Mock delivery backend for testing.

use async_trait::async_trait;
use std::collections::HashSet;
use std::path::Path;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use tokio::fs;
use tokio::sync::RwLock;

use crate::delivery::{Delivery, DeliveryBackend, DeliveryError};

/// Mock implementation of the `DeliveryBackend` trait.
///
/// Records (output key, artifact bytes) pairs and consumes the scratch
/// artifact on success, like the real backends.
#[derive(Clone, Default)]
pub struct MockDeliveryBackend {
    delivered: Arc<RwLock<Vec<(String, Vec<u8>)>>>,
    existing: Arc<RwLock<HashSet<String>>>,
    fail_always: Arc<AtomicBool>,
}

impl MockDeliveryBackend {
    /// Creates a mock backend.
    pub fn new() -> Self {
        Self::default()
    }

    /// Marks an output key as already present, triggering the overwrite
    /// guard on delivery.
    pub async fn mark_existing(&self, output_key: &str) {
        self.existing.write().await.insert(output_key.to_string());
    }

    /// Makes every delivery fail.
    pub fn fail_always(&self, fail: bool) {
        self.fail_always.store(fail, Ordering::SeqCst);
    }

    /// Deliveries recorded so far, in order.
    pub async fn delivered(&self) -> Vec<(String, Vec<u8>)> {
        self.delivered.read().await.clone()
    }
}

#[async_trait]
impl DeliveryBackend for MockDeliveryBackend {
    fn name(&self) -> &str {
        "mock"
    }

    async fn deliver(&self, artifact: &Path, output_key: &str) -> Result<Delivery, DeliveryError> {
        if self.existing.read().await.contains(output_key) {
            return Err(DeliveryError::DestinationExists {
                destination: output_key.to_string(),
            });
        }

        if self.fail_always.load(Ordering::SeqCst) {
            return Err(DeliveryError::copy_failed(
                artifact.to_path_buf(),
                artifact.to_path_buf(),
                std::io::Error::other("mock delivery failure"),
            ));
        }

        let bytes = fs::read(artifact).await?;
        let size_bytes = bytes.len() as u64;
        self.delivered
            .write()
            .await
            .push((output_key.to_string(), bytes));
        fs::remove_file(artifact).await?;

        Ok(Delivery {
            output_key: output_key.to_string(),
            destination: format!("mock/{}", output_key),
            size_bytes,
            duration_ms: 1,
        })
    }

    async fn validate(&self) -> Result<(), DeliveryError> {
        Ok(())
    }
}
