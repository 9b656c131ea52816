//! Trait definitions for the storage module.

use async_trait::async_trait;
use std::path::{Path, PathBuf};

use super::error::StorageError;

/// An object storage client, safe for concurrent use by all workers.
#[async_trait]
pub trait ObjectStore: Send + Sync {
    /// Returns the name of this storage implementation.
    fn name(&self) -> &str;

    /// Downloads an object into a fresh uniquely-named scratch file.
    ///
    /// The transferred byte count is verified against `expected_size`; on a
    /// mismatch the partial file is removed and `SizeMismatch` returned.
    async fn download(
        &self,
        bucket: &str,
        key: &str,
        expected_size: u64,
        scratch_dir: &Path,
    ) -> Result<PathBuf, StorageError>;

    /// Uploads a local file to the given bucket and key.
    async fn upload(&self, local: &Path, bucket: &str, key: &str) -> Result<(), StorageError>;

    /// Deletes an object.
    async fn delete(&self, bucket: &str, key: &str) -> Result<(), StorageError>;

    /// Whether an object exists at the given bucket and key.
    async fn exists(&self, bucket: &str, key: &str) -> Result<bool, StorageError>;
}
