//! HTTP object storage client for S3-compatible path-style endpoints.

use async_trait::async_trait;
use futures::StreamExt;
use std::path::{Path, PathBuf};
use std::time::{Duration, Instant};
use tokio::fs::{self, File};
use tokio::io::AsyncWriteExt;
use tracing::info;
use uuid::Uuid;

use crate::config::StorageConfig;

use super::error::StorageError;
use super::traits::ObjectStore;

/// Object storage client speaking plain HTTP against a path-style endpoint
/// (`{endpoint}/{bucket}/{key}`).
pub struct HttpObjectStore {
    client: reqwest::Client,
    config: StorageConfig,
}

impl HttpObjectStore {
    /// Creates a new storage client.
    pub fn new(config: StorageConfig) -> Result<Self, StorageError> {
        let client = reqwest::Client::builder()
            .timeout(Duration::from_secs(config.timeout_secs))
            .build()?;

        Ok(Self { client, config })
    }

    /// Builds the object URL, percent-encoding each key segment.
    fn object_url(&self, bucket: &str, key: &str) -> String {
        let encoded_key = key
            .split('/')
            .map(|segment| urlencoding::encode(segment).into_owned())
            .collect::<Vec<_>>()
            .join("/");
        format!(
            "{}/{}/{}",
            self.config.endpoint.trim_end_matches('/'),
            bucket,
            encoded_key
        )
    }

    /// Picks a fresh scratch file name, keeping the key's extension so the
    /// conversion tool can recognize the input format.
    fn scratch_file_name(key: &str) -> String {
        let name = key.rsplit('/').next().unwrap_or(key);
        match name.rfind('.') {
            Some(idx) if idx > 0 => format!("{}{}", Uuid::new_v4(), &name[idx..]),
            _ => Uuid::new_v4().to_string(),
        }
    }
}

#[async_trait]
impl ObjectStore for HttpObjectStore {
    fn name(&self) -> &str {
        "http"
    }

    async fn download(
        &self,
        bucket: &str,
        key: &str,
        expected_size: u64,
        scratch_dir: &Path,
    ) -> Result<PathBuf, StorageError> {
        let url = self.object_url(bucket, key);
        let local = scratch_dir.join(Self::scratch_file_name(key));

        let start = Instant::now();
        let response = self.client.get(&url).send().await?;
        let status = response.status();
        if status.as_u16() == 404 {
            return Err(StorageError::NotFound {
                bucket: bucket.to_string(),
                key: key.to_string(),
            });
        }
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(StorageError::request_failed(status.as_u16(), body));
        }

        let mut file = File::create(&local).await?;
        let mut stream = response.bytes_stream();
        let mut received = 0u64;
        while let Some(chunk) = stream.next().await {
            let chunk = match chunk {
                Ok(chunk) => chunk,
                Err(e) => {
                    let _ = fs::remove_file(&local).await;
                    return Err(StorageError::Transport(e));
                }
            };
            received += chunk.len() as u64;
            if let Err(e) = file.write_all(&chunk).await {
                let _ = fs::remove_file(&local).await;
                return Err(StorageError::Io(e));
            }
        }
        file.flush().await?;
        drop(file);

        // A short read is not always surfaced as a transport error, so the
        // byte count is checked against the size the notification carried.
        if received != expected_size {
            let _ = fs::remove_file(&local).await;
            return Err(StorageError::SizeMismatch {
                bucket: bucket.to_string(),
                key: key.to_string(),
                expected: expected_size,
                actual: received,
            });
        }

        info!(
            "download of {}/{} complete in {:.2} seconds ({} bytes)",
            bucket,
            key,
            start.elapsed().as_secs_f64(),
            received
        );
        Ok(local)
    }

    async fn upload(&self, local: &Path, bucket: &str, key: &str) -> Result<(), StorageError> {
        let url = self.object_url(bucket, key);
        let body = fs::read(local).await?;
        let size = body.len();

        let start = Instant::now();
        let response = self.client.put(&url).body(body).send().await?;
        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(StorageError::request_failed(status.as_u16(), body));
        }

        info!(
            "upload of {}/{} complete in {:.2} seconds ({} bytes)",
            bucket,
            key,
            start.elapsed().as_secs_f64(),
            size
        );
        Ok(())
    }

    async fn delete(&self, bucket: &str, key: &str) -> Result<(), StorageError> {
        let url = self.object_url(bucket, key);
        let response = self.client.delete(&url).send().await?;
        let status = response.status();
        // An already-deleted object is fine: deletes re-run on redelivery.
        if !status.is_success() && status.as_u16() != 404 {
            let body = response.text().await.unwrap_or_default();
            return Err(StorageError::request_failed(status.as_u16(), body));
        }
        Ok(())
    }

    async fn exists(&self, bucket: &str, key: &str) -> Result<bool, StorageError> {
        let url = self.object_url(bucket, key);
        let response = self.client.head(&url).send().await?;
        let status = response.status();
        if status.is_success() {
            Ok(true)
        } else if status.as_u16() == 404 {
            Ok(false)
        } else {
            Err(StorageError::request_failed(
                status.as_u16(),
                status.to_string(),
            ))
        }
    }
}
