//! Error types for the delivery module.

use std::path::PathBuf;
use thiserror::Error;

use crate::storage::StorageError;

/// Errors that can occur during artifact delivery.
#[derive(Debug, Error)]
pub enum DeliveryError {
    /// Destination already holds an object and the overwrite guard is on.
    ///
    /// The pipeline treats this as a skip, not a failure. The check is
    /// advisory: concurrent identical inputs can still race past it.
    #[error("Destination already exists: {destination}")]
    DestinationExists { destination: String },

    /// Failed to create the destination directory tree.
    #[error("Failed to create directory: {path}")]
    DirectoryCreationFailed {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// Failed to copy the artifact into place.
    #[error("Failed to copy artifact from {artifact} to {destination}")]
    CopyFailed {
        artifact: PathBuf,
        destination: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// Failed to upload the artifact to the output bucket.
    #[error("Failed to upload artifact to {bucket}/{key}")]
    UploadFailed {
        bucket: String,
        key: String,
        #[source]
        source: StorageError,
    },

    /// I/O error.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

impl DeliveryError {
    /// Creates a copy failure.
    pub fn copy_failed(artifact: PathBuf, destination: PathBuf, source: std::io::Error) -> Self {
        Self::CopyFailed {
            artifact,
            destination,
            source,
        }
    }

    /// Whether this error is the overwrite-guard skip rather than a fault.
    pub fn is_overwrite_skip(&self) -> bool {
        matches!(self, Self::DestinationExists { .. })
    }
}
