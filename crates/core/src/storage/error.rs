//! Error types for the storage module.

use thiserror::Error;

/// Errors that can occur while talking to object storage.
#[derive(Debug, Error)]
pub enum StorageError {
    /// The object does not exist.
    #[error("Object not found: {bucket}/{key}")]
    NotFound { bucket: String, key: String },

    /// The transferred byte count disagrees with the expected object size.
    ///
    /// Treated as transient: a partial read re-runs cleanly on redelivery.
    #[error("Download of {bucket}/{key} incomplete: expected {expected} bytes, received {actual} bytes")]
    SizeMismatch {
        bucket: String,
        key: String,
        expected: u64,
        actual: u64,
    },

    /// The storage endpoint rejected the request.
    #[error("Storage request failed with status {status}: {reason}")]
    RequestFailed { status: u16, reason: String },

    /// Transport-level failure.
    #[error("Storage transport error: {0}")]
    Transport(#[from] reqwest::Error),

    /// Local file I/O failure.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

impl StorageError {
    /// Creates a request failure from a response status and body.
    pub fn request_failed(status: u16, reason: impl Into<String>) -> Self {
        Self::RequestFailed {
            status,
            reason: reason.into(),
        }
    }
}
