//! Error types for the converter module.

use std::path::PathBuf;
use thiserror::Error;

/// Errors that can occur during conversion.
#[derive(Debug, Error)]
pub enum ConverterError {
    /// Conversion binary not found.
    #[error("Conversion binary not found at path: {path}")]
    BinaryNotFound { path: PathBuf },

    /// The tool ran and exited unsuccessfully.
    #[error("Conversion tool failed (exit code {status:?})")]
    ToolFailed {
        status: Option<i32>,
        /// Combined standard output and standard error of the tool.
        diagnostics: String,
    },

    /// Conversion timed out and the tool process was killed.
    #[error("Conversion timed out after {timeout_secs} seconds")]
    Timeout { timeout_secs: u64 },

    /// The tool exited successfully but produced no output file.
    #[error("Conversion produced no output file: {path}")]
    OutputMissing { path: PathBuf },

    /// I/O error during conversion.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

impl ConverterError {
    /// Creates a tool failure carrying the captured diagnostic text.
    pub fn tool_failed(status: Option<i32>, diagnostics: impl Into<String>) -> Self {
        Self::ToolFailed {
            status,
            diagnostics: diagnostics.into(),
        }
    }

    /// Whether this error is plausibly transient.
    ///
    /// A deterministic tool failure will fail every redelivery the same way
    /// and eventually surfaces through the queue's dead-letter policy.
    pub fn is_retryable(&self) -> bool {
        matches!(self, Self::Timeout { .. } | Self::Io(_))
    }
}
