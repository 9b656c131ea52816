//! Error types for the queue module.

use thiserror::Error;

/// Errors that can occur while talking to the notification queue.
#[derive(Debug, Error)]
pub enum QueueError {
    /// Receiving a batch of messages failed.
    #[error("Failed to receive messages: {reason}")]
    ReceiveFailed { reason: String },

    /// Acknowledging (deleting) messages failed as a whole.
    ///
    /// Per-message failures are reported through the batch status vector
    /// instead and are never fatal.
    #[error("Failed to acknowledge messages: {reason}")]
    AcknowledgeFailed { reason: String },

    /// A message body could not be parsed as a notification document.
    #[error("Malformed notification body: {reason}")]
    Malformed { reason: String },

    /// Transport-level failure.
    #[error("Queue transport error: {0}")]
    Transport(#[from] reqwest::Error),
}

impl QueueError {
    /// Creates a receive failure.
    pub fn receive_failed(reason: impl Into<String>) -> Self {
        Self::ReceiveFailed {
            reason: reason.into(),
        }
    }

    /// Creates an acknowledge failure.
    pub fn acknowledge_failed(reason: impl Into<String>) -> Self {
        Self::AcknowledgeFailed {
            reason: reason.into(),
        }
    }

    /// Creates a malformed-body error.
    pub fn malformed(reason: impl Into<String>) -> Self {
        Self::Malformed {
            reason: reason.into(),
        }
    }
}
