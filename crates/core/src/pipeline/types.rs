//! Types shared by the pipeline module.

use std::fmt;
use uuid::Uuid;

use crate::queue::{AckToken, InboundMessage};

/// One unit of work, derived from one inbound notification.
///
/// Read-only for its whole life: a worker derives local state around it and
/// discards it after the terminal transition.
#[derive(Debug, Clone)]
pub struct Job {
    /// Short identifier for log correlation.
    pub id: String,
    /// Bucket holding the source object.
    pub bucket: String,
    /// Source object key.
    pub key: String,
    /// Expected object size in bytes.
    pub expected_size: u64,
    /// Token that acknowledges the inbound message.
    pub ack_token: AckToken,
}

impl Job {
    /// Builds a job from a received message.
    pub fn from_message(message: InboundMessage) -> Self {
        let id = Uuid::new_v4().simple().to_string();
        Self {
            id: id[..8].to_string(),
            bucket: message.notification.bucket,
            key: message.notification.key,
            expected_size: message.notification.size,
            ack_token: message.ack_token,
        }
    }
}

/// Why a job was skipped rather than failed.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SkipReason {
    /// The key matched no configured name rule.
    InvalidName,
    /// The destination already holds an artifact and the guard is on.
    DestinationExists,
}

impl fmt::Display for SkipReason {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::InvalidName => write!(f, "invalid name"),
            Self::DestinationExists => write!(f, "destination exists"),
        }
    }
}

/// Terminal classification of a completed job.
///
/// `Delivered` jobs acknowledged their message; `Skipped` and `Failed`
/// jobs left it for the queue's redelivery machinery.
#[derive(Debug, Clone)]
pub enum JobOutcome {
    Delivered,
    Skipped(SkipReason),
    Failed(String),
}

impl JobOutcome {
    /// Stable label for metrics and logs.
    pub fn label(&self) -> &'static str {
        match self {
            Self::Delivered => "delivered",
            Self::Skipped(_) => "skipped",
            Self::Failed(_) => "failed",
        }
    }
}
