//! Trait definitions for the queue module.

use async_trait::async_trait;

use super::error::QueueError;
use super::types::{AckToken, InboundMessage};

/// A notification queue client, safe for concurrent use.
#[async_trait]
pub trait QueueClient: Send + Sync {
    /// Returns the name of this queue implementation.
    fn name(&self) -> &str;

    /// Long-polls for the next batch of messages.
    ///
    /// Returns an empty batch when the poll window elapses without traffic.
    async fn receive(&self) -> Result<Vec<InboundMessage>, QueueError>;

    /// Acknowledges (deletes) a batch of messages.
    ///
    /// Returns one status per token, in order. A `false` entry means that
    /// message was not deleted and will be redelivered; callers log these
    /// and move on, they are never fatal.
    async fn acknowledge_batch(&self, tokens: &[AckToken]) -> Result<Vec<bool>, QueueError>;
}
