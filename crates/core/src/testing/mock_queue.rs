//! Mock queue client for testing.

use async_trait::async_trait;
use std::collections::VecDeque;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use tokio::sync::{Mutex, RwLock};
use tokio::time::Duration;

use crate::queue::{AckToken, InboundMessage, Notification, QueueClient, QueueError};

/// Mock implementation of the `QueueClient` trait.
///
/// Batches pushed with `push_message`/`push_batch` are handed out in order;
/// once drained, `receive` briefly sleeps and returns an empty batch, the
/// way a real long poll behaves on an idle queue.
#[derive(Clone, Default)]
pub struct MockQueueClient {
    batches: Arc<Mutex<VecDeque<Vec<InboundMessage>>>>,
    acknowledged: Arc<RwLock<Vec<AckToken>>>,
    fail_receives: Arc<AtomicBool>,
    fail_acks: Arc<AtomicBool>,
}

impl MockQueueClient {
    /// Creates an empty mock queue.
    pub fn new() -> Self {
        Self::default()
    }

    /// Queues a single-notification batch.
    pub async fn push_message(&self, notification: Notification, token: &str) {
        self.push_batch(vec![InboundMessage {
            notification,
            ack_token: AckToken::new(token),
        }])
        .await;
    }

    /// Queues a batch of messages.
    pub async fn push_batch(&self, batch: Vec<InboundMessage>) {
        self.batches.lock().await.push_back(batch);
    }

    /// Tokens acknowledged so far, in acknowledgment order.
    pub async fn acknowledged(&self) -> Vec<AckToken> {
        self.acknowledged.read().await.clone()
    }

    /// Makes every `receive` call fail.
    pub fn fail_receives(&self, fail: bool) {
        self.fail_receives.store(fail, Ordering::SeqCst);
    }

    /// Makes every `acknowledge_batch` call fail.
    pub fn fail_acks(&self, fail: bool) {
        self.fail_acks.store(fail, Ordering::SeqCst);
    }
}

#[async_trait]
impl QueueClient for MockQueueClient {
    fn name(&self) -> &str {
        "mock"
    }

    async fn receive(&self) -> Result<Vec<InboundMessage>, QueueError> {
        if self.fail_receives.load(Ordering::SeqCst) {
            return Err(QueueError::receive_failed("mock receive failure"));
        }

        if let Some(batch) = self.batches.lock().await.pop_front() {
            return Ok(batch);
        }

        // Idle queue: emulate an expired long-poll window.
        tokio::time::sleep(Duration::from_millis(10)).await;
        Ok(Vec::new())
    }

    async fn acknowledge_batch(&self, tokens: &[AckToken]) -> Result<Vec<bool>, QueueError> {
        if self.fail_acks.load(Ordering::SeqCst) {
            return Err(QueueError::acknowledge_failed("mock acknowledge failure"));
        }

        self.acknowledged
            .write()
            .await
            .extend(tokens.iter().cloned());
        Ok(vec![true; tokens.len()])
    }
}
