//! Pipeline lifecycle integration tests.
//!
//! These tests drive the job pipeline and worker pool against mock
//! collaborators and verify the state-machine contract:
//! - acknowledgment strictly after successful delivery
//! - skip/fail classification per failure kind
//! - scratch-file cleanup on every path
//! - failure containment between consecutive jobs

use std::sync::Arc;
use std::time::Duration;

use tempfile::TempDir;

use ingestd_core::{
    pipeline::{Job, JobOutcome, JobPipeline, PipelineConfig, SkipReason, WorkerPool},
    queue::{AckToken, InboundMessage, Notification},
    resolver::RuleSet,
    testing::{MockConverter, MockDeliveryBackend, MockObjectStore, MockQueueClient},
};

const BUCKET: &str = "ingest-in";

/// Test helper wiring a pipeline over mock collaborators.
struct TestHarness {
    config: PipelineConfig,
    pipeline: Arc<JobPipeline>,
    queue: MockQueueClient,
    store: MockObjectStore,
    converter: MockConverter,
    delivery: MockDeliveryBackend,
    scratch: TempDir,
}

impl TestHarness {
    fn new() -> Self {
        Self::with_config(|config| config)
    }

    fn with_config(adjust: impl FnOnce(PipelineConfig) -> PipelineConfig) -> Self {
        let scratch = TempDir::new().expect("Failed to create scratch dir");
        let config = adjust(
            PipelineConfig::default()
                .with_workers(1)
                .with_channel_depth(4)
                .with_scratch_dir(scratch.path().to_path_buf()),
        );

        let rules = Arc::new(
            RuleSet::compile(&[(r"^(\d{4})(\d{4})$", "{:1}/{:2}")], "jp2")
                .expect("Failed to compile rules"),
        );

        let queue = MockQueueClient::new();
        let store = MockObjectStore::new();
        let converter = MockConverter::new();
        let delivery = MockDeliveryBackend::new();

        let pipeline = Arc::new(JobPipeline::new(
            config.clone(),
            rules,
            Arc::new(converter.clone()),
            Arc::new(delivery.clone()),
            Arc::new(store.clone()),
            Arc::new(queue.clone()),
        ));

        Self {
            config,
            pipeline,
            queue,
            store,
            converter,
            delivery,
            scratch,
        }
    }

    fn job(&self, key: &str, size: u64, token: &str) -> Job {
        Job::from_message(self.message(key, size, token))
    }

    fn message(&self, key: &str, size: u64, token: &str) -> InboundMessage {
        InboundMessage {
            notification: Notification {
                bucket: BUCKET.to_string(),
                key: key.to_string(),
                size,
                event_time: None,
            },
            ack_token: AckToken::new(token),
        }
    }

    async fn seed(&self, key: &str, bytes: &[u8]) {
        self.store.put_object(BUCKET, key, bytes.to_vec()).await;
    }

    fn scratch_file_count(&self) -> usize {
        std::fs::read_dir(self.scratch.path())
            .map(|entries| entries.count())
            .unwrap_or(0)
    }
}

#[tokio::test]
async fn test_delivered_end_to_end() {
    let h = TestHarness::new();
    h.seed("batch/00011234.tif", b"image bytes").await;

    let job = h.job("batch/00011234.tif", 11, "receipt-1");
    let outcome = h.pipeline.run(&job).await;

    assert!(matches!(outcome, JobOutcome::Delivered));

    // The artifact went through conversion and out under the derived key.
    let delivered = h.delivery.delivered().await;
    assert_eq!(delivered.len(), 1);
    assert_eq!(delivered[0].0, "0001/1234.jp2");
    assert_eq!(delivered[0].1, b"converted:image bytes");

    // Acknowledged exactly once, and only after delivery.
    assert_eq!(h.queue.acknowledged().await, vec![AckToken::new("receipt-1")]);

    // No scratch files survive a terminal transition.
    assert_eq!(h.scratch_file_count(), 0);
}

#[tokio::test]
async fn test_invalid_name_skips_before_any_io() {
    let h = TestHarness::new();
    h.seed("letters.tif", b"image bytes").await;

    let job = h.job("letters.tif", 11, "receipt-1");
    let outcome = h.pipeline.run(&job).await;

    assert!(matches!(
        outcome,
        JobOutcome::Skipped(SkipReason::InvalidName)
    ));
    // Malformed input is rejected before a single byte moves.
    assert_eq!(h.store.download_calls(), 0);
    assert!(h.converter.jobs().await.is_empty());
    assert!(h.queue.acknowledged().await.is_empty());
}

#[tokio::test]
async fn test_size_mismatch_fails_and_leaves_message() {
    let h = TestHarness::new();
    h.seed("batch/00011234.tif", b"short").await;

    // Notification claims more bytes than the object holds.
    let job = h.job("batch/00011234.tif", 99, "receipt-1");
    let outcome = h.pipeline.run(&job).await;

    assert!(matches!(outcome, JobOutcome::Failed(_)));
    assert!(h.queue.acknowledged().await.is_empty());
    assert_eq!(h.scratch_file_count(), 0);
}

#[tokio::test]
async fn test_conversion_failure_contained_and_next_job_succeeds() {
    let h = TestHarness::new();
    h.seed("batch/00011234.tif", b"image bytes").await;

    h.converter.fail_always(true);
    let failed = h
        .pipeline
        .run(&h.job("batch/00011234.tif", 11, "receipt-1"))
        .await;
    assert!(matches!(failed, JobOutcome::Failed(_)));
    // No partial output, no leftover input, no acknowledgment.
    assert_eq!(h.scratch_file_count(), 0);
    assert!(h.queue.acknowledged().await.is_empty());

    // The same pipeline instance processes the next job cleanly.
    h.converter.fail_always(false);
    let delivered = h
        .pipeline
        .run(&h.job("batch/00011234.tif", 11, "receipt-2"))
        .await;
    assert!(matches!(delivered, JobOutcome::Delivered));
    assert_eq!(h.queue.acknowledged().await, vec![AckToken::new("receipt-2")]);
}

#[tokio::test]
async fn test_overwrite_guard_skips_without_ack() {
    let h = TestHarness::new();
    h.seed("batch/00011234.tif", b"image bytes").await;
    h.delivery.mark_existing("0001/1234.jp2").await;

    let outcome = h
        .pipeline
        .run(&h.job("batch/00011234.tif", 11, "receipt-1"))
        .await;

    assert!(matches!(
        outcome,
        JobOutcome::Skipped(SkipReason::DestinationExists)
    ));
    assert!(h.delivery.delivered().await.is_empty());
    assert!(h.queue.acknowledged().await.is_empty());
    assert_eq!(h.scratch_file_count(), 0);
}

#[tokio::test]
async fn test_delivery_failure_never_acknowledges() {
    let h = TestHarness::new();
    h.seed("batch/00011234.tif", b"image bytes").await;
    h.delivery.fail_always(true);

    let outcome = h
        .pipeline
        .run(&h.job("batch/00011234.tif", 11, "receipt-1"))
        .await;

    assert!(matches!(outcome, JobOutcome::Failed(_)));
    assert!(h.queue.acknowledged().await.is_empty());
    assert_eq!(h.scratch_file_count(), 0);
}

#[tokio::test]
async fn test_failed_artifact_kept_when_configured() {
    let h = TestHarness::with_config(|mut config| {
        config.keep_failed_artifacts = true;
        config
    });
    h.seed("batch/00011234.tif", b"image bytes").await;
    h.delivery.fail_always(true);

    let outcome = h
        .pipeline
        .run(&h.job("batch/00011234.tif", 11, "receipt-1"))
        .await;

    assert!(matches!(outcome, JobOutcome::Failed(_)));
    // The converted artifact stays behind for diagnostics.
    assert_eq!(h.scratch_file_count(), 1);
}

#[tokio::test]
async fn test_delete_source_after_delivery() {
    let h = TestHarness::with_config(|config| config.with_delete_source(true));
    h.seed("batch/00011234.tif", b"image bytes").await;

    let outcome = h
        .pipeline
        .run(&h.job("batch/00011234.tif", 11, "receipt-1"))
        .await;

    assert!(matches!(outcome, JobOutcome::Delivered));
    assert_eq!(
        h.store.deleted().await,
        vec![(BUCKET.to_string(), "batch/00011234.tif".to_string())]
    );
    assert_eq!(h.queue.acknowledged().await, vec![AckToken::new("receipt-1")]);
}

#[tokio::test]
async fn test_source_delete_failure_blocks_acknowledgment() {
    let h = TestHarness::with_config(|config| config.with_delete_source(true));
    h.seed("batch/00011234.tif", b"image bytes").await;
    h.store.fail_deletes(true);

    let outcome = h
        .pipeline
        .run(&h.job("batch/00011234.tif", 11, "receipt-1"))
        .await;

    // The artifact is delivered, but the message stays for redelivery so
    // the cleanup gets retried.
    assert!(matches!(outcome, JobOutcome::Delivered));
    assert_eq!(h.delivery.delivered().await.len(), 1);
    assert!(h.queue.acknowledged().await.is_empty());
}

async fn wait_for_acks(queue: &MockQueueClient, count: usize) {
    for _ in 0..200 {
        if queue.acknowledged().await.len() >= count {
            return;
        }
        tokio::time::sleep(Duration::from_millis(25)).await;
    }
    panic!(
        "timed out waiting for {} acknowledgments (got {})",
        count,
        queue.acknowledged().await.len()
    );
}

#[tokio::test]
async fn test_pool_processes_batches_and_drains_on_shutdown() {
    let h = TestHarness::with_config(|config| config.with_workers(2));
    h.seed("batch/00011234.tif", b"image bytes").await;
    h.seed("batch/99887766.tif", b"other bytes").await;

    h.queue
        .push_batch(vec![
            h.message("batch/00011234.tif", 11, "receipt-1"),
            h.message("batch/99887766.tif", 11, "receipt-2"),
        ])
        .await;

    let pool = Arc::new(WorkerPool::new(
        h.config.clone(),
        Arc::clone(&h.pipeline),
        Arc::new(h.queue.clone()),
    ));
    let runner = tokio::spawn({
        let pool = Arc::clone(&pool);
        async move { pool.run().await }
    });

    wait_for_acks(&h.queue, 2).await;
    assert_eq!(h.delivery.delivered().await.len(), 2);

    pool.shutdown();
    runner.await.expect("pool task panicked");
    assert_eq!(h.scratch_file_count(), 0);
}

#[tokio::test]
async fn test_pool_survives_poisoned_job() {
    let h = TestHarness::new();
    // First object lies about its size, second is fine.
    h.seed("batch/00011234.tif", b"short").await;
    h.seed("batch/99887766.tif", b"image bytes").await;

    h.queue
        .push_batch(vec![
            h.message("batch/00011234.tif", 99, "receipt-bad"),
            h.message("batch/99887766.tif", 11, "receipt-good"),
        ])
        .await;

    let pool = Arc::new(WorkerPool::new(
        h.config.clone(),
        Arc::clone(&h.pipeline),
        Arc::new(h.queue.clone()),
    ));
    let runner = tokio::spawn({
        let pool = Arc::clone(&pool);
        async move { pool.run().await }
    });

    // The single worker hits the failure first and still completes the
    // unrelated job behind it.
    wait_for_acks(&h.queue, 1).await;
    assert_eq!(
        h.queue.acknowledged().await,
        vec![AckToken::new("receipt-good")]
    );

    pool.shutdown();
    runner.await.expect("pool task panicked");
}
