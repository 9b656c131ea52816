//! Per-job state machine.

use std::sync::Arc;
use std::time::Instant;
use tokio::fs;
use tracing::{debug, error, info, warn};

use crate::converter::{ConversionJob, Converter, ConverterError};
use crate::delivery::DeliveryBackend;
use crate::metrics;
use crate::queue::QueueClient;
use crate::resolver::RuleSet;
use crate::storage::ObjectStore;

use super::config::PipelineConfig;
use super::types::{Job, JobOutcome, SkipReason};

/// Drives one job at a time through
/// validate → download → convert → deliver → source cleanup → acknowledge.
///
/// Every error is converted into a terminal `JobOutcome` here; nothing
/// propagates out to the worker loop.
pub struct JobPipeline {
    config: PipelineConfig,
    rules: Arc<RuleSet>,
    converter: Arc<dyn Converter>,
    delivery: Arc<dyn DeliveryBackend>,
    store: Arc<dyn ObjectStore>,
    queue: Arc<dyn QueueClient>,
}

/// Lowercased extension of a key's file name, empty when absent.
fn extension_of(key: &str) -> String {
    key.rsplit('/')
        .next()
        .and_then(|name| name.rsplit_once('.'))
        .map(|(_, ext)| ext.to_ascii_lowercase())
        .unwrap_or_default()
}

impl JobPipeline {
    /// Creates a pipeline over the given collaborators.
    pub fn new(
        config: PipelineConfig,
        rules: Arc<RuleSet>,
        converter: Arc<dyn Converter>,
        delivery: Arc<dyn DeliveryBackend>,
        store: Arc<dyn ObjectStore>,
        queue: Arc<dyn QueueClient>,
    ) -> Self {
        Self {
            config,
            rules,
            converter,
            delivery,
            store,
            queue,
        }
    }

    /// Runs a job to its terminal outcome.
    pub async fn run(&self, job: &Job) -> JobOutcome {
        info!(job_id = %job.id, "processing {}/{}", job.bucket, job.key);

        // Received -> Validated
        if let Err(e) = self.rules.validate(&job.key) {
            info!(job_id = %job.id, "skipping: {}", e);
            return JobOutcome::Skipped(SkipReason::InvalidName);
        }
        let output_key = match self.rules.derive_output_name(&job.key) {
            Ok(key) => key,
            Err(e) => {
                // Validation passed, so the same rules must derive; hitting
                // this means the rule set is inconsistent. Surface it.
                error!(job_id = %job.id, "output name derivation failed: {}", e);
                return JobOutcome::Failed(e.to_string());
            }
        };

        // Validated -> Downloaded
        let timer = Instant::now();
        let input = match self
            .store
            .download(
                &job.bucket,
                &job.key,
                job.expected_size,
                &self.config.scratch_dir,
            )
            .await
        {
            Ok(path) => {
                metrics::JOB_STAGE_DURATION
                    .with_label_values(&["download"])
                    .observe(timer.elapsed().as_secs_f64());
                metrics::BYTES_DOWNLOADED.inc_by(job.expected_size);
                path
            }
            Err(e) => {
                warn!(job_id = %job.id, "download of {}/{} failed: {}", job.bucket, job.key, e);
                return JobOutcome::Failed(e.to_string());
            }
        };

        // Downloaded -> Converted
        let output_path = self
            .config
            .scratch_dir
            .join(format!("{}.{}", job.id, extension_of(&output_key)));
        let conversion = ConversionJob {
            job_id: job.id.clone(),
            input_path: input.clone(),
            file_type: extension_of(&job.key),
            output_path,
        };

        let timer = Instant::now();
        let artifact = match self.converter.convert(conversion).await {
            Ok(result) => {
                metrics::JOB_STAGE_DURATION
                    .with_label_values(&["convert"])
                    .observe(timer.elapsed().as_secs_f64());
                debug!(job_id = %job.id, "removing downloaded file {}", input.display());
                let _ = fs::remove_file(&input).await;
                result.output_path
            }
            Err(e) => {
                warn!(
                    job_id = %job.id,
                    retryable = e.is_retryable(),
                    "conversion of {} failed: {}",
                    job.key,
                    e
                );
                if let ConverterError::ToolFailed { diagnostics, .. } = &e {
                    if !diagnostics.is_empty() {
                        warn!(job_id = %job.id, "tool output: {}", diagnostics.trim_end());
                    }
                }
                let _ = fs::remove_file(&input).await;
                return JobOutcome::Failed(e.to_string());
            }
        };

        // Converted -> Delivered
        let timer = Instant::now();
        match self.delivery.deliver(&artifact, &output_key).await {
            Ok(delivery) => {
                metrics::JOB_STAGE_DURATION
                    .with_label_values(&["deliver"])
                    .observe(timer.elapsed().as_secs_f64());
                metrics::BYTES_DELIVERED.inc_by(delivery.size_bytes);
            }
            Err(e) if e.is_overwrite_skip() => {
                info!(job_id = %job.id, "skipping: {}", e);
                let _ = fs::remove_file(&artifact).await;
                return JobOutcome::Skipped(SkipReason::DestinationExists);
            }
            Err(e) => {
                warn!(job_id = %job.id, "delivery of {} failed: {}", output_key, e);
                if self.config.keep_failed_artifacts {
                    warn!(job_id = %job.id, "keeping failed artifact at {}", artifact.display());
                } else {
                    let _ = fs::remove_file(&artifact).await;
                }
                return JobOutcome::Failed(e.to_string());
            }
        }

        // Delivered -> SourceCleaned
        if self.config.delete_source {
            info!(job_id = %job.id, "removing source object {}/{}", job.bucket, job.key);
            if let Err(e) = self.store.delete(&job.bucket, &job.key).await {
                // Delivery stands; leaving the message unacknowledged lets
                // redelivery retry the cleanup against the idempotent chain.
                warn!(job_id = %job.id, "source delete failed, not acknowledging: {}", e);
                return JobOutcome::Delivered;
            }
        }

        // SourceCleaned -> Acknowledged
        match self
            .queue
            .acknowledge_batch(std::slice::from_ref(&job.ack_token))
            .await
        {
            Ok(statuses) => {
                for (ix, ok) in statuses.iter().enumerate() {
                    if !*ok {
                        warn!(job_id = %job.id, "message {} failed to acknowledge", ix);
                    }
                }
            }
            Err(e) => {
                warn!(job_id = %job.id, "acknowledge failed, message will redeliver: {}", e);
            }
        }

        JobOutcome::Delivered
    }
}
