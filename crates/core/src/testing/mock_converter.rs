//! Mock converter for testing.

use async_trait::async_trait;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use tokio::fs;
use tokio::sync::RwLock;

use crate::converter::{ConversionJob, ConversionResult, Converter, ConverterError};

/// Mock implementation of the `Converter` trait.
///
/// Writes the input bytes prefixed with `converted:` to the output path, so
/// tests can assert the delivered artifact really went through conversion.
/// In failure mode no output file is produced, matching the executor
/// contract that partial output never survives a failure.
#[derive(Clone, Default)]
pub struct MockConverter {
    fail_always: Arc<AtomicBool>,
    jobs: Arc<RwLock<Vec<ConversionJob>>>,
}

impl MockConverter {
    /// Creates a mock converter.
    pub fn new() -> Self {
        Self::default()
    }

    /// Makes every conversion fail.
    pub fn fail_always(&self, fail: bool) {
        self.fail_always.store(fail, Ordering::SeqCst);
    }

    /// Jobs received so far, in order.
    pub async fn jobs(&self) -> Vec<ConversionJob> {
        self.jobs.read().await.clone()
    }
}

#[async_trait]
impl Converter for MockConverter {
    fn name(&self) -> &str {
        "mock"
    }

    async fn convert(&self, job: ConversionJob) -> Result<ConversionResult, ConverterError> {
        self.jobs.write().await.push(job.clone());

        if self.fail_always.load(Ordering::SeqCst) {
            return Err(ConverterError::tool_failed(
                Some(1),
                "mock conversion failure",
            ));
        }

        let input = fs::read(&job.input_path).await?;
        let mut output = b"converted:".to_vec();
        output.extend_from_slice(&input);
        fs::write(&job.output_path, &output).await?;

        Ok(ConversionResult {
            job_id: job.job_id,
            output_path: job.output_path,
            output_size_bytes: output.len() as u64,
            duration_ms: 1,
        })
    }

    async fn validate(&self) -> Result<(), ConverterError> {
        Ok(())
    }
}
