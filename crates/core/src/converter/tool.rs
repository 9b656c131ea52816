//! External-tool converter implementation.

use async_trait::async_trait;
use std::process::Stdio;
use std::time::Instant;
use tokio::fs;
use tokio::process::Command;
use tokio::time::{timeout, Duration};
use tracing::{debug, info};

use super::config::ConverterConfig;
use super::error::ConverterError;
use super::traits::Converter;
use super::types::{tokenize_options, ConversionJob, ConversionProfile, ConversionResult};

/// Converter that shells out to the configured external binary.
pub struct ToolConverter {
    config: ConverterConfig,
    profile: ConversionProfile,
}

impl ToolConverter {
    /// Creates a converter from its configuration.
    pub fn new(config: ConverterConfig) -> Self {
        let profile = ConversionProfile::new(config.options.clone());
        Self { config, profile }
    }

    /// Builds the tool argument list: input first, option tokens in their
    /// configured order, output last.
    fn build_args(&self, job: &ConversionJob) -> Vec<String> {
        let tokens = tokenize_options(self.profile.options_for(&job.file_type));
        let mut args = Vec::with_capacity(tokens.len() + 2);
        args.push(job.input_path.to_string_lossy().to_string());
        args.extend(tokens);
        args.push(job.output_path.to_string_lossy().to_string());
        args
    }
}

#[async_trait]
impl Converter for ToolConverter {
    fn name(&self) -> &str {
        "tool"
    }

    async fn convert(&self, job: ConversionJob) -> Result<ConversionResult, ConverterError> {
        let args = self.build_args(&job);
        debug!(
            job_id = %job.job_id,
            "convert command: {} {}",
            self.config.binary.display(),
            args.join(" ")
        );

        let start = Instant::now();
        let child = Command::new(&self.config.binary)
            .args(&args)
            .stdin(Stdio::null())
            .stdout(Stdio::piped())
            .stderr(Stdio::piped())
            .kill_on_drop(true)
            .spawn()
            .map_err(|e| {
                if e.kind() == std::io::ErrorKind::NotFound {
                    ConverterError::BinaryNotFound {
                        path: self.config.binary.clone(),
                    }
                } else {
                    ConverterError::Io(e)
                }
            })?;

        let timeout_secs = self.config.timeout_secs;
        let output = match timeout(Duration::from_secs(timeout_secs), child.wait_with_output()).await
        {
            Ok(Ok(output)) => output,
            Ok(Err(e)) => {
                let _ = fs::remove_file(&job.output_path).await;
                return Err(ConverterError::Io(e));
            }
            Err(_) => {
                // Dropping the timed-out future reaps the child (kill_on_drop).
                let _ = fs::remove_file(&job.output_path).await;
                return Err(ConverterError::Timeout { timeout_secs });
            }
        };

        if !output.status.success() {
            let mut diagnostics = String::from_utf8_lossy(&output.stdout).into_owned();
            diagnostics.push_str(&String::from_utf8_lossy(&output.stderr));
            // Remove any partial output and ignore errors.
            let _ = fs::remove_file(&job.output_path).await;
            return Err(ConverterError::tool_failed(output.status.code(), diagnostics));
        }

        let meta = fs::metadata(&job.output_path)
            .await
            .map_err(|_| ConverterError::OutputMissing {
                path: job.output_path.clone(),
            })?;

        let duration = start.elapsed();
        info!(
            job_id = %job.job_id,
            "conversion complete in {:.2} seconds",
            duration.as_secs_f64()
        );

        Ok(ConversionResult {
            job_id: job.job_id,
            output_path: job.output_path,
            output_size_bytes: meta.len(),
            duration_ms: duration.as_millis() as u64,
        })
    }

    async fn validate(&self) -> Result<(), ConverterError> {
        // A bare command name resolves through PATH at spawn time; only an
        // explicit path can be checked up front.
        if self.config.binary.components().count() > 1
            && fs::metadata(&self.config.binary).await.is_err()
        {
            return Err(ConverterError::BinaryNotFound {
                path: self.config.binary.clone(),
            });
        }
        Ok(())
    }
}
