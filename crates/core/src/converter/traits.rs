//! Trait definitions for the converter module.

use async_trait::async_trait;

use super::error::ConverterError;
use super::types::{ConversionJob, ConversionResult};

/// A converter that can transform a scratch file into an output artifact.
#[async_trait]
pub trait Converter: Send + Sync {
    /// Returns the name of this converter implementation.
    fn name(&self) -> &str;

    /// Converts the job's input file into its output file.
    ///
    /// On failure any partial output is removed before returning; the input
    /// file is always left in place for the caller to dispose of. On
    /// success the caller owns both files and is responsible for deleting
    /// the input once it is no longer needed.
    async fn convert(&self, job: ConversionJob) -> Result<ConversionResult, ConverterError>;

    /// Validates that the converter is properly configured and ready.
    async fn validate(&self) -> Result<(), ConverterError>;
}
