//! Configuration for the pipeline module.

use serde::{Deserialize, Serialize};
use std::path::PathBuf;

/// Configuration for the worker pool and per-job policy.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PipelineConfig {
    /// Number of long-lived workers.
    #[serde(default = "default_workers")]
    pub workers: usize,

    /// Capacity of the bounded job channel; the dispatcher blocks when it
    /// is full, which is the backpressure mechanism.
    #[serde(default = "default_channel_depth")]
    pub channel_depth: usize,

    /// Directory for per-job scratch files.
    #[serde(default = "default_scratch_dir")]
    pub scratch_dir: PathBuf,

    /// Delete the source object after successful delivery.
    #[serde(default)]
    pub delete_source: bool,

    /// Keep the scratch artifact of a failed delivery for diagnostics.
    #[serde(default)]
    pub keep_failed_artifacts: bool,
}

fn default_workers() -> usize {
    4
}

fn default_channel_depth() -> usize {
    8
}

fn default_scratch_dir() -> PathBuf {
    std::env::temp_dir().join("ingestd")
}

impl Default for PipelineConfig {
    fn default() -> Self {
        Self {
            workers: default_workers(),
            channel_depth: default_channel_depth(),
            scratch_dir: default_scratch_dir(),
            delete_source: false,
            keep_failed_artifacts: false,
        }
    }
}

impl PipelineConfig {
    /// Sets the worker count.
    pub fn with_workers(mut self, workers: usize) -> Self {
        self.workers = workers;
        self
    }

    /// Sets the job channel depth.
    pub fn with_channel_depth(mut self, depth: usize) -> Self {
        self.channel_depth = depth;
        self
    }

    /// Sets the scratch directory.
    pub fn with_scratch_dir(mut self, dir: PathBuf) -> Self {
        self.scratch_dir = dir;
        self
    }

    /// Enables source deletion after delivery.
    pub fn with_delete_source(mut self, delete: bool) -> Self {
        self.delete_source = delete;
        self
    }
}
