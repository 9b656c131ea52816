//! Configuration for the converter module.

use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::path::PathBuf;

/// Configuration for the external conversion tool.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ConverterConfig {
    /// Path to the conversion binary.
    pub binary: PathBuf,

    /// Suffix appended to derived output names (without the dot).
    pub suffix: String,

    /// Tool options per file-type key; must include a `"*"` entry.
    #[serde(default)]
    pub options: HashMap<String, String>,

    /// Timeout for a single conversion in seconds.
    #[serde(default = "default_timeout")]
    pub timeout_secs: u64,
}

fn default_timeout() -> u64 {
    600
}

impl ConverterConfig {
    /// Creates a config for the given binary and suffix.
    pub fn new(binary: impl Into<PathBuf>, suffix: impl Into<String>) -> Self {
        Self {
            binary: binary.into(),
            suffix: suffix.into(),
            options: HashMap::new(),
            timeout_secs: default_timeout(),
        }
    }

    /// Adds an options entry for a file-type key.
    pub fn with_options(mut self, file_type: impl Into<String>, options: impl Into<String>) -> Self {
        self.options.insert(file_type.into(), options.into());
        self
    }

    /// Sets the conversion timeout in seconds.
    pub fn with_timeout(mut self, timeout_secs: u64) -> Self {
        self.timeout_secs = timeout_secs;
        self
    }
}
