//! Types shared by the converter module.

use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::path::PathBuf;

/// The profile key that matches any file type.
pub const WILDCARD: &str = "*";

/// One conversion request: a downloaded scratch file to transform.
#[derive(Debug, Clone)]
pub struct ConversionJob {
    /// Job identifier, used for log correlation only.
    pub job_id: String,
    /// The downloaded scratch file to convert.
    pub input_path: PathBuf,
    /// File-type key used to resolve tool options (lowercased extension).
    pub file_type: String,
    /// Where the converted artifact must be written.
    pub output_path: PathBuf,
}

/// Result of a successful conversion.
#[derive(Debug, Clone)]
pub struct ConversionResult {
    pub job_id: String,
    pub output_path: PathBuf,
    pub output_size_bytes: u64,
    pub duration_ms: u64,
}

/// Splits an options string into tool argument tokens.
///
/// Plain ASCII-whitespace splitting; quoting is not interpreted, which is
/// why configuration containing quote characters is rejected at startup.
pub fn tokenize_options(options: &str) -> Vec<String> {
    options.split_ascii_whitespace().map(String::from).collect()
}

/// A mapping from file-type key to a tool options string.
///
/// Lookup is exact (lowercased) extension first, falling back to the
/// mandatory `"*"` wildcard entry. Read-only after startup.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ConversionProfile {
    options: HashMap<String, String>,
}

impl ConversionProfile {
    /// Wraps an options map. The wildcard invariant is enforced by
    /// configuration validation before the service starts.
    pub fn new(options: HashMap<String, String>) -> Self {
        Self { options }
    }

    /// Whether the mandatory wildcard entry is present.
    pub fn has_wildcard(&self) -> bool {
        self.options.contains_key(WILDCARD)
    }

    /// Resolves the options string for a file-type key.
    pub fn options_for(&self, file_type: &str) -> &str {
        let key = file_type.to_ascii_lowercase();
        self.options
            .get(&key)
            .or_else(|| self.options.get(WILDCARD))
            .map(String::as_str)
            .unwrap_or("")
    }

    /// Iterates over the configured (key, options) entries.
    pub fn entries(&self) -> impl Iterator<Item = (&str, &str)> {
        self.options.iter().map(|(k, v)| (k.as_str(), v.as_str()))
    }
}
