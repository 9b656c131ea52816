use crate::converter::WILDCARD;

use super::{types::Config, ConfigError};

/// Validate configuration
///
/// Everything checked here is fatal at startup; a violation must never
/// surface for the first time inside a running worker.
pub fn validate_config(config: &Config) -> Result<(), ConfigError> {
    if config.queue.endpoint.is_empty() {
        return Err(ConfigError::ValidationError(
            "queue.endpoint cannot be empty".to_string(),
        ));
    }
    if config.queue.queue_url.is_empty() {
        return Err(ConfigError::ValidationError(
            "queue.queue_url cannot be empty".to_string(),
        ));
    }
    if config.storage.endpoint.is_empty() {
        return Err(ConfigError::ValidationError(
            "storage.endpoint cannot be empty".to_string(),
        ));
    }

    if config.pipeline.workers == 0 {
        return Err(ConfigError::ValidationError(
            "pipeline.workers must be at least 1".to_string(),
        ));
    }
    if config.pipeline.channel_depth == 0 {
        return Err(ConfigError::ValidationError(
            "pipeline.channel_depth must be at least 1".to_string(),
        ));
    }
    if config.pipeline.scratch_dir.as_os_str().is_empty() {
        return Err(ConfigError::ValidationError(
            "pipeline.scratch_dir cannot be empty".to_string(),
        ));
    }

    if config.convert.binary.as_os_str().is_empty() {
        return Err(ConfigError::ValidationError(
            "convert.binary cannot be empty".to_string(),
        ));
    }
    if config.convert.suffix.is_empty() {
        return Err(ConfigError::ValidationError(
            "convert.suffix cannot be empty".to_string(),
        ));
    }
    if !config.convert.options.contains_key(WILDCARD) {
        return Err(ConfigError::ValidationError(format!(
            "convert.options must contain a \"{}\" wildcard entry",
            WILDCARD
        )));
    }
    for (key, options) in &config.convert.options {
        // Options are split on whitespace with no quoting; a quote character
        // means the operator expected shell-style grouping they won't get.
        if options.contains('"') || options.contains('\'') {
            return Err(ConfigError::ValidationError(format!(
                "convert.options.{} contains quote characters; tokens are split on whitespace only",
                key
            )));
        }
    }

    match (&config.output.root, &config.output.bucket) {
        (None, None) => {
            return Err(ConfigError::ValidationError(
                "must specify output.root or output.bucket".to_string(),
            ));
        }
        (Some(_), Some(_)) => {
            return Err(ConfigError::ValidationError(
                "cannot specify both output.root and output.bucket".to_string(),
            ));
        }
        _ => {}
    }

    if config.rules.is_empty() {
        return Err(ConfigError::ValidationError(
            "at least one name rule is required".to_string(),
        ));
    }
    let rules = config.rule_set()?;
    rules
        .self_check()
        .map_err(|e| ConfigError::ValidationError(e.to_string()))?;

    Ok(())
}
