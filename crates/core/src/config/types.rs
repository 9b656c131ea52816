use serde::{Deserialize, Serialize};
use std::net::IpAddr;
use std::path::PathBuf;
use tracing::info;

use crate::converter::ConverterConfig;
use crate::pipeline::PipelineConfig;
use crate::resolver::RuleSet;

use super::ConfigError;

/// Root configuration
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct Config {
    pub queue: QueueConfig,
    pub storage: StorageConfig,
    #[serde(default)]
    pub pipeline: PipelineConfig,
    pub convert: ConverterConfig,
    #[serde(default)]
    pub output: OutputConfig,
    #[serde(default)]
    pub rules: Vec<NameRuleConfig>,
    #[serde(default)]
    pub admin: AdminConfig,
}

/// Inbound notification queue configuration
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct QueueConfig {
    /// Queue service endpoint the client posts to.
    pub endpoint: String,
    /// URL of the inbound queue.
    pub queue_url: String,
    /// Long-poll window in seconds.
    #[serde(default = "default_wait_time")]
    pub wait_time_secs: u64,
    /// Maximum messages fetched per poll.
    #[serde(default = "default_max_messages")]
    pub max_messages: u32,
}

fn default_wait_time() -> u64 {
    20
}

fn default_max_messages() -> u32 {
    10
}

/// Object storage configuration
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct StorageConfig {
    /// Storage endpoint (path-style: `{endpoint}/{bucket}/{key}`).
    pub endpoint: String,
    /// Request timeout in seconds.
    #[serde(default = "default_storage_timeout")]
    pub timeout_secs: u64,
}

fn default_storage_timeout() -> u64 {
    300
}

/// Output target configuration: exactly one of `root` or `bucket`.
#[derive(Debug, Clone, Default, Deserialize, Serialize)]
pub struct OutputConfig {
    /// Filesystem root the artifacts are delivered under.
    #[serde(default)]
    pub root: Option<PathBuf>,
    /// Bucket the artifacts are delivered to.
    #[serde(default)]
    pub bucket: Option<String>,
    /// Refuse to replace an already-delivered artifact.
    #[serde(default)]
    pub fail_on_overwrite: bool,
}

/// One name rule: pattern plus output template, evaluated in order.
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct NameRuleConfig {
    pub pattern: String,
    pub template: String,
}

/// Admin endpoint configuration
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct AdminConfig {
    #[serde(default = "default_admin_host")]
    pub host: IpAddr,
    #[serde(default = "default_admin_port")]
    pub port: u16,
}

impl Default for AdminConfig {
    fn default() -> Self {
        Self {
            host: default_admin_host(),
            port: default_admin_port(),
        }
    }
}

fn default_admin_host() -> IpAddr {
    "0.0.0.0".parse().expect("valid literal address")
}

fn default_admin_port() -> u16 {
    8650
}

impl Config {
    /// Compiles the configured name rules into a shareable rule set.
    pub fn rule_set(&self) -> Result<RuleSet, ConfigError> {
        let pairs: Vec<(&str, &str)> = self
            .rules
            .iter()
            .map(|r| (r.pattern.as_str(), r.template.as_str()))
            .collect();
        RuleSet::compile(&pairs, self.convert.suffix.clone())
            .map_err(|e| ConfigError::ValidationError(e.to_string()))
    }

    /// Logs the loaded configuration, one field per line.
    pub fn log_summary(&self) {
        info!("[config] queue.endpoint       = [{}]", self.queue.endpoint);
        info!("[config] queue.queue_url      = [{}]", self.queue.queue_url);
        info!("[config] queue.wait_time_secs = [{}]", self.queue.wait_time_secs);
        info!("[config] storage.endpoint     = [{}]", self.storage.endpoint);
        info!("[config] pipeline.workers     = [{}]", self.pipeline.workers);
        info!("[config] pipeline.depth       = [{}]", self.pipeline.channel_depth);
        info!(
            "[config] pipeline.scratch     = [{}]",
            self.pipeline.scratch_dir.display()
        );
        info!(
            "[config] pipeline.del_source  = [{}]",
            self.pipeline.delete_source
        );
        info!(
            "[config] convert.binary       = [{}]",
            self.convert.binary.display()
        );
        info!("[config] convert.suffix       = [{}]", self.convert.suffix);
        for (key, options) in self.convert.options.iter() {
            info!("[config] convert.options.{}   = [{}]", key, options);
        }
        match (&self.output.root, &self.output.bucket) {
            (Some(root), _) => info!("[config] output.root          = [{}]", root.display()),
            (_, Some(bucket)) => info!("[config] output.bucket        = [{}]", bucket),
            _ => {}
        }
        info!(
            "[config] output.overwrite     = [fail:{}]",
            self.output.fail_on_overwrite
        );
        for (ix, rule) in self.rules.iter().enumerate() {
            info!(
                "[config] name rule {:02}        = [{} -> {}]",
                ix + 1,
                rule.pattern,
                rule.template
            );
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const FULL_CONFIG: &str = r#"
[queue]
endpoint = "http://localhost:9324"
queue_url = "http://localhost:9324/queue/ingest-in"

[storage]
endpoint = "http://localhost:9000"

[pipeline]
workers = 4
channel_depth = 8
scratch_dir = "/var/tmp/ingestd"
delete_source = true

[convert]
binary = "/usr/local/bin/kdu_compress"
suffix = "jp2"

[convert.options]
"*" = "-rate 1.5"
tif = "-rate 2.0 -precise"

[output]
root = "/srv/iiif"

[[rules]]
pattern = '^(\d{4})(\d{4})$'
template = "{:1}/{:2}"
"#;

    #[test]
    fn test_deserialize_full_config() {
        let config: Config = toml::from_str(FULL_CONFIG).unwrap();
        assert_eq!(config.queue.wait_time_secs, 20);
        assert_eq!(config.queue.max_messages, 10);
        assert_eq!(config.pipeline.workers, 4);
        assert_eq!(config.pipeline.channel_depth, 8);
        assert!(config.pipeline.delete_source);
        assert_eq!(config.convert.suffix, "jp2");
        assert_eq!(config.convert.options.len(), 2);
        assert_eq!(config.output.root, Some(PathBuf::from("/srv/iiif")));
        assert!(config.output.bucket.is_none());
        assert_eq!(config.rules.len(), 1);
        assert_eq!(config.admin.port, 8650);
    }

    #[test]
    fn test_deserialize_missing_queue_fails() {
        let toml = r#"
[storage]
endpoint = "http://localhost:9000"

[convert]
binary = "magick"
suffix = "jp2"
"#;
        let result: Result<Config, _> = toml::from_str(toml);
        assert!(result.is_err());
    }

    #[test]
    fn test_rule_set_compiles_and_derives() {
        let config: Config = toml::from_str(FULL_CONFIG).unwrap();
        let rules = config.rule_set().unwrap();
        assert_eq!(
            rules.derive_output_name("batch/00011234.tif").unwrap(),
            "0001/1234.jp2"
        );
    }

    #[test]
    fn test_rule_set_rejects_bad_pattern() {
        let mut config: Config = toml::from_str(FULL_CONFIG).unwrap();
        config.rules.push(NameRuleConfig {
            pattern: "([unclosed".to_string(),
            template: "{:1}".to_string(),
        });
        assert!(matches!(
            config.rule_set(),
            Err(ConfigError::ValidationError(_))
        ));
    }
}
