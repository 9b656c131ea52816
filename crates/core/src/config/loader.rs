use figment::{
    providers::{Env, Format, Toml},
    Figment,
};
use std::path::Path;

use super::{types::Config, ConfigError};

/// Load configuration from file with environment variable overrides
pub fn load_config(path: &Path) -> Result<Config, ConfigError> {
    if !path.exists() {
        return Err(ConfigError::FileNotFound(path.display().to_string()));
    }

    let config: Config = Figment::new()
        .merge(Toml::file(path))
        .merge(Env::prefixed("INGESTD_").split("__"))
        .extract()
        .map_err(|e| ConfigError::ParseError(e.to_string()))?;

    Ok(config)
}

/// Load configuration from TOML string (useful for testing)
pub fn load_config_from_str(toml_str: &str) -> Result<Config, ConfigError> {
    toml::from_str(toml_str).map_err(|e| ConfigError::ParseError(e.to_string()))
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;
    use tempfile::NamedTempFile;

    const MINIMAL: &str = r#"
[queue]
endpoint = "http://localhost:9324"
queue_url = "http://localhost:9324/queue/ingest-in"

[storage]
endpoint = "http://localhost:9000"

[convert]
binary = "magick"
suffix = "jp2"

[convert.options]
"*" = "-quality 80"

[output]
root = "/srv/iiif"

[[rules]]
pattern = '^(\d+)$'
template = "{:1}"
"#;

    #[test]
    fn test_load_config_from_str_valid() {
        let config = load_config_from_str(MINIMAL).unwrap();
        assert_eq!(config.queue.endpoint, "http://localhost:9324");
        assert_eq!(config.convert.suffix, "jp2");
    }

    #[test]
    fn test_load_config_from_str_missing_convert() {
        let toml = r#"
[queue]
endpoint = "http://localhost:9324"
queue_url = "http://localhost:9324/queue/ingest-in"

[storage]
endpoint = "http://localhost:9000"
"#;
        let result = load_config_from_str(toml);
        assert!(matches!(result, Err(ConfigError::ParseError(_))));
    }

    #[test]
    fn test_load_config_file_not_found() {
        let result = load_config(Path::new("/nonexistent/config.toml"));
        assert!(matches!(result, Err(ConfigError::FileNotFound(_))));
    }

    #[test]
    fn test_load_config_from_file() {
        let mut temp_file = NamedTempFile::new().unwrap();
        write!(temp_file, "{}", MINIMAL).unwrap();

        let config = load_config(temp_file.path()).unwrap();
        assert_eq!(config.queue.queue_url, "http://localhost:9324/queue/ingest-in");
        assert_eq!(config.rules.len(), 1);
    }
}
