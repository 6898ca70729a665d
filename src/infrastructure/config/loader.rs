use std::path::Path;

use anyhow::{Context, Result};
use figment::providers::{Env, Format, Serialized, Yaml};
use figment::Figment;
use thiserror::Error;

use crate::domain::models::config::Config;

/// Configuration error types
#[derive(Error, Debug, PartialEq, Eq)]
pub enum ConfigError {
    #[error("Invalid log level: {0}. Must be one of: trace, debug, info, warn, error")]
    InvalidLogLevel(String),

    #[error("Invalid log format: {0}. Must be one of: json, pretty")]
    InvalidLogFormat(String),

    #[error("Invalid log rotation: {0}. Must be one of: daily, hourly, never")]
    InvalidLogRotation(String),

    #[error("Retry schedule cannot be empty")]
    EmptyRetrySchedule,

    #[error("Retry schedule entries must be positive")]
    ZeroRetryWait,

    #[error("Invalid rate limit: {0}. Must be positive")]
    InvalidRateLimit(u32),

    #[error("Invalid burst_size: {0}. Must be at least 1")]
    InvalidBurstSize(u32),

    #[error("Invalid {field}: must be at least 1")]
    InvalidTopK { field: &'static str },

    #[error("Invalid max_chunk_chars: must be at least 1")]
    InvalidMaxChunkChars,

    #[error("Invalid context.max_exchanges: must be at least 1 when set")]
    InvalidMaxExchanges,

    #[error("Invalid providers.timeout_secs: must be at least 1")]
    InvalidTimeout,

    #[error("Configuration validation failed: {0}")]
    ValidationFailed(String),
}

const ENV_PREFIX: &str = "DOCENT_";

/// Configuration loader with hierarchical merging
pub struct ConfigLoader;

impl ConfigLoader {
    /// Load configuration with hierarchical merging
    ///
    /// Precedence (lowest to highest):
    /// 1. Programmatic defaults (Serialized)
    /// 2. .docent/config.yaml (project config)
    /// 3. .docent/local.yaml (local overrides, optional)
    /// 4. Environment variables (DOCENT_* prefix, `__` separates nested keys)
    pub fn load() -> Result<Config> {
        let config: Config = Figment::new()
            .merge(Serialized::defaults(Config::default()))
            .merge(Yaml::file(".docent/config.yaml"))
            .merge(Yaml::file(".docent/local.yaml"))
            .merge(Env::prefixed(ENV_PREFIX).split("__"))
            .extract()
            .context("Failed to extract configuration from figment")?;

        Self::validate(&config)?;
        Ok(config)
    }

    /// Load configuration from a specific file; environment variables still apply
    pub fn load_from_file(path: impl AsRef<Path>) -> Result<Config> {
        let path = path.as_ref();
        if !path.exists() {
            anyhow::bail!("Config file not found: {}", path.display());
        }

        let config: Config = Figment::new()
            .merge(Serialized::defaults(Config::default()))
            .merge(Yaml::file(path))
            .merge(Env::prefixed(ENV_PREFIX).split("__"))
            .extract()
            .with_context(|| format!("Failed to load config from {}", path.display()))?;

        Self::validate(&config)?;
        Ok(config)
    }

    /// `--config` wins over the project files
    pub fn load_with_override(path: Option<&Path>) -> Result<Config> {
        match path {
            Some(path) => Self::load_from_file(path),
            None => Self::load(),
        }
    }

    /// Validate configuration after loading
    pub fn validate(config: &Config) -> Result<(), ConfigError> {
        let valid_log_levels = ["trace", "debug", "info", "warn", "error"];
        if !valid_log_levels.contains(&config.logging.level.as_str()) {
            return Err(ConfigError::InvalidLogLevel(config.logging.level.clone()));
        }

        let valid_log_formats = ["json", "pretty"];
        if !valid_log_formats.contains(&config.logging.format.as_str()) {
            return Err(ConfigError::InvalidLogFormat(config.logging.format.clone()));
        }

        let valid_rotations = ["daily", "hourly", "never"];
        if !valid_rotations.contains(&config.logging.rotation.as_str()) {
            return Err(ConfigError::InvalidLogRotation(
                config.logging.rotation.clone(),
            ));
        }

        if config.retry.schedule_secs.is_empty() {
            return Err(ConfigError::EmptyRetrySchedule);
        }
        if config.retry.schedule_secs.contains(&0) {
            return Err(ConfigError::ZeroRetryWait);
        }

        if config.rate_limit.requests_per_minute == 0 {
            return Err(ConfigError::InvalidRateLimit(
                config.rate_limit.requests_per_minute,
            ));
        }
        if config.rate_limit.burst_size == 0 {
            return Err(ConfigError::InvalidBurstSize(config.rate_limit.burst_size));
        }

        if config.providers.timeout_secs == 0 {
            return Err(ConfigError::InvalidTimeout);
        }

        let retrieval = &config.retrieval;
        if retrieval.project_top_k == 0 {
            return Err(ConfigError::InvalidTopK {
                field: "retrieval.project_top_k",
            });
        }
        if retrieval.global_top_k == 0 {
            return Err(ConfigError::InvalidTopK {
                field: "retrieval.global_top_k",
            });
        }
        if retrieval.max_chunk_chars == 0 {
            return Err(ConfigError::InvalidMaxChunkChars);
        }
        if retrieval.project_store.collection.trim().is_empty()
            || retrieval.global_store.collection.trim().is_empty()
        {
            return Err(ConfigError::ValidationFailed(
                "retrieval collection names cannot be empty".to_string(),
            ));
        }

        if config.context.max_exchanges == Some(0) {
            return Err(ConfigError::InvalidMaxExchanges);
        }

        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::models::RetrievalBackend;
    use std::io::Write;
    use std::path::PathBuf;
    use tempfile::NamedTempFile;

    fn yaml_file(contents: &str) -> NamedTempFile {
        let mut file = tempfile::Builder::new()
            .suffix(".yaml")
            .tempfile()
            .expect("temp file");
        file.write_all(contents.as_bytes()).expect("write yaml");
        file
    }

    #[test]
    fn test_default_config() {
        let config = Config::default();
        assert_eq!(config.agents_file, PathBuf::from("config/agents.yaml"));
        assert_eq!(config.roles_dir, PathBuf::from("roles"));
        assert_eq!(config.logging.level, "warn");
        assert_eq!(config.retry.schedule_secs, vec![60, 120, 240]);
        assert_eq!(config.rate_limit.requests_per_minute, 50);
        assert_eq!(config.retrieval.backend, RetrievalBackend::Chroma);
        assert_eq!(config.retrieval.project_store.collection, "rag_collection");
        assert_eq!(config.retrieval.global_store.collection, "knowledge_base");
        assert_eq!(config.retrieval.project_top_k, 5);
        assert_eq!(config.retrieval.global_top_k, 3);
        assert_eq!(config.retrieval.max_chunk_chars, 500);
        assert_eq!(config.providers.timeout_secs, 300);
        assert_eq!(config.context.max_exchanges, None);
        ConfigLoader::validate(&config).expect("Default config should be valid");
    }

    #[test]
    fn test_yaml_parsing() {
        let yaml = r"
agents_file: team/agents.yaml
logging:
  level: debug
  format: json
retry:
  schedule_secs: [1, 2]
retrieval:
  backend: disabled
  global_top_k: 7
context:
  max_exchanges: 10
";

        let config: Config = serde_yaml::from_str(yaml).expect("YAML should parse");

        assert_eq!(config.agents_file, PathBuf::from("team/agents.yaml"));
        assert_eq!(config.logging.level, "debug");
        assert_eq!(config.logging.format, "json");
        assert_eq!(config.retry.schedule_secs, vec![1, 2]);
        assert_eq!(config.retrieval.backend, RetrievalBackend::Disabled);
        assert_eq!(config.retrieval.global_top_k, 7);
        assert_eq!(config.retrieval.project_top_k, 5);
        assert_eq!(config.context.max_exchanges, Some(10));

        ConfigLoader::validate(&config).expect("Parsed config should be valid");
    }

    #[test]
    fn test_validate_invalid_log_level() {
        let mut config = Config::default();
        config.logging.level = "invalid".to_string();

        match ConfigLoader::validate(&config).unwrap_err() {
            ConfigError::InvalidLogLevel(level) => assert_eq!(level, "invalid"),
            other => panic!("Expected InvalidLogLevel error, got {other:?}"),
        }
    }

    #[test]
    fn test_validate_invalid_log_format() {
        let mut config = Config::default();
        config.logging.format = "xml".to_string();

        assert_eq!(
            ConfigLoader::validate(&config).unwrap_err(),
            ConfigError::InvalidLogFormat("xml".to_string())
        );
    }

    #[test]
    fn test_validate_empty_retry_schedule() {
        let mut config = Config::default();
        config.retry.schedule_secs.clear();
        assert_eq!(
            ConfigLoader::validate(&config).unwrap_err(),
            ConfigError::EmptyRetrySchedule
        );
    }

    #[test]
    fn test_validate_zero_retry_wait() {
        let mut config = Config::default();
        config.retry.schedule_secs = vec![60, 0];
        assert_eq!(
            ConfigLoader::validate(&config).unwrap_err(),
            ConfigError::ZeroRetryWait
        );
    }

    #[test]
    fn test_validate_zero_rate_limit() {
        let mut config = Config::default();
        config.rate_limit.requests_per_minute = 0;
        assert!(matches!(
            ConfigLoader::validate(&config).unwrap_err(),
            ConfigError::InvalidRateLimit(0)
        ));
    }

    #[test]
    fn test_validate_zero_burst_size() {
        let mut config = Config::default();
        config.rate_limit.burst_size = 0;
        assert!(matches!(
            ConfigLoader::validate(&config).unwrap_err(),
            ConfigError::InvalidBurstSize(0)
        ));
    }

    #[test]
    fn test_validate_zero_top_k() {
        let mut config = Config::default();
        config.retrieval.global_top_k = 0;
        assert_eq!(
            ConfigLoader::validate(&config).unwrap_err(),
            ConfigError::InvalidTopK {
                field: "retrieval.global_top_k"
            }
        );
    }

    #[test]
    fn test_validate_zero_max_exchanges() {
        let mut config = Config::default();
        config.context.max_exchanges = Some(0);
        assert_eq!(
            ConfigLoader::validate(&config).unwrap_err(),
            ConfigError::InvalidMaxExchanges
        );
    }

    #[test]
    fn test_load_from_file_merges_over_defaults() {
        let file = yaml_file("logging:\n  level: info\nrate_limit:\n  burst_size: 9\n");

        let config = temp_env::with_vars_unset(
            ["DOCENT_LOGGING__LEVEL", "DOCENT_RATE_LIMIT__BURST_SIZE"],
            || ConfigLoader::load_from_file(file.path()),
        )
        .expect("config should load");

        assert_eq!(config.logging.level, "info");
        assert_eq!(config.rate_limit.burst_size, 9);
        assert_eq!(config.rate_limit.requests_per_minute, 50);
    }

    #[test]
    fn test_env_override() {
        let file = yaml_file("logging:\n  level: info\n");

        let config = temp_env::with_vars(
            [
                ("DOCENT_LOGGING__LEVEL", Some("debug")),
                ("DOCENT_RETRIEVAL__GLOBAL_STORE__COLLECTION", Some("handbook")),
                ("DOCENT_RETRY__SCHEDULE_SECS", Some("[5, 10]")),
            ],
            || ConfigLoader::load_from_file(file.path()),
        )
        .expect("config should load");

        assert_eq!(config.logging.level, "debug");
        assert_eq!(config.retrieval.global_store.collection, "handbook");
        assert_eq!(config.retry.schedule_secs, vec![5, 10]);
    }

    #[test]
    fn test_invalid_file_values_fail_validation() {
        let file = yaml_file("logging:\n  format: xml\n");
        let result = temp_env::with_vars_unset(["DOCENT_LOGGING__FORMAT"], || {
            ConfigLoader::load_from_file(file.path())
        });
        assert!(result.is_err());
    }

    #[test]
    fn test_missing_file_is_an_error() {
        let result = ConfigLoader::load_from_file("/definitely/not/here.yaml");
        assert!(result.unwrap_err().to_string().contains("not found"));
    }
}
