use anyhow::{Context, Result};
use figment::Figment;
use figment::providers::{Env, Format, Serialized, Yaml};
use std::path::Path;
use thiserror::Error;

use crate::domain::models::config::Config;

/// Project-local configuration directory.
pub const CONFIG_DIR: &str = ".conclave";
/// Prefix of environment overrides, e.g. `CONCLAVE_LLM__DEFAULT_MODEL`.
pub const ENV_PREFIX: &str = "CONCLAVE_";

const VALID_LOG_LEVELS: [&str; 5] = ["trace", "debug", "info", "warn", "error"];
const MAX_TEMPERATURE: f32 = 2.0;

/// Configuration error types
#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("Invalid {field}: {value}. Must be between 0 and 2")]
    InvalidTemperature { field: &'static str, value: f32 },

    #[error("Invalid {0}: must be at least 1")]
    ZeroTokenLimit(&'static str),

    #[error("Invalid timeout_secs: must be at least 1")]
    ZeroTimeout,

    #[error("Default model cannot be empty")]
    EmptyDefaultModel,

    #[error("Template id for {0} cannot be empty")]
    EmptyTemplateId(&'static str),

    #[error("Pipeline output directory cannot be empty")]
    EmptyOutputDir,

    #[error("Invalid log level: {0}. Must be one of: trace, debug, info, warn, error")]
    InvalidLogLevel(String),
}

/// Configuration loader with hierarchical merging
pub struct ConfigLoader;

impl ConfigLoader {
    /// Load configuration with hierarchical merging
    ///
    /// Precedence (lowest to highest):
    /// 1. Programmatic defaults (Serialized)
    /// 2. .conclave/config.yaml
    /// 3. .conclave/local.yaml (optional local overrides)
    /// 4. Environment variables (CONCLAVE_* prefix, `__` separates sections)
    pub fn load() -> Result<Config> {
        let dir = Path::new(CONFIG_DIR);
        let config: Config = Figment::new()
            .merge(Serialized::defaults(Config::default()))
            .merge(Yaml::file(dir.join("config.yaml")))
            .merge(Yaml::file(dir.join("local.yaml")))
            .merge(Env::prefixed(ENV_PREFIX).split("__"))
            .extract()
            .context("Failed to extract configuration from figment")?;

        Self::validate(&config)?;
        Ok(config)
    }

    /// Load configuration from a specific file, still honoring environment
    /// overrides.
    pub fn load_from_file(path: impl AsRef<Path>) -> Result<Config> {
        let config: Config = Figment::new()
            .merge(Serialized::defaults(Config::default()))
            .merge(Yaml::file(path.as_ref()))
            .merge(Env::prefixed(ENV_PREFIX).split("__"))
            .extract()
            .context(format!(
                "Failed to load config from {}",
                path.as_ref().display()
            ))?;

        Self::validate(&config)?;
        Ok(config)
    }

    /// Validate configuration after loading
    pub fn validate(config: &Config) -> Result<(), ConfigError> {
        if config.llm.default_model.trim().is_empty() {
            return Err(ConfigError::EmptyDefaultModel);
        }
        if config.llm.timeout_secs == 0 {
            return Err(ConfigError::ZeroTimeout);
        }

        check_temperature("default_temperature", config.llm.default_temperature)?;
        check_temperature("question_temperature", config.executor.question_temperature)?;
        check_temperature(
            "variation_base_temperature",
            config.executor.variation_base_temperature,
        )?;

        for (field, value) in [
            ("standard_max_tokens", config.executor.standard_max_tokens),
            ("question_max_tokens", config.executor.question_max_tokens),
            ("variation_max_tokens", config.executor.variation_max_tokens),
        ] {
            if value == 0 {
                return Err(ConfigError::ZeroTokenLimit(field));
            }
        }

        if config.pipeline.output_dir.as_os_str().is_empty() {
            return Err(ConfigError::EmptyOutputDir);
        }
        if config.pipeline.epics_template_id.trim().is_empty() {
            return Err(ConfigError::EmptyTemplateId("epics"));
        }
        if config.pipeline.stories_template_id.trim().is_empty() {
            return Err(ConfigError::EmptyTemplateId("stories"));
        }

        if !VALID_LOG_LEVELS.contains(&config.logging.level.as_str()) {
            return Err(ConfigError::InvalidLogLevel(config.logging.level.clone()));
        }

        Ok(())
    }
}

fn check_temperature(field: &'static str, value: f32) -> Result<(), ConfigError> {
    if (0.0..=MAX_TEMPERATURE).contains(&value) {
        Ok(())
    } else {
        Err(ConfigError::InvalidTemperature { field, value })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::models::config::{LogFormat, RotationPolicy};
    use std::io::Write;
    use std::path::PathBuf;
    use tempfile::NamedTempFile;

    #[test]
    fn test_default_config() {
        let config = Config::default();
        assert_eq!(config.llm.default_model, "gpt-4o-mini");
        assert!((config.llm.default_temperature - 0.7).abs() < f32::EPSILON);
        assert_eq!(config.llm.timeout_secs, 120);
        assert_eq!(config.executor.standard_max_tokens, 1500);
        assert_eq!(config.pipeline.epics_template_id, "epics_generator_default");
        assert_eq!(config.logging.level, "info");
        ConfigLoader::validate(&config).expect("Default config should be valid");
    }

    #[test]
    fn test_yaml_parsing() {
        let yaml = r"
llm:
  default_model: deepseek-chat
  timeout_secs: 30
  deepseek:
    api_key: sk-test
executor:
  variation_max_tokens: 400
pipeline:
  output_dir: /tmp/plans
logging:
  level: debug
  format: pretty
  rotation: hourly
";

        let config: Config = serde_yaml::from_str(yaml).expect("YAML should parse");

        assert_eq!(config.llm.default_model, "deepseek-chat");
        assert_eq!(config.llm.timeout_secs, 30);
        assert_eq!(config.llm.deepseek.api_key.as_deref(), Some("sk-test"));
        assert_eq!(config.executor.variation_max_tokens, 400);
        assert_eq!(config.executor.question_max_tokens, 1000);
        assert_eq!(config.pipeline.output_dir, PathBuf::from("/tmp/plans"));
        assert_eq!(config.logging.format, LogFormat::Pretty);
        assert_eq!(config.logging.rotation, RotationPolicy::Hourly);

        ConfigLoader::validate(&config).expect("Parsed config should be valid");
    }

    #[test]
    fn test_unknown_log_format_rejected_at_parse() {
        let yaml = "logging:\n  format: xml\n";
        assert!(serde_yaml::from_str::<Config>(yaml).is_err());
    }

    #[test]
    fn test_validate_temperature_range() {
        let mut config = Config::default();
        config.executor.question_temperature = 2.5;
        assert!(matches!(
            ConfigLoader::validate(&config),
            Err(ConfigError::InvalidTemperature {
                field: "question_temperature",
                ..
            })
        ));

        config.executor.question_temperature = 2.0;
        config.llm.default_temperature = -0.1;
        assert!(matches!(
            ConfigLoader::validate(&config),
            Err(ConfigError::InvalidTemperature {
                field: "default_temperature",
                ..
            })
        ));
    }

    #[test]
    fn test_validate_zero_token_limit() {
        let mut config = Config::default();
        config.executor.variation_max_tokens = 0;
        assert!(matches!(
            ConfigLoader::validate(&config),
            Err(ConfigError::ZeroTokenLimit("variation_max_tokens"))
        ));
    }

    #[test]
    fn test_validate_zero_timeout() {
        let mut config = Config::default();
        config.llm.timeout_secs = 0;
        assert!(matches!(
            ConfigLoader::validate(&config),
            Err(ConfigError::ZeroTimeout)
        ));
    }

    #[test]
    fn test_validate_empty_fields() {
        let mut config = Config::default();
        config.llm.default_model = "  ".to_string();
        assert!(matches!(
            ConfigLoader::validate(&config),
            Err(ConfigError::EmptyDefaultModel)
        ));

        let mut config = Config::default();
        config.pipeline.stories_template_id = String::new();
        assert!(matches!(
            ConfigLoader::validate(&config),
            Err(ConfigError::EmptyTemplateId("stories"))
        ));

        let mut config = Config::default();
        config.pipeline.output_dir = PathBuf::new();
        assert!(matches!(
            ConfigLoader::validate(&config),
            Err(ConfigError::EmptyOutputDir)
        ));
    }

    #[test]
    fn test_validate_invalid_log_level() {
        let mut config = Config::default();
        config.logging.level = "invalid".to_string();

        match ConfigLoader::validate(&config) {
            Err(ConfigError::InvalidLogLevel(level)) => assert_eq!(level, "invalid"),
            other => panic!("Expected InvalidLogLevel error, got {other:?}"),
        }
    }

    #[test]
    fn test_env_override() {
        let mut file = NamedTempFile::new().unwrap();
        writeln!(file, "llm:\n  default_model: gpt-4o\nlogging:\n  level: warn").unwrap();
        file.flush().unwrap();

        temp_env::with_vars(
            [
                ("CONCLAVE_LLM__DEFAULT_MODEL", Some("moonshot-v1-8k")),
                ("CONCLAVE_EXECUTOR__QUESTION_MAX_TOKENS", Some("250")),
            ],
            || {
                let config = ConfigLoader::load_from_file(file.path()).unwrap();
                assert_eq!(config.llm.default_model, "moonshot-v1-8k");
                assert_eq!(config.executor.question_max_tokens, 250);
                assert_eq!(config.logging.level, "warn");
            },
        );
    }

    #[test]
    fn test_hierarchical_merging() {
        let mut base_file = NamedTempFile::new().unwrap();
        writeln!(
            base_file,
            "llm:\n  default_model: gpt-4o\nlogging:\n  level: info\n  format: pretty"
        )
        .unwrap();
        base_file.flush().unwrap();

        let mut override_file = NamedTempFile::new().unwrap();
        writeln!(override_file, "logging:\n  level: debug").unwrap();
        override_file.flush().unwrap();

        let config: Config = Figment::new()
            .merge(Serialized::defaults(Config::default()))
            .merge(Yaml::file(base_file.path()))
            .merge(Yaml::file(override_file.path()))
            .extract()
            .unwrap();

        assert_eq!(config.logging.level, "debug", "Override should win");
        assert_eq!(
            config.logging.format,
            LogFormat::Pretty,
            "Base value should persist when not overridden"
        );
        assert_eq!(config.llm.default_model, "gpt-4o");
    }

    #[test]
    fn test_invalid_file_value_is_reported() {
        let mut file = NamedTempFile::new().unwrap();
        writeln!(file, "llm:\n  timeout_secs: 0").unwrap();
        file.flush().unwrap();

        temp_env::with_vars_unset(["CONCLAVE_LLM__TIMEOUT_SECS"], || {
            assert!(ConfigLoader::load_from_file(file.path()).is_err());
        });
    }
}
