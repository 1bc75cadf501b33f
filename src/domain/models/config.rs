use serde::{Deserialize, Serialize};
use std::path::PathBuf;

/// Main configuration structure for Conclave
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub struct Config {
    /// LLM defaults and provider credentials
    #[serde(default)]
    pub llm: LlmConfig,

    /// Executor tuning for special agent behaviors
    #[serde(default)]
    pub executor: ExecutorConfig,

    /// Epic/story pipeline configuration
    #[serde(default)]
    pub pipeline: PipelineConfig,

    /// Template store configuration
    #[serde(default)]
    pub templates: TemplatesConfig,

    /// Logging configuration
    #[serde(default)]
    pub logging: LoggingConfig,
}

/// LLM defaults and provider credentials
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub struct LlmConfig {
    /// Model used when a caller does not pick one
    #[serde(default = "default_model")]
    pub default_model: String,

    #[serde(default = "default_temperature")]
    pub default_temperature: f32,

    /// Per-request HTTP timeout
    #[serde(default = "default_timeout_secs")]
    pub timeout_secs: u64,

    #[serde(default)]
    pub openai: ProviderCredentials,

    #[serde(default)]
    pub deepseek: ProviderCredentials,

    #[serde(default)]
    pub kimi: ProviderCredentials,
}

fn default_model() -> String {
    "gpt-4o-mini".to_string()
}

const fn default_temperature() -> f32 {
    0.7
}

const fn default_timeout_secs() -> u64 {
    120
}

impl Default for LlmConfig {
    fn default() -> Self {
        Self {
            default_model: default_model(),
            default_temperature: default_temperature(),
            timeout_secs: default_timeout_secs(),
            openai: ProviderCredentials::default(),
            deepseek: ProviderCredentials::default(),
            kimi: ProviderCredentials::default(),
        }
    }
}

/// Credentials for one provider. Unset fields fall back to environment
/// variables and the provider's public endpoint.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub struct ProviderCredentials {
    #[serde(default)]
    pub api_key: Option<String>,

    #[serde(default)]
    pub base_url: Option<String>,
}

/// Executor tuning
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub struct ExecutorConfig {
    /// Token limit for standard agents
    #[serde(default = "default_standard_max_tokens")]
    pub standard_max_tokens: u32,

    /// Token limit for the questions agent
    #[serde(default = "default_question_max_tokens")]
    pub question_max_tokens: u32,

    #[serde(default = "default_question_temperature")]
    pub question_temperature: f32,

    /// Token limit for each variation call
    #[serde(default = "default_variation_max_tokens")]
    pub variation_max_tokens: u32,

    /// Temperature of the first variation; each further one adds 0.1
    #[serde(default = "default_variation_base_temperature")]
    pub variation_base_temperature: f32,
}

const fn default_standard_max_tokens() -> u32 {
    1500
}

const fn default_question_max_tokens() -> u32 {
    1000
}

const fn default_question_temperature() -> f32 {
    0.6
}

const fn default_variation_max_tokens() -> u32 {
    800
}

const fn default_variation_base_temperature() -> f32 {
    0.8
}

impl Default for ExecutorConfig {
    fn default() -> Self {
        Self {
            standard_max_tokens: default_standard_max_tokens(),
            question_max_tokens: default_question_max_tokens(),
            question_temperature: default_question_temperature(),
            variation_max_tokens: default_variation_max_tokens(),
            variation_base_temperature: default_variation_base_temperature(),
        }
    }
}

/// Epic/story pipeline configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub struct PipelineConfig {
    /// Directory receiving intermediate JSON files and the final plan
    #[serde(default = "default_output_dir")]
    pub output_dir: PathBuf,

    #[serde(default = "default_epics_template_id")]
    pub epics_template_id: String,

    #[serde(default = "default_stories_template_id")]
    pub stories_template_id: String,
}

fn default_output_dir() -> PathBuf {
    PathBuf::from(".conclave/development_plans")
}

fn default_epics_template_id() -> String {
    "epics_generator_default".to_string()
}

fn default_stories_template_id() -> String {
    "stories_generator_default".to_string()
}

impl Default for PipelineConfig {
    fn default() -> Self {
        Self {
            output_dir: default_output_dir(),
            epics_template_id: default_epics_template_id(),
            stories_template_id: default_stories_template_id(),
        }
    }
}

/// Template store configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub struct TemplatesConfig {
    /// JSON file the store is loaded from and persisted to. `None` keeps
    /// the store in memory.
    #[serde(default = "default_templates_path")]
    pub path: Option<PathBuf>,
}

#[allow(clippy::unnecessary_wraps)]
fn default_templates_path() -> Option<PathBuf> {
    Some(PathBuf::from(".conclave/agent_templates.json"))
}

impl Default for TemplatesConfig {
    fn default() -> Self {
        Self {
            path: default_templates_path(),
        }
    }
}

/// Logging configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub struct LoggingConfig {
    /// Log level: trace, debug, info, warn, error
    #[serde(default = "default_log_level")]
    pub level: String,

    /// Console format
    #[serde(default)]
    pub format: LogFormat,

    /// Directory for rolling JSON log files; console only when unset
    #[serde(default)]
    pub log_dir: Option<PathBuf>,

    /// Also log to stderr when `log_dir` is set
    #[serde(default = "default_true")]
    pub enable_console: bool,

    #[serde(default)]
    pub rotation: RotationPolicy,
}

#[derive(Debug, Clone, Copy, Default, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum LogFormat {
    #[default]
    Json,
    Pretty,
}

#[derive(Debug, Clone, Copy, Default, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum RotationPolicy {
    #[default]
    Daily,
    Hourly,
    Never,
}

fn default_log_level() -> String {
    "info".to_string()
}

const fn default_true() -> bool {
    true
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: default_log_level(),
            format: LogFormat::default(),
            log_dir: None,
            enable_console: true,
            rotation: RotationPolicy::default(),
        }
    }
}
