// src/infra/config.rs — Configuration loading (TOML)
//
// Built once in `main` and passed down by reference. Nothing reads the
// environment after this point except the provider resolver (API key).

use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use std::time::Duration;

use crate::core::retry::RetryPolicy;
use crate::infra::paths;

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Config {
    #[serde(default)]
    pub llm: LlmConfig,

    #[serde(default)]
    pub workflow: WorkflowConfig,

    #[serde(default)]
    pub retry: RetryConfig,

    #[serde(default)]
    pub storage: StorageConfig,

    #[serde(default)]
    pub campaign: CampaignConfig,

    #[serde(default = "default_log_level")]
    pub log_level: String,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            llm: LlmConfig::default(),
            workflow: WorkflowConfig::default(),
            retry: RetryConfig::default(),
            storage: StorageConfig::default(),
            campaign: CampaignConfig::default(),
            log_level: default_log_level(),
        }
    }
}

fn default_log_level() -> String {
    "warn".into()
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct LlmConfig {
    /// `openai` (any OpenAI-compatible endpoint) or `ollama`.
    pub provider: String,
    pub model: String,
    pub base_url: Option<String>,
    /// Falls back to OPENAI_API_KEY when unset.
    pub api_key: Option<String>,
    pub temperature: f32,
    /// Used for copywriting calls.
    pub creative_temperature: f32,
    pub max_tokens: u32,
    pub timeout_seconds: u64,
}

impl Default for LlmConfig {
    fn default() -> Self {
        Self {
            provider: "openai".into(),
            model: "gpt-4.1-mini".into(),
            base_url: None,
            api_key: None,
            temperature: 0.7,
            creative_temperature: 0.8,
            max_tokens: 2000,
            timeout_seconds: 60,
        }
    }
}

impl LlmConfig {
    pub fn timeout(&self) -> Duration {
        Duration::from_secs(self.timeout_seconds)
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct WorkflowConfig {
    pub enable_feedback_loop: bool,
    /// Total rounds including the initial run; the feedback loop runs at most
    /// `max_iterations - 1` extra rounds.
    pub max_iterations: u32,
    /// Ask the model to revise positioning from campaign feedback. When off,
    /// refinement passes the analysis through unchanged.
    pub refine_with_feedback: bool,
    /// Wrap feedback-round stage calls in the stage retry policy too.
    pub retry_feedback_stages: bool,
    /// Content variants generated per platform.
    pub num_variants: u32,
}

impl Default for WorkflowConfig {
    fn default() -> Self {
        Self {
            enable_feedback_loop: true,
            max_iterations: 2,
            refine_with_feedback: true,
            retry_feedback_stages: false,
            num_variants: 1,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct RetryConfig {
    pub max_attempts: u32,
    pub base_delay_ms: u64,
    pub backoff_factor: f64,
}

impl Default for RetryConfig {
    fn default() -> Self {
        Self {
            max_attempts: 3,
            base_delay_ms: 1_000,
            backoff_factor: 2.0,
        }
    }
}

impl From<&RetryConfig> for RetryPolicy {
    fn from(cfg: &RetryConfig) -> Self {
        RetryPolicy {
            max_attempts: cfg.max_attempts,
            base_delay: Duration::from_millis(cfg.base_delay_ms),
            backoff_factor: cfg.backoff_factor,
        }
    }
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct StorageConfig {
    pub sessions_dir: Option<PathBuf>,
}

impl StorageConfig {
    pub fn sessions_dir(&self) -> PathBuf {
        self.sessions_dir.clone().unwrap_or_else(paths::sessions_dir)
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct CampaignConfig {
    pub default_budget: f64,
    /// Revenue per simulated conversion.
    pub average_order_value: f64,
}

impl Default for CampaignConfig {
    fn default() -> Self {
        Self {
            default_budget: 10_000.0,
            average_order_value: 100.0,
        }
    }
}

impl Config {
    /// Load config from file, falling back to defaults.
    pub fn load() -> anyhow::Result<Self> {
        let path = paths::config_file_path();
        if path.exists() {
            Self::load_from(&path)
        } else {
            Ok(Self::default())
        }
    }

    pub fn load_from(path: &Path) -> anyhow::Result<Self> {
        let content = std::fs::read_to_string(path)?;
        let config: Config = toml::from_str(&content)?;
        Ok(config)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults_reasonable() {
        let c = Config::default();
        assert_eq!(c.llm.provider, "openai");
        assert_eq!(c.llm.model, "gpt-4.1-mini");
        assert_eq!(c.llm.max_tokens, 2000);
        assert!(c.workflow.enable_feedback_loop);
        assert_eq!(c.workflow.max_iterations, 2);
        assert!(!c.workflow.retry_feedback_stages);
        assert_eq!(c.retry.max_attempts, 3);
        assert_eq!(c.log_level, "warn");
    }

    #[test]
    fn test_parse_minimal_toml() {
        let config: Config = toml::from_str("").unwrap();
        assert_eq!(config.workflow.max_iterations, 2);
        assert_eq!(config.retry.base_delay_ms, 1000);
        assert!((config.campaign.average_order_value - 100.0).abs() < f64::EPSILON);
    }

    #[test]
    fn test_parse_partial_section_keeps_other_defaults() {
        let toml_str = r#"
[llm]
model = "gpt-4.1"

[workflow]
max_iterations = 4
"#;
        let config: Config = toml::from_str(toml_str).unwrap();
        assert_eq!(config.llm.model, "gpt-4.1");
        assert_eq!(config.llm.provider, "openai");
        assert!((config.llm.temperature - 0.7).abs() < 0.001);
        assert_eq!(config.workflow.max_iterations, 4);
        assert!(config.workflow.enable_feedback_loop);
    }

    #[test]
    fn test_parse_full_toml() {
        let toml_str = r#"
log_level = "debug"

[llm]
provider = "ollama"
model = "llama3.3"
base_url = "http://localhost:11434"
temperature = 0.2
creative_temperature = 0.9
max_tokens = 1024
timeout_seconds = 30

[workflow]
enable_feedback_loop = false
max_iterations = 3
refine_with_feedback = false
retry_feedback_stages = true
num_variants = 2

[retry]
max_attempts = 5
base_delay_ms = 250
backoff_factor = 3.0

[storage]
sessions_dir = "/tmp/brandloop-sessions"

[campaign]
default_budget = 5000.0
average_order_value = 80.0
"#;
        let config: Config = toml::from_str(toml_str).unwrap();
        assert_eq!(config.log_level, "debug");
        assert_eq!(config.llm.provider, "ollama");
        assert_eq!(config.llm.timeout(), Duration::from_secs(30));
        assert!(!config.workflow.enable_feedback_loop);
        assert!(config.workflow.retry_feedback_stages);
        assert_eq!(config.workflow.num_variants, 2);
        assert_eq!(
            config.storage.sessions_dir(),
            PathBuf::from("/tmp/brandloop-sessions")
        );

        let policy = RetryPolicy::from(&config.retry);
        assert_eq!(policy.max_attempts, 5);
        assert_eq!(policy.base_delay, Duration::from_millis(250));
        assert!((policy.backoff_factor - 3.0).abs() < f64::EPSILON);
    }

    #[test]
    fn test_default_sessions_dir() {
        let s = StorageConfig::default();
        assert_eq!(s.sessions_dir(), paths::sessions_dir());
    }

    #[test]
    fn test_serialize_roundtrip() {
        let config = Config::default();
        let serialized = toml::to_string(&config).unwrap();
        let deserialized: Config = toml::from_str(&serialized).unwrap();
        assert_eq!(
            deserialized.workflow.max_iterations,
            config.workflow.max_iterations
        );
        assert_eq!(deserialized.llm.model, config.llm.model);
    }

    #[test]
    fn test_load_nonexistent_file() {
        let result = Config::load_from(Path::new("/nonexistent/brandloop/config.toml"));
        assert!(result.is_err());
    }
}
