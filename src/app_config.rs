use std::path::Path;

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};

use crate::errors::ConfigError;
use crate::language_utils;

/// Application configuration
///
/// Persisted as JSON (conf.json by default): read at startup, written back
/// when created from defaults or changed. CLI flags override individual
/// fields after loading.
#[derive(Debug, Serialize, Deserialize, Clone)]
pub struct Config {
    /// Source language code or name (used for track auto-selection)
    pub source_language: String,

    /// Target language code or name
    pub target_language: String,

    /// Remote translation service settings
    #[serde(default)]
    pub translation: TranslationConfig,

    /// Pipeline behaviour settings
    #[serde(default)]
    pub pipeline: PipelineConfig,

    /// Log level
    #[serde(default)]
    pub log_level: LogLevel,
}

/// Settings for the OpenAI-compatible translation endpoint
#[derive(Debug, Serialize, Deserialize, Clone)]
pub struct TranslationConfig {
    /// Model name
    #[serde(default = "default_model")]
    pub model: String,

    /// API key; an explicit value here, never an environment variable
    #[serde(default = "String::new")]
    pub api_key: String,

    /// Service endpoint URL (change for LM Studio or other local servers)
    #[serde(default = "default_endpoint")]
    pub endpoint: String,

    /// Per-request timeout in seconds
    #[serde(default = "default_timeout_secs")]
    pub timeout_secs: u64,

    /// Temperature for generation; low keeps translations literal
    #[serde(default = "default_temperature")]
    pub temperature: f32,
}

/// Settings controlling batching, retry and partial runs
#[derive(Debug, Serialize, Deserialize, Clone)]
pub struct PipelineConfig {
    /// Cues per translation request
    #[serde(default = "default_max_batch_size")]
    pub max_batch_size: usize,

    /// Retry attempts per batch on transient failures
    #[serde(default = "default_retry_limit")]
    pub retry_limit: u32,

    /// Base backoff in milliseconds, doubled on each retry
    #[serde(default = "default_retry_backoff_ms")]
    pub retry_backoff_ms: u64,

    /// Cap on total cues translated; cues past the cap keep source text.
    /// A documented partial-translation mode for dry runs, not a failure.
    #[serde(default)]
    pub block_limit: Option<usize>,

    /// Automatically pick a source-language subtitle track from the container
    #[serde(default = "default_true")]
    pub auto_select_source_track: bool,
}

/// Log verbosity level
#[derive(Debug, Serialize, Deserialize, Clone, PartialEq, Default)]
#[serde(rename_all = "lowercase")]
pub enum LogLevel {
    Error,
    Warn,
    #[default]
    Info,
    Debug,
    Trace,
}

fn default_model() -> String {
    "gpt-4o-mini".to_string()
}

fn default_endpoint() -> String {
    "https://api.openai.com/v1".to_string()
}

fn default_timeout_secs() -> u64 {
    30
}

fn default_temperature() -> f32 {
    0.3
}

fn default_max_batch_size() -> usize {
    10
}

fn default_retry_limit() -> u32 {
    3
}

fn default_retry_backoff_ms() -> u64 {
    1000
}

fn default_true() -> bool {
    true
}

impl Default for TranslationConfig {
    fn default() -> Self {
        Self {
            model: default_model(),
            api_key: String::new(),
            endpoint: default_endpoint(),
            timeout_secs: default_timeout_secs(),
            temperature: default_temperature(),
        }
    }
}

impl Default for PipelineConfig {
    fn default() -> Self {
        Self {
            max_batch_size: default_max_batch_size(),
            retry_limit: default_retry_limit(),
            retry_backoff_ms: default_retry_backoff_ms(),
            block_limit: None,
            auto_select_source_track: true,
        }
    }
}

impl Default for Config {
    fn default() -> Self {
        Config {
            source_language: "en".to_string(),
            target_language: "es".to_string(),
            translation: TranslationConfig::default(),
            pipeline: PipelineConfig::default(),
            log_level: LogLevel::default(),
        }
    }
}

impl TranslationConfig {
    /// Local endpoints (LM Studio, proxies) typically need no API key
    pub fn is_local_endpoint(&self) -> bool {
        self.endpoint.contains("localhost") || self.endpoint.contains("127.0.0.1")
    }
}

impl Config {
    /// Load configuration from a JSON file
    pub fn load<P: AsRef<Path>>(path: P) -> Result<Self> {
        let path = path.as_ref();
        let content = std::fs::read_to_string(path)
            .with_context(|| format!("failed to open config file: {}", path.display()))?;
        serde_json::from_str(&content)
            .with_context(|| format!("failed to parse config file: {}", path.display()))
    }

    /// Write configuration to a JSON file
    pub fn save<P: AsRef<Path>>(&self, path: P) -> Result<()> {
        let json = serde_json::to_string_pretty(self).context("failed to serialize config")?;
        std::fs::write(path.as_ref(), json)
            .with_context(|| format!("failed to write config file: {}", path.as_ref().display()))?;
        Ok(())
    }

    /// Validate the configuration before any work starts
    pub fn validate(&self) -> Result<(), ConfigError> {
        language_utils::resolve_language(&self.source_language)?;
        language_utils::resolve_language(&self.target_language)?;

        if self.pipeline.max_batch_size == 0 {
            return Err(ConfigError::InvalidBatchSize(self.pipeline.max_batch_size));
        }

        if self.translation.timeout_secs == 0 {
            return Err(ConfigError::InvalidValue(
                "timeout_secs must be at least 1".to_string(),
            ));
        }

        if url::Url::parse(&self.translation.endpoint).is_err() {
            return Err(ConfigError::InvalidValue(format!(
                "endpoint is not a valid URL: {}",
                self.translation.endpoint
            )));
        }

        if self.translation.api_key.is_empty() && !self.translation.is_local_endpoint() {
            return Err(ConfigError::MissingApiKey);
        }

        Ok(())
    }
}
