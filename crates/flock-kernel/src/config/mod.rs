//! 全局配置
//! Global configuration
//!
//! Layering, later sources override earlier ones:
//!
//! 1. built-in defaults ([`FlockConfig::default`])
//! 2. an optional file (YAML / TOML / JSON by extension) with `${VAR}` substitution
//! 3. environment variables prefixed `FLOCK_`, nested with `__`
//!    (e.g. `FLOCK_LOGGING__LEVEL=debug`)

use crate::agent::DEFAULT_MODEL;
use config::{Config as Cfg, Environment, File, FileFormat};
use regex::Regex;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::path::Path;

/// Configuration error
#[derive(Debug, thiserror::Error)]
#[non_exhaustive]
pub enum ConfigError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Config parsing error: {0}")]
    Parse(String),

    #[error("Unsupported format: {0}")]
    UnsupportedFormat(String),

    #[error("Serialization error: {0}")]
    Serialization(String),
}

/// Result type for config operations
pub type ConfigResult<T> = Result<T, ConfigError>;

/// Environment variable prefix
pub const ENV_PREFIX: &str = "FLOCK";

// ============================================================================
// 配置结构
// ============================================================================

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct FlockConfig {
    /// Model for agents that do not name one.
    pub default_model: String,
    /// Run chains in-process instead of through the workflow executor.
    pub local_debug: bool,
    pub logging: LoggingConfig,
    pub chain: ChainConfig,
    pub workflow: WorkflowConfig,
}

impl Default for FlockConfig {
    fn default() -> Self {
        Self {
            default_model: DEFAULT_MODEL.to_string(),
            local_debug: false,
            logging: LoggingConfig::default(),
            chain: ChainConfig::default(),
            workflow: WorkflowConfig::default(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct LoggingConfig {
    /// `EnvFilter` directive used when `RUST_LOG` is unset.
    pub level: String,
    pub json: bool,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: "info".to_string(),
            json: false,
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ChainConfig {
    /// Upper bound on agent executions per chain; unlimited when unset.
    pub max_steps: Option<usize>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct WorkflowConfig {
    pub task_queue: String,
    pub start_to_close_timeout_ms: u64,
    pub retry: RetrySettings,
}

impl Default for WorkflowConfig {
    fn default() -> Self {
        Self {
            task_queue: "flock-queue".to_string(),
            start_to_close_timeout_ms: 5 * 60 * 1000,
            retry: RetrySettings::default(),
        }
    }
}

/// Retry settings for activity execution.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct RetrySettings {
    /// Total attempts including the first one.
    pub max_attempts: u32,
    pub initial_interval_ms: u64,
    /// Exponential backoff doubles from `initial_interval_ms` up to this cap.
    pub max_interval_ms: u64,
    pub jitter: bool,
}

impl Default for RetrySettings {
    fn default() -> Self {
        Self {
            max_attempts: 1,
            initial_interval_ms: 1000,
            max_interval_ms: 30_000,
            jitter: false,
        }
    }
}

// ============================================================================
// 加载
// ============================================================================

/// Detect configuration format from file extension
pub fn detect_format(path: &Path) -> ConfigResult<FileFormat> {
    let ext = path
        .extension()
        .and_then(|e| e.to_str())
        .ok_or_else(|| ConfigError::UnsupportedFormat("No file extension found".to_string()))?;

    match ext.to_lowercase().as_str() {
        "yaml" | "yml" => Ok(FileFormat::Yaml),
        "toml" => Ok(FileFormat::Toml),
        "json" => Ok(FileFormat::Json),
        _ => Err(ConfigError::UnsupportedFormat(ext.to_string())),
    }
}

/// Substitute `${VAR_NAME}` references with environment values.
/// Unknown variables are left as written.
pub fn substitute_env_vars(content: &str) -> ConfigResult<String> {
    let re = Regex::new(r"\$\{([A-Za-z_][A-Za-z0-9_]*)\}")
        .map_err(|e| ConfigError::Parse(e.to_string()))?;

    Ok(re
        .replace_all(content, |caps: &regex::Captures| {
            std::env::var(&caps[1]).unwrap_or_else(|_| caps[0].to_string())
        })
        .to_string())
}

impl FlockConfig {
    /// Load defaults, an optional file, then `FLOCK_*` environment overrides.
    pub fn load(path: Option<&Path>) -> ConfigResult<Self> {
        let file = match path {
            Some(path) => Some((std::fs::read_to_string(path)?, detect_format(path)?)),
            None => None,
        };
        Self::build(file, None)
    }

    /// Parse configuration from a string in the given format, without
    /// environment overrides.
    pub fn from_str(content: &str, format: FileFormat) -> ConfigResult<Self> {
        Self::build(Some((content.to_string(), format)), Some(HashMap::new()))
    }

    fn build(
        file: Option<(String, FileFormat)>,
        env: Option<HashMap<String, String>>,
    ) -> ConfigResult<Self> {
        let defaults =
            Cfg::try_from(&FlockConfig::default()).map_err(|e| ConfigError::Parse(e.to_string()))?;

        let mut builder = Cfg::builder().add_source(defaults);

        if let Some((content, format)) = file {
            let substituted = substitute_env_vars(&content)?;
            builder = builder.add_source(File::from_str(&substituted, format));
        }

        builder = builder.add_source(
            Environment::with_prefix(ENV_PREFIX)
                .prefix_separator("_")
                .separator("__")
                .try_parsing(true)
                .source(env),
        );

        builder
            .build()
            .map_err(|e| ConfigError::Parse(e.to_string()))?
            .try_deserialize()
            .map_err(|e| ConfigError::Serialization(e.to_string()))
    }
}
