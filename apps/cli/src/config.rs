//! CLI configuration loading and merging.
//!
//! Configuration precedence:
//! 1. CLI arguments (handled by clap)
//! 2. Local config file (./.kilnrc)
//! 3. Global config file (~/.kiln/config.toml)
//! 4. Defaults

use anyhow::Result;
use kiln_eval::{ServingBackend, ServingConfig};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use thiserror::Error;

/// CLI configuration structure.
///
/// Everything here can also be passed as a flag; the config file exists so
/// operators do not have to repeat executable paths on every invocation.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct KilnCliConfig {
    /// Training launcher executable
    #[serde(default)]
    pub train_exec: Option<PathBuf>,

    /// Multi-turn benchmark executable
    #[serde(default)]
    pub mt_bench_exec: Option<PathBuf>,

    /// Knowledge benchmark executable
    #[serde(default)]
    pub mmlu_exec: Option<PathBuf>,

    /// Default serving backend for benchmarks (vllm, llama-cpp)
    #[serde(default)]
    pub serving_backend: Option<String>,

    /// Default GPU count for benchmark serving
    #[serde(default)]
    pub gpus: Option<u32>,

    /// Log level
    #[serde(default)]
    pub log_level: Option<String>,
}

/// Errors that can occur during configuration loading.
#[derive(Debug, Error)]
pub enum CliConfigError {
    /// Configuration file not found.
    #[error("Configuration file not found: {0}")]
    NotFound(String),

    /// Failed to read configuration file.
    #[error("Failed to read configuration file: {0}")]
    ReadError(String),

    /// Failed to parse configuration file.
    #[error("Failed to parse configuration file: {0}")]
    ParseError(String),
}

/// Result type for configuration operations.
pub type CliConfigResult<T> = std::result::Result<T, CliConfigError>;

impl KilnCliConfig {
    /// Load configuration from a TOML file.
    pub fn load_from_file(path: &Path) -> CliConfigResult<Self> {
        if !path.exists() {
            return Err(CliConfigError::NotFound(path.display().to_string()));
        }

        let content = std::fs::read_to_string(path)
            .map_err(|e| CliConfigError::ReadError(format!("{}: {}", path.display(), e)))?;

        toml::from_str(&content)
            .map_err(|e| CliConfigError::ParseError(format!("{}: {}", path.display(), e)))
    }

    /// Save configuration to a TOML file.
    pub fn save_to_file(&self, path: &Path) -> CliConfigResult<()> {
        let content = toml::to_string_pretty(self)
            .map_err(|e| CliConfigError::ParseError(format!("Failed to serialize: {}", e)))?;

        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent).map_err(|e| {
                CliConfigError::ReadError(format!("Failed to create directory: {}", e))
            })?;
        }

        std::fs::write(path, content)
            .map_err(|e| CliConfigError::ReadError(format!("Failed to write file: {}", e)))?;

        Ok(())
    }

    /// Get default global configuration file path.
    pub fn default_global_path() -> PathBuf {
        std::env::var("HOME")
            .map(PathBuf::from)
            .unwrap_or_else(|_| PathBuf::from("."))
            .join(".kiln")
            .join("config.toml")
    }

    /// Get default local configuration file path.
    pub fn default_local_path() -> PathBuf {
        PathBuf::from(".kilnrc")
    }

    /// Discover and load configuration files.
    ///
    /// Loads the global config (~/.kiln/config.toml), then the local config
    /// (./.kilnrc) on top of it. Local values override global ones.
    pub fn discover_and_load() -> Self {
        let mut config = Self::default();

        let global_path = Self::default_global_path();
        if let Ok(global_config) = Self::load_from_file(&global_path) {
            config.merge(&global_config);
        }

        let local_path = Self::default_local_path();
        if let Ok(local_config) = Self::load_from_file(&local_path) {
            config.merge(&local_config);
        }

        config
    }

    /// Merge another configuration into this one.
    ///
    /// Values from `other` override values in `self` if they are Some.
    pub fn merge(&mut self, other: &Self) {
        if let Some(ref train_exec) = other.train_exec {
            self.train_exec = Some(train_exec.clone());
        }
        if let Some(ref mt_bench_exec) = other.mt_bench_exec {
            self.mt_bench_exec = Some(mt_bench_exec.clone());
        }
        if let Some(ref mmlu_exec) = other.mmlu_exec {
            self.mmlu_exec = Some(mmlu_exec.clone());
        }
        if let Some(ref serving_backend) = other.serving_backend {
            self.serving_backend = Some(serving_backend.clone());
        }
        if let Some(gpus) = other.gpus {
            self.gpus = Some(gpus);
        }
        if let Some(ref log_level) = other.log_level {
            self.log_level = Some(log_level.clone());
        }
    }

    /// Build the serving config for a benchmark from flags and config
    /// defaults.
    pub fn serving_config(&self, backend: Option<&str>, gpus: Option<u32>) -> Result<ServingConfig> {
        let mut serving = ServingConfig::default();
        if let Some(name) = backend.or(self.serving_backend.as_deref()) {
            serving.backend = name.parse::<ServingBackend>()?;
        }
        if let Some(gpus) = gpus.or(self.gpus) {
            serving.gpus = gpus;
        }
        serving.validate()?;
        Ok(serving)
    }
}

/// Load and merge CLI configuration.
pub fn load_config() -> KilnCliConfig {
    KilnCliConfig::discover_and_load()
}

/// Resolve an executable path from a flag or a config file entry.
pub fn resolve_exec(
    flag: Option<PathBuf>,
    configured: Option<&Path>,
    flag_name: &str,
    config_key: &str,
) -> Result<PathBuf> {
    flag.or_else(|| configured.map(Path::to_path_buf)).ok_or_else(|| {
        anyhow::anyhow!(
            "no {config_key} configured; pass {flag_name} or set {config_key} in {}",
            KilnCliConfig::default_global_path().display()
        )
    })
}
