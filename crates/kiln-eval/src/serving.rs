use crate::error::{ScorerError, ScorerResult};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// Inference server used to host a checkpoint while it is benchmarked.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum ServingBackend {
    LlamaCpp,
    Vllm,
}

impl FromStr for ServingBackend {
    type Err = ScorerError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "llama-cpp" | "llama.cpp" => Ok(Self::LlamaCpp),
            "vllm" => Ok(Self::Vllm),
            other => Err(ScorerError::InvalidConfig(format!(
                "unsupported serving backend: {other} (expected llama-cpp or vllm)"
            ))),
        }
    }
}

impl fmt::Display for ServingBackend {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::LlamaCpp => f.write_str("llama-cpp"),
            Self::Vllm => f.write_str("vllm"),
        }
    }
}

/// Serving settings handed to the benchmark program. Opaque beyond this
/// boundary; the scorer owns the serving lifecycle.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct ServingConfig {
    pub backend: ServingBackend,
    /// GPUs the serving process may use.
    pub gpus: u32,
}

impl Default for ServingConfig {
    fn default() -> Self {
        Self { backend: ServingBackend::Vllm, gpus: 1 }
    }
}

impl ServingConfig {
    pub fn validate(&self) -> ScorerResult<()> {
        if self.gpus == 0 {
            return Err(ScorerError::InvalidConfig("gpus must be >= 1".to_string()));
        }
        Ok(())
    }
}
