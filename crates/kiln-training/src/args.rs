use crate::error::{TrainingError, TrainingResult};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fmt;
use std::path::PathBuf;
use std::str::FromStr;

/// Arguments handed to the training backend for one phase.
///
/// `Clone` is a deep copy; the orchestrator clones the base args per phase
/// and substitutes the data path and checkpoint directory without touching
/// the caller's copy.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TrainingArgs {
    pub model_path: PathBuf,
    pub data_path: PathBuf,
    pub ckpt_output_dir: PathBuf,
    pub num_epochs: u32,
    pub effective_batch_size: u32,
    /// Save a checkpoint every this many samples.
    pub save_samples: u32,
    pub max_seq_len: u32,
    pub learning_rate: f64,
    pub distributed_backend: DistributedBackend,
    /// Backend-specific settings forwarded untouched.
    #[serde(default)]
    pub extra: BTreeMap<String, serde_json::Value>,
}

impl TrainingArgs {
    #[must_use]
    pub fn new(model_path: PathBuf, data_path: PathBuf, ckpt_output_dir: PathBuf) -> Self {
        Self {
            model_path,
            data_path,
            ckpt_output_dir,
            num_epochs: 10,
            effective_batch_size: 3840,
            save_samples: 250_000,
            max_seq_len: 4096,
            learning_rate: 2e-5,
            distributed_backend: DistributedBackend::Fsdp,
            extra: BTreeMap::new(),
        }
    }

    pub fn validate(&self) -> TrainingResult<()> {
        if self.model_path.as_os_str().is_empty() {
            return Err(TrainingError::InvalidArgs("model_path is required".to_string()));
        }
        if self.data_path.as_os_str().is_empty() {
            return Err(TrainingError::InvalidArgs("data_path is required".to_string()));
        }
        if self.ckpt_output_dir.as_os_str().is_empty() {
            return Err(TrainingError::InvalidArgs("ckpt_output_dir is required".to_string()));
        }
        if self.num_epochs == 0 {
            return Err(TrainingError::InvalidArgs("num_epochs must be >= 1".to_string()));
        }
        if self.effective_batch_size == 0 {
            return Err(TrainingError::InvalidArgs("effective_batch_size must be >= 1".to_string()));
        }
        if self.save_samples == 0 {
            return Err(TrainingError::InvalidArgs("save_samples must be >= 1".to_string()));
        }
        if self.max_seq_len == 0 {
            return Err(TrainingError::InvalidArgs("max_seq_len must be >= 1".to_string()));
        }
        if !self.learning_rate.is_finite() || self.learning_rate <= 0.0 {
            return Err(TrainingError::InvalidArgs("learning_rate must be > 0".to_string()));
        }
        Ok(())
    }
}

/// Per-phase adjustments applied on top of the base args. `None` leaves the
/// base value untouched.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct PhaseOverrides {
    pub num_epochs: Option<u32>,
    pub save_samples: Option<u32>,
    pub effective_batch_size: Option<u32>,
}

impl PhaseOverrides {
    pub fn apply(&self, args: &mut TrainingArgs) {
        if let Some(epochs) = self.num_epochs {
            args.num_epochs = epochs;
        }
        if let Some(samples) = self.save_samples {
            args.save_samples = samples;
        }
        if let Some(batch) = self.effective_batch_size {
            args.effective_batch_size = batch;
        }
    }
}

/// Torchrun-style rendezvous settings for the training launcher.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DistributedArgs {
    pub nproc_per_node: u32,
    pub nnodes: u32,
    pub node_rank: u32,
    pub rdzv_id: u32,
    pub rdzv_endpoint: String,
}

impl Default for DistributedArgs {
    fn default() -> Self {
        Self {
            nproc_per_node: 1,
            nnodes: 1,
            node_rank: 0,
            rdzv_id: 123,
            rdzv_endpoint: "127.0.0.1:12222".to_string(),
        }
    }
}

/// Distributed training strategy understood by the backend.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum DistributedBackend {
    Fsdp,
    Deepspeed,
}

impl FromStr for DistributedBackend {
    type Err = TrainingError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "fsdp" => Ok(Self::Fsdp),
            "deepspeed" => Ok(Self::Deepspeed),
            other => Err(TrainingError::InvalidArgs(format!(
                "unsupported distributed backend: {other} (expected fsdp or deepspeed)"
            ))),
        }
    }
}

impl fmt::Display for DistributedBackend {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Fsdp => f.write_str("fsdp"),
            Self::Deepspeed => f.write_str("deepspeed"),
        }
    }
}
