//! Validation error types
//!
//! Defines all validation error variants for task configurations.

/// Validation error type
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum ValidationError {
    #[error("Invalid learning rate: {0} (must be > 0.0)")]
    InvalidLearningRate(f32),

    #[error("Invalid number of splits: {0} (must be >= 2)")]
    InvalidSplits(usize),

    #[error("Invalid accumulate_grad_batches: {0} (must be > 0)")]
    InvalidAccumulation(usize),

    #[error("Invalid num_processes: {0} (must be > 0)")]
    InvalidProcesses(usize),

    #[error("Invalid tpu_cores: {0} (must be > 0 when set)")]
    InvalidTpuCores(usize),

    #[error("Invalid limit_train_batches: {0} (fraction must be in (0.0, 1.0])")]
    InvalidBatchFraction(f64),

    #[error("Invalid {field}: 0 (must be > 0 or \"infer\")")]
    ZeroStepCount { field: &'static str },

    #[error("Label and fold columns must differ: {0}")]
    ColumnClash(String),

    #[error("Loss name cannot be empty")]
    EmptyLossName,
}
