//! Configuration validation logic
//!
//! Validates task configurations before any optimization config is resolved.

use super::error::ValidationError;
use crate::config::schema::{BatchLimit, DataConfig, OptimizationConfig, TaskConfig, TrainerConfig};

/// Validate a task configuration
///
/// Checks:
/// - Learning rate is positive
/// - Explicit step counts are non-zero
/// - Trainer accumulation factor, device counts and batch caps are in range
/// - Fold settings are usable
pub fn validate_config(config: &TaskConfig) -> Result<(), ValidationError> {
    if config.model.lr <= 0.0 || !config.model.lr.is_finite() {
        return Err(ValidationError::InvalidLearningRate(config.model.lr));
    }

    if let Some(loss) = &config.loss {
        if loss.name.trim().is_empty() {
            return Err(ValidationError::EmptyLossName);
        }
    }

    if let Some(optimization) = &config.optimization {
        validate_optimization(optimization)?;
    }

    if let Some(trainer) = &config.trainer {
        validate_trainer(trainer)?;
    }

    if let Some(data) = &config.data {
        validate_data(data)?;
    }

    Ok(())
}

fn validate_optimization(optimization: &OptimizationConfig) -> Result<(), ValidationError> {
    let fields = [
        ("max_steps", optimization.max_steps),
        ("max_epochs", optimization.max_epochs),
        ("steps_per_epoch", optimization.steps_per_epoch),
    ];
    for (field, value) in fields {
        if value.value() == Some(0) {
            return Err(ValidationError::ZeroStepCount { field });
        }
    }
    Ok(())
}

/// Validate the trainer section on its own
pub fn validate_trainer(trainer: &TrainerConfig) -> Result<(), ValidationError> {
    if trainer.accumulate_grad_batches == 0 {
        return Err(ValidationError::InvalidAccumulation(0));
    }
    if trainer.num_processes == 0 {
        return Err(ValidationError::InvalidProcesses(0));
    }
    if trainer.tpu_cores == Some(0) {
        return Err(ValidationError::InvalidTpuCores(0));
    }
    if let Some(BatchLimit::Fraction(fraction)) = trainer.limit_train_batches {
        if !(fraction > 0.0 && fraction <= 1.0) {
            return Err(ValidationError::InvalidBatchFraction(fraction));
        }
    }
    Ok(())
}

/// Validate the data section on its own
pub fn validate_data(data: &DataConfig) -> Result<(), ValidationError> {
    if data.n_splits < 2 {
        return Err(ValidationError::InvalidSplits(data.n_splits));
    }
    if data.label_column == data.fold_column {
        return Err(ValidationError::ColumnClash(data.fold_column.clone()));
    }
    Ok(())
}
