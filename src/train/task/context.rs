//! Quantities an external trainer supplies to a task

use crate::config::{BatchLimit, TrainerConfig};
use crate::error::{Error, Result};

/// Step budget resolved against a trainer
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct StepPlan {
    pub max_steps: usize,
    pub max_epochs: usize,
    pub steps_per_epoch: usize,
}

/// What the trainer knows about the run
#[derive(Debug, Clone, PartialEq)]
pub struct TrainerContext {
    pub max_epochs: Option<usize>,
    pub max_steps: Option<usize>,
    pub limit_train_batches: Option<BatchLimit>,
    pub accumulate_grad_batches: usize,
    pub num_gpus: usize,
    pub num_processes: usize,
    pub tpu_cores: Option<usize>,
    /// Batches in one pass over the training data loader
    pub num_training_batches: usize,
    /// Distributed rank of this process; only rank 0 logs
    pub global_rank: usize,
}

impl Default for TrainerContext {
    fn default() -> Self {
        Self::from_config(&TrainerConfig::default(), 0)
    }
}

impl TrainerContext {
    pub fn new(num_training_batches: usize) -> Self {
        Self { num_training_batches, ..Self::default() }
    }

    pub fn from_config(config: &TrainerConfig, num_training_batches: usize) -> Self {
        Self {
            max_epochs: config.max_epochs,
            max_steps: config.max_steps,
            limit_train_batches: config.limit_train_batches,
            accumulate_grad_batches: config.accumulate_grad_batches,
            num_gpus: config.num_gpus,
            num_processes: config.num_processes,
            tpu_cores: config.tpu_cores,
            num_training_batches,
            global_rank: 0,
        }
    }

    pub fn with_max_epochs(mut self, max_epochs: usize) -> Self {
        self.max_epochs = Some(max_epochs);
        self
    }

    pub fn with_max_steps(mut self, max_steps: usize) -> Self {
        self.max_steps = Some(max_steps);
        self
    }

    pub fn with_limit_train_batches(mut self, limit: BatchLimit) -> Self {
        self.limit_train_batches = Some(limit);
        self
    }

    pub fn with_accumulate_grad_batches(mut self, accumulate: usize) -> Self {
        self.accumulate_grad_batches = accumulate;
        self
    }

    pub fn with_num_gpus(mut self, num_gpus: usize) -> Self {
        self.num_gpus = num_gpus;
        self
    }

    pub fn with_num_processes(mut self, num_processes: usize) -> Self {
        self.num_processes = num_processes;
        self
    }

    pub fn with_tpu_cores(mut self, tpu_cores: usize) -> Self {
        self.tpu_cores = Some(tpu_cores);
        self
    }

    pub fn with_global_rank(mut self, rank: usize) -> Self {
        self.global_rank = rank;
        self
    }

    /// Devices sharing each optimizer step
    pub fn num_devices(&self) -> usize {
        [self.num_gpus, self.num_processes, self.tpu_cores.unwrap_or(0)]
            .into_iter()
            .fold(1, usize::max)
    }

    /// Batches the trainer will actually draw per epoch
    ///
    /// A non-zero batch count cap wins; a fraction scales the loader length.
    pub fn dataset_size(&self) -> usize {
        match self.limit_train_batches {
            Some(BatchLimit::Count(limit)) if limit != 0 => limit,
            Some(BatchLimit::Fraction(fraction)) => {
                (self.num_training_batches as f64 * fraction).floor() as usize
            }
            _ => self.num_training_batches,
        }
    }

    /// Optimizer steps per epoch after accumulation and data parallelism
    pub fn steps_per_epoch(&self) -> Result<usize> {
        if self.accumulate_grad_batches == 0 {
            return Err(Error::config("accumulate_grad_batches must be at least 1"));
        }
        let effective_batch =
            self.accumulate_grad_batches.checked_mul(self.num_devices()).ok_or_else(|| {
                Error::config(format!(
                    "accumulate_grad_batches ({}) * devices ({}) overflows",
                    self.accumulate_grad_batches,
                    self.num_devices()
                ))
            })?;
        Ok(self.dataset_size() / effective_batch)
    }

    /// Total optimizer steps, epochs and steps per epoch for this run
    ///
    /// With a known epoch count the estimate is `steps_per_epoch * max_epochs`,
    /// lowered to the trainer's step cap when that is smaller.
    pub fn num_training_steps(&self) -> Result<StepPlan> {
        let step_cap = self.max_steps.filter(|&s| s > 0);
        if self.max_epochs.is_none() && step_cap.is_none() {
            return Err(Error::config(
                "Either one of max_epochs or max_steps must be provided in Trainer",
            ));
        }

        let steps_per_epoch = self.steps_per_epoch()?;
        if steps_per_epoch == 0 {
            return Err(Error::config(format!(
                "steps_per_epoch is 0: {} batches cannot fill one step of {} accumulated batches on {} devices",
                self.dataset_size(),
                self.accumulate_grad_batches,
                self.num_devices()
            )));
        }

        let max_steps = match self.max_epochs {
            Some(epochs) => {
                let estimate = steps_per_epoch.checked_mul(epochs).ok_or_else(|| {
                    Error::config(format!(
                        "steps_per_epoch ({steps_per_epoch}) * max_epochs ({epochs}) overflows"
                    ))
                })?;
                step_cap.map_or(estimate, |cap| cap.min(estimate))
            }
            None => step_cap.unwrap_or_default(),
        };
        let max_epochs = self.max_epochs.unwrap_or(max_steps / steps_per_epoch);

        Ok(StepPlan { max_steps, max_epochs, steps_per_epoch })
    }
}
