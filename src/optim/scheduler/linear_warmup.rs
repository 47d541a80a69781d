//! Linear warmup learning rate scheduler

use serde::Deserialize;

use super::LRScheduler;

/// Keyword arguments of [`LinearWarmupLR`]
#[derive(Debug, Clone, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct LinearWarmupArgs {
    pub warmup_steps: usize,
}

/// Linear Warmup Learning Rate Scheduler
///
/// Linearly increases learning rate from 0 to target over warmup_steps.
/// After warmup, maintains target learning rate.
///
/// Formula: lr_t = lr_target * min(1, t / warmup_steps)
#[derive(Debug, Clone)]
pub struct LinearWarmupLR {
    lr_target: f32,
    warmup_steps: usize,
    current_step: usize,
}

impl LinearWarmupLR {
    pub fn new(lr_target: f32, warmup_steps: usize) -> Self {
        Self { lr_target, warmup_steps, current_step: 0 }
    }

    pub fn from_args(base_lr: f32, args: LinearWarmupArgs) -> Self {
        Self::new(base_lr, args.warmup_steps)
    }
}

impl LRScheduler for LinearWarmupLR {
    fn get_lr(&self) -> f32 {
        if self.warmup_steps == 0 {
            return self.lr_target;
        }

        let progress = (self.current_step as f32 / self.warmup_steps as f32).min(1.0);
        self.lr_target * progress
    }

    fn step(&mut self) {
        self.current_step += 1;
    }

    fn name(&self) -> &'static str {
        "LinearWarmupLR"
    }
}
