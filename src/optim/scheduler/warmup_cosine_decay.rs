//! Warmup + cosine decay learning rate scheduler

use serde::Deserialize;
use std::f32::consts::PI;

use super::LRScheduler;

/// Keyword arguments of [`WarmupCosineLR`]
#[derive(Debug, Clone, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct WarmupCosineArgs {
    pub max_iters: usize,
    #[serde(default)]
    pub warmup_iters: usize,
    #[serde(default)]
    pub eta_min: f32,
}

/// Linear ramp from 0 over `warmup_iters`, then cosine decay to `eta_min` at
/// `max_iters`
#[derive(Debug, Clone)]
pub struct WarmupCosineLR {
    lr_max: f32,
    lr_min: f32,
    warmup_steps: usize,
    total_steps: usize,
    current_step: usize,
}

impl WarmupCosineLR {
    /// `total_steps` counts the warmup steps too
    pub fn new(lr_max: f32, lr_min: f32, warmup_steps: usize, total_steps: usize) -> Self {
        Self { lr_max, lr_min, warmup_steps, total_steps, current_step: 0 }
    }

    pub fn from_args(base_lr: f32, args: WarmupCosineArgs) -> Self {
        Self::new(base_lr, args.eta_min, args.warmup_iters, args.max_iters)
    }
}

impl LRScheduler for WarmupCosineLR {
    fn get_lr(&self) -> f32 {
        if self.current_step < self.warmup_steps {
            return self.lr_max * self.current_step as f32 / self.warmup_steps as f32;
        }

        let decay_steps = self.total_steps.saturating_sub(self.warmup_steps);
        let decay_step = self.current_step - self.warmup_steps;
        if decay_steps == 0 || decay_step >= decay_steps {
            return self.lr_min;
        }

        let t = decay_step as f32 / decay_steps as f32;
        self.lr_min + 0.5 * (self.lr_max - self.lr_min) * (1.0 + (PI * t).cos())
    }

    fn step(&mut self) {
        self.current_step += 1;
    }

    fn name(&self) -> &'static str {
        "WarmupCosineLR"
    }
}
