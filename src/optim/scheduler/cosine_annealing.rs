//! Cosine annealing learning rate scheduler

use serde::Deserialize;
use std::f32::consts::PI;

use super::LRScheduler;

/// Keyword arguments of [`CosineAnnealingLR`]
#[derive(Debug, Clone, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct CosineAnnealingArgs {
    pub max_steps: usize,
    #[serde(default)]
    pub eta_min: f32,
}

/// Half-cosine decay from the optimizer's rate down to `eta_min`
///
/// `lr_t = eta_min + (lr_0 - eta_min) * (1 + cos(pi * t / max_steps)) / 2`,
/// held at `eta_min` once `max_steps` is reached.
#[derive(Debug, Clone)]
pub struct CosineAnnealingLR {
    lr_max: f32,
    lr_min: f32,
    t_max: usize,
    current_step: usize,
}

impl CosineAnnealingLR {
    pub fn new(lr_max: f32, t_max: usize, lr_min: f32) -> Self {
        Self { lr_max, lr_min, t_max, current_step: 0 }
    }

    pub fn from_args(base_lr: f32, args: CosineAnnealingArgs) -> Self {
        Self::new(base_lr, args.max_steps, args.eta_min)
    }
}

impl LRScheduler for CosineAnnealingLR {
    fn get_lr(&self) -> f32 {
        if self.current_step >= self.t_max {
            return self.lr_min;
        }

        let t = self.current_step as f32 / self.t_max as f32;
        self.lr_min + 0.5 * (self.lr_max - self.lr_min) * (1.0 + (PI * t).cos())
    }

    fn step(&mut self) {
        self.current_step += 1;
    }

    fn name(&self) -> &'static str {
        "CosineAnnealingLR"
    }
}
