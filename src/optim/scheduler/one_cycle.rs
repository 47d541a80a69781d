//! One-cycle learning rate scheduler (Smith & Topin, <https://arxiv.org/abs/1708.07120>)

use serde::Deserialize;
use std::f32::consts::PI;

use super::LRScheduler;
use crate::error::{Error, Result};

/// Keyword arguments of [`OneCycleLR`]
#[derive(Debug, Clone, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct OneCycleArgs {
    pub max_lr: f32,
    pub epochs: usize,
    pub steps_per_epoch: usize,
    #[serde(default = "default_pct_start")]
    pub pct_start: f32,
    #[serde(default = "default_div_factor")]
    pub div_factor: f32,
    #[serde(default = "default_final_div_factor")]
    pub final_div_factor: f32,
}

fn default_pct_start() -> f32 {
    0.3
}

fn default_div_factor() -> f32 {
    25.0
}

fn default_final_div_factor() -> f32 {
    1e4
}

/// Cosine interpolation from `start` (pct = 0) to `end` (pct = 1)
fn anneal(start: f32, end: f32, pct: f32) -> f32 {
    end + (start - end) / 2.0 * (1.0 + (PI * pct).cos())
}

/// One-Cycle Learning Rate Scheduler
///
/// Anneals from `max_lr / div_factor` up to `max_lr` over the first
/// `pct_start` of the schedule, then down to
/// `max_lr / (div_factor * final_div_factor)` at the last step. The schedule
/// spans `epochs * steps_per_epoch` steps.
#[derive(Debug, Clone)]
pub struct OneCycleLR {
    initial_lr: f32,
    max_lr: f32,
    min_lr: f32,
    total_steps: usize,
    pct_start: f32,
    current_step: usize,
}

impl OneCycleLR {
    pub fn new(
        max_lr: f32,
        total_steps: usize,
        pct_start: f32,
        div_factor: f32,
        final_div_factor: f32,
    ) -> Self {
        let initial_lr = max_lr / div_factor;
        Self {
            initial_lr,
            max_lr,
            min_lr: initial_lr / final_div_factor,
            total_steps,
            pct_start,
            current_step: 0,
        }
    }

    /// Fails when `epochs * steps_per_epoch` does not fit in a `usize`
    pub fn from_args(args: OneCycleArgs) -> Result<Self> {
        let total_steps = args.epochs.checked_mul(args.steps_per_epoch).ok_or_else(|| {
            Error::invalid_argument(
                "OneCycleLR",
                format!(
                    "epochs ({}) * steps_per_epoch ({}) overflows",
                    args.epochs, args.steps_per_epoch
                ),
            )
        })?;
        Ok(Self::new(
            args.max_lr,
            total_steps,
            args.pct_start,
            args.div_factor,
            args.final_div_factor,
        ))
    }

    pub fn total_steps(&self) -> usize {
        self.total_steps
    }
}

impl LRScheduler for OneCycleLR {
    fn get_lr(&self) -> f32 {
        let last = self.total_steps.saturating_sub(1) as f32;
        let step = (self.current_step as f32).min(last);
        let warm_end = self.pct_start * self.total_steps as f32 - 1.0;

        if warm_end > 0.0 && step <= warm_end {
            return anneal(self.initial_lr, self.max_lr, step / warm_end);
        }
        let span = last - warm_end.max(0.0);
        if span <= 0.0 {
            return self.min_lr;
        }
        anneal(self.max_lr, self.min_lr, (step - warm_end.max(0.0)) / span)
    }

    fn step(&mut self) {
        self.current_step += 1;
    }

    fn name(&self) -> &'static str {
        "OneCycleLR"
    }
}
