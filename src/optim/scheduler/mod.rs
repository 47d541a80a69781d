//! Learning rate schedulers
//!
//! Provides learning rate scheduling strategies for training:
//! - `CosineAnnealingLR` - Smooth cosine decay over `max_steps`
//! - `LinearWarmupLR` - Linear warmup from 0 to target
//! - `StepLR` - Step decay by factor every N steps
//! - `WarmupCosineLR` - Combined warmup + cosine decay over `max_iters`
//! - `OneCycleLR` - Warmup to `max_lr` then anneal, over `epochs * steps_per_epoch`

mod cosine_annealing;
mod linear_warmup;
mod one_cycle;
mod step_decay;
mod warmup_cosine_decay;


pub use cosine_annealing::{CosineAnnealingArgs, CosineAnnealingLR};
pub use linear_warmup::{LinearWarmupArgs, LinearWarmupLR};
pub use one_cycle::{OneCycleArgs, OneCycleLR};
pub use step_decay::{StepArgs, StepLR};
pub use warmup_cosine_decay::{WarmupCosineArgs, WarmupCosineLR};

use crate::optim::Optimizer;

/// Learning rate scheduler trait
pub trait LRScheduler {
    /// Get the current learning rate
    fn get_lr(&self) -> f32;

    /// Step the scheduler (called once per `interval`)
    fn step(&mut self);

    /// Name of the scheduler
    fn name(&self) -> &str;

    /// Apply the current learning rate to an optimizer
    fn apply(&self, optimizer: &mut dyn Optimizer) {
        optimizer.set_lr(self.get_lr());
    }
}
