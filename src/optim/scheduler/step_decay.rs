//! Step decay learning rate scheduler

use serde::Deserialize;

use super::LRScheduler;

/// Keyword arguments of [`StepLR`]
#[derive(Debug, Clone, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct StepArgs {
    pub step_size: usize,
    #[serde(default = "default_gamma")]
    pub gamma: f32,
}

fn default_gamma() -> f32 {
    0.1
}

/// Step Decay Learning Rate Scheduler
///
/// Multiplies learning rate by gamma every step_size steps.
///
/// Formula: lr_t = lr_initial * gamma^(floor(t / step_size))
#[derive(Debug, Clone)]
pub struct StepLR {
    lr_initial: f32,
    gamma: f32,
    step_size: usize,
    current_step: usize,
}

impl StepLR {
    /// # Arguments
    /// * `lr_initial` - Initial learning rate
    /// * `step_size` - Decay LR every step_size steps
    /// * `gamma` - Multiplicative factor (e.g., 0.1 for 10x reduction)
    pub fn new(lr_initial: f32, step_size: usize, gamma: f32) -> Self {
        Self { lr_initial, gamma, step_size, current_step: 0 }
    }

    pub fn from_args(base_lr: f32, args: StepArgs) -> Self {
        Self::new(base_lr, args.step_size, args.gamma)
    }
}

impl LRScheduler for StepLR {
    fn get_lr(&self) -> f32 {
        if self.step_size == 0 {
            return self.lr_initial;
        }
        let num_decays = self.current_step / self.step_size;
        self.lr_initial * self.gamma.powi(num_decays as i32)
    }

    fn step(&mut self) {
        self.current_step += 1;
    }

    fn name(&self) -> &'static str {
        "StepLR"
    }
}
