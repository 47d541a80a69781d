//! AdamW optimizer (Adam with decoupled Weight decay)

use super::adam::{AdamArgs, Moments};
use super::optimizer::{Optimizer, ParamGroup};

/// AdamW optimizer
///
/// AdamW decouples weight decay from the gradient-based update. Instead of
/// adding weight decay to the gradient, it applies weight decay directly to
/// the parameters.
///
/// Standard Adam with L2: θ_t = θ_{t-1} - lr * (m_t / (√v_t + ε) + λ * θ_{t-1})
/// AdamW: θ_t = (1 - lr * λ) * θ_{t-1} - lr * m_t / (√v_t + ε)
#[derive(Debug, Clone)]
pub struct AdamW {
    inner: Moments,
}

impl AdamW {
    /// Create a new AdamW optimizer with a single implicit group
    pub fn new(lr: f32, beta1: f32, beta2: f32, epsilon: f32, weight_decay: f32) -> Self {
        let args = AdamArgs { lr, betas: (beta1, beta2), eps: epsilon, weight_decay };
        Self::for_groups(&[], args)
    }

    /// Create AdamW with default parameters (weight_decay = 0.01)
    pub fn default_params(lr: f32) -> Self {
        Self::new(lr, 0.9, 0.999, 1e-8, 0.01)
    }

    /// Create an AdamW optimizer for `groups`, honoring their overrides
    pub fn for_groups(groups: &[ParamGroup], args: AdamArgs) -> Self {
        Self { inner: Moments::new(groups, &args, true) }
    }

    pub fn step_count(&self) -> u64 {
        self.inner.step_count()
    }

    pub fn weight_decay(&self) -> f32 {
        self.inner.weight_decay
    }
}

impl Optimizer for AdamW {
    fn step(&mut self, groups: &mut [ParamGroup]) {
        self.inner.step(groups);
    }

    fn lr(&self) -> f32 {
        self.inner.lr
    }

    fn set_lr(&mut self, lr: f32) {
        self.inner.lr = lr;
    }

    fn group_lrs(&self) -> Vec<f32> {
        self.inner.group_lrs()
    }

    fn name(&self) -> &'static str {
        "AdamW"
    }
}
