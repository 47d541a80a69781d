//! Adam optimizer

use ndarray::Array1;
use serde::Deserialize;

use super::optimizer::{slot, GroupSettings, Optimizer, ParamGroup, SlotState};

/// Keyword arguments accepted by [`Adam`] and [`AdamW`](super::AdamW)
#[derive(Debug, Clone, Deserialize)]
#[serde(deny_unknown_fields, default)]
pub struct AdamArgs {
    pub lr: f32,
    pub betas: (f32, f32),
    pub eps: f32,
    pub weight_decay: f32,
}

impl Default for AdamArgs {
    fn default() -> Self {
        Self { lr: 1e-3, betas: (0.9, 0.999), eps: 1e-8, weight_decay: 0.0 }
    }
}

/// Moment buffers and bias-corrected update shared by Adam and AdamW
#[derive(Debug, Clone)]
pub(crate) struct Moments {
    pub lr: f32,
    pub beta1: f32,
    pub beta2: f32,
    pub eps: f32,
    pub weight_decay: f32,
    pub decoupled: bool,
    pub groups: Vec<GroupSettings>,
    t: u64,
    m: SlotState,
    v: SlotState,
}

impl Moments {
    pub(crate) fn new(groups: &[ParamGroup], args: &AdamArgs, decoupled: bool) -> Self {
        Self {
            lr: args.lr,
            beta1: args.betas.0,
            beta2: args.betas.1,
            eps: args.eps,
            weight_decay: args.weight_decay,
            decoupled,
            groups: GroupSettings::resolve(groups, args.lr, args.weight_decay),
            t: 0,
            m: Vec::new(),
            v: Vec::new(),
        }
    }

    pub(crate) fn step_count(&self) -> u64 {
        self.t
    }

    fn settings(&self, g: usize) -> GroupSettings {
        self.groups
            .get(g)
            .copied()
            .unwrap_or(GroupSettings { lr_scale: 1.0, weight_decay: self.weight_decay })
    }

    pub(crate) fn group_lrs(&self) -> Vec<f32> {
        if self.groups.is_empty() {
            return vec![self.lr];
        }
        self.groups.iter().map(|s| self.lr * s.lr_scale).collect()
    }

    /// One Adam step
    ///
    /// Coupled (Adam): g = grad + wd * param, then the adaptive update.
    /// Decoupled (AdamW): param = (1 - lr * wd) * param - adaptive update.
    pub(crate) fn step(&mut self, groups: &mut [ParamGroup]) {
        self.t += 1;
        let t = self.t as i32;
        let correction = (1.0 - self.beta2.powi(t)).sqrt() / (1.0 - self.beta1.powi(t));

        for (g, group) in groups.iter_mut().enumerate() {
            let settings = self.settings(g);
            let lr = self.lr * settings.lr_scale;
            let lr_t = lr * correction;

            for (p, param) in group.params.iter_mut().enumerate() {
                let Some(mut grad) = param.trainable_grad() else {
                    continue;
                };
                if !self.decoupled && settings.weight_decay != 0.0 {
                    grad.scaled_add(settings.weight_decay, param.data());
                }

                let m = slot(&mut self.m, g, p, grad.len());
                *m *= self.beta1;
                m.scaled_add(1.0 - self.beta1, &grad);
                let m_t = m.clone();

                let v = slot(&mut self.v, g, p, grad.len());
                *v *= self.beta2;
                v.scaled_add(1.0 - self.beta2, &(&grad * &grad));
                let denom: Array1<f32> = v.mapv(f32::sqrt) + self.eps;

                let update = &m_t / &denom * lr_t;
                if self.decoupled && settings.weight_decay != 0.0 {
                    *param.data_mut() *= 1.0 - lr * settings.weight_decay;
                }
                *param.data_mut() -= &update;
            }
        }
    }
}

/// Adam optimizer with L2 weight decay folded into the gradient
#[derive(Debug, Clone)]
pub struct Adam {
    inner: Moments,
}

impl Adam {
    /// Create a new Adam optimizer with a single implicit group
    pub fn new(lr: f32, beta1: f32, beta2: f32, epsilon: f32) -> Self {
        let args = AdamArgs { lr, betas: (beta1, beta2), eps: epsilon, weight_decay: 0.0 };
        Self::for_groups(&[], args)
    }

    /// Create an Adam optimizer for `groups`, honoring their overrides
    pub fn for_groups(groups: &[ParamGroup], args: AdamArgs) -> Self {
        Self { inner: Moments::new(groups, &args, false) }
    }

    /// Number of steps taken so far
    pub fn step_count(&self) -> u64 {
        self.inner.step_count()
    }
}

impl Optimizer for Adam {
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
        "Adam"
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::optim::Parameter;
    use approx::assert_relative_eq;
    use ndarray::arr1;

    fn single(data: &[f32], grad: &[f32]) -> Vec<ParamGroup> {
        let mut p = Parameter::new("w", arr1(data));
        p.set_grad(arr1(grad));
        vec![ParamGroup::new("all", vec![p])]
    }

    #[test]
    fn test_first_step_moves_by_lr() {
        // after bias correction the first update is lr * sign(grad)
        let mut groups = single(&[1.0, 1.0], &[0.3, -4.0]);
        let mut opt = Adam::new(0.01, 0.9, 0.999, 1e-8);
        opt.step(&mut groups);
        let w = groups[0].params[0].data();
        assert_relative_eq!(w[0], 0.99, epsilon = 1e-5);
        assert_relative_eq!(w[1], 1.01, epsilon = 1e-5);
        assert_eq!(opt.step_count(), 1);
    }

    #[test]
    fn test_minimizes_quadratic() {
        let mut groups = vec![ParamGroup::new("all", vec![Parameter::new("x", arr1(&[5.0]))])];
        let mut opt = Adam::new(0.1, 0.9, 0.999, 1e-8);
        for _ in 0..1000 {
            let x = groups[0].params[0].data()[0];
            groups[0].params[0].set_grad(arr1(&[2.0 * x]));
            opt.step(&mut groups);
        }
        assert!(groups[0].params[0].data()[0].abs() < 0.5);
    }

    #[test]
    fn test_weight_decay_coupled() {
        let mut groups = single(&[1.0], &[0.0]);
        let args = AdamArgs { lr: 0.1, weight_decay: 0.1, ..AdamArgs::default() };
        let mut opt = Adam::for_groups(&groups, args);
        opt.step(&mut groups);
        // decay enters the gradient, so the first step is a full lr-sized move
        assert_relative_eq!(groups[0].params[0].data()[0], 0.9, epsilon = 1e-4);
    }

    #[test]
    fn test_args_deserialize() {
        let args: AdamArgs = serde_json::from_value(serde_json::json!({
            "lr": 0.01, "betas": [0.8, 0.99]
        }))
        .unwrap();
        assert_eq!(args.betas, (0.8, 0.99));
        assert_eq!(args.eps, 1e-8);
        assert!(serde_json::from_value::<AdamArgs>(serde_json::json!({"momentum": 0.9})).is_err());
    }
}
