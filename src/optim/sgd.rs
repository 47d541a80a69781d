//! Stochastic Gradient Descent optimizer

use serde::Deserialize;

use super::optimizer::{slot, GroupSettings, Optimizer, ParamGroup, SlotState};

/// Keyword arguments accepted by [`SGD`] in an optimizer config
#[derive(Debug, Clone, Deserialize)]
#[serde(deny_unknown_fields, default)]
pub struct SgdArgs {
    pub lr: f32,
    pub momentum: f32,
    pub weight_decay: f32,
}

impl Default for SgdArgs {
    fn default() -> Self {
        Self { lr: 0.01, momentum: 0.0, weight_decay: 0.0 }
    }
}

/// SGD optimizer with optional momentum and L2 weight decay
///
/// g = grad + weight_decay * param
/// v = momentum * v - lr * g
/// param = param + v
#[derive(Debug, Clone)]
pub struct SGD {
    lr: f32,
    momentum: f32,
    weight_decay: f32,
    groups: Vec<GroupSettings>,
    velocities: SlotState,
}

impl SGD {
    /// Create a new SGD optimizer
    pub fn new(lr: f32, momentum: f32) -> Self {
        Self { lr, momentum, weight_decay: 0.0, groups: Vec::new(), velocities: Vec::new() }
    }

    /// Create an SGD optimizer for `groups`, honoring their overrides
    pub fn for_groups(groups: &[ParamGroup], args: SgdArgs) -> Self {
        Self {
            lr: args.lr,
            momentum: args.momentum,
            weight_decay: args.weight_decay,
            groups: GroupSettings::resolve(groups, args.lr, args.weight_decay),
            velocities: Vec::new(),
        }
    }

    fn settings(&self, g: usize) -> GroupSettings {
        self.groups
            .get(g)
            .copied()
            .unwrap_or(GroupSettings { lr_scale: 1.0, weight_decay: self.weight_decay })
    }
}

impl Optimizer for SGD {
    fn step(&mut self, groups: &mut [ParamGroup]) {
        for (g, group) in groups.iter_mut().enumerate() {
            let settings = self.settings(g);
            let lr = self.lr * settings.lr_scale;

            for (p, param) in group.params.iter_mut().enumerate() {
                let Some(mut grad) = param.trainable_grad() else {
                    continue;
                };
                if settings.weight_decay != 0.0 {
                    grad.scaled_add(settings.weight_decay, param.data());
                }

                if self.momentum > 0.0 {
                    let velocity = slot(&mut self.velocities, g, p, grad.len());
                    *velocity *= self.momentum;
                    velocity.scaled_add(-lr, &grad);
                    *param.data_mut() += &*velocity;
                } else {
                    param.data_mut().scaled_add(-lr, &grad);
                }
            }
        }
    }

    fn lr(&self) -> f32 {
        self.lr
    }

    fn set_lr(&mut self, lr: f32) {
        self.lr = lr;
    }

    fn group_lrs(&self) -> Vec<f32> {
        if self.groups.is_empty() {
            return vec![self.lr];
        }
        self.groups.iter().map(|s| self.lr * s.lr_scale).collect()
    }

    fn name(&self) -> &'static str {
        "SGD"
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
    fn test_plain_step() {
        let mut groups = single(&[1.0, 2.0], &[0.5, 1.0]);
        let mut opt = SGD::new(0.1, 0.0);
        opt.step(&mut groups);
        let w = groups[0].params[0].data();
        assert_relative_eq!(w[0], 0.95, epsilon = 1e-6);
        assert_relative_eq!(w[1], 1.9, epsilon = 1e-6);
    }

    #[test]
    fn test_momentum_accumulates() {
        let mut groups = single(&[0.0], &[1.0]);
        let mut opt = SGD::new(0.1, 0.9);
        opt.step(&mut groups);
        assert_relative_eq!(groups[0].params[0].data()[0], -0.1, epsilon = 1e-6);
        opt.step(&mut groups);
        // v = 0.9 * -0.1 - 0.1 = -0.19
        assert_relative_eq!(groups[0].params[0].data()[0], -0.29, epsilon = 1e-6);
    }

    #[test]
    fn test_group_lr_override() {
        let mut fast = Parameter::new("fast", arr1(&[1.0]));
        fast.set_grad(arr1(&[1.0]));
        let mut slow = Parameter::new("slow", arr1(&[1.0]));
        slow.set_grad(arr1(&[1.0]));
        let mut groups = vec![
            ParamGroup::new("head", vec![fast]),
            ParamGroup::new("backbone", vec![slow]).with_lr(0.01),
        ];

        let mut opt = SGD::for_groups(&groups, SgdArgs { lr: 0.1, ..SgdArgs::default() });
        opt.step(&mut groups);
        assert_relative_eq!(groups[0].params[0].data()[0], 0.9, epsilon = 1e-6);
        assert_relative_eq!(groups[1].params[0].data()[0], 0.99, epsilon = 1e-6);

        opt.set_lr(0.2);
        let lrs = opt.group_lrs();
        assert_relative_eq!(lrs[0], 0.2, epsilon = 1e-6);
        assert_relative_eq!(lrs[1], 0.02, epsilon = 1e-6);
    }

    #[test]
    fn test_weight_decay() {
        let mut groups = single(&[2.0], &[0.0]);
        let mut opt = SGD::for_groups(
            &groups,
            SgdArgs { lr: 0.1, momentum: 0.0, weight_decay: 0.5 },
        );
        opt.step(&mut groups);
        // g = 0 + 0.5 * 2 = 1
        assert_relative_eq!(groups[0].params[0].data()[0], 1.9, epsilon = 1e-6);
    }
}
