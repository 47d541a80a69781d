//! Sigmoid focal loss for binary and multi-label targets
//!
//! Each logit is an independent binary decision, so input and target share a
//! shape and reductions run over every element.

use ndarray::ArrayD;
use serde::Deserialize;

use super::args::LossArgs;
use super::reduction::Reduction;
use super::traits::{dense_targets, LossFn, LossValue, Target};
use crate::error::Result;

/// Numerically stable sigmoid
pub(crate) fn sigmoid(v: f32) -> f32 {
    if v >= 0.0 {
        1.0 / (1.0 + (-v).exp())
    } else {
        let e = v.exp();
        e / (1.0 + e)
    }
}

/// Numerically stable BCE with logits: max(x, 0) - x*t + log(1 + exp(-|x|))
pub(crate) fn stable_bce(logit: f32, target: f32) -> f32 {
    logit.max(0.0) - logit * target + (-logit.abs()).exp().ln_1p()
}

#[derive(Debug, Deserialize)]
#[serde(deny_unknown_fields, default)]
struct BinaryFocalArgs {
    alpha: f32,
    gamma: f32,
    reduction: String,
}

impl Default for BinaryFocalArgs {
    fn default() -> Self {
        Self { alpha: -1.0, gamma: 2.0, reduction: "mean".into() }
    }
}

/// Sigmoid focal loss
///
/// ```text
/// p   = sigmoid(x)
/// ce  = bce_with_logits(x, t)
/// p_t = p * t + (1 - p) * (1 - t)
/// L   = ce * (1 - p_t)^gamma
/// ```
///
/// A non-negative `alpha` additionally weights positives by `alpha` and
/// negatives by `1 - alpha`; the default `-1` disables that weighting.
#[derive(Debug, Clone)]
pub struct BinarySigmoidFocalLoss {
    alpha: f32,
    gamma: f32,
    reduction: Reduction,
}

impl Default for BinarySigmoidFocalLoss {
    fn default() -> Self {
        Self::new(-1.0, 2.0, Reduction::Mean)
    }
}

impl BinarySigmoidFocalLoss {
    pub fn new(alpha: f32, gamma: f32, reduction: Reduction) -> Self {
        Self { alpha, gamma, reduction }
    }

    pub(crate) fn from_args(args: LossArgs) -> Result<Box<dyn LossFn>> {
        args.reject_weight("BinarySigmoidFocalLoss")?;
        let parsed: BinaryFocalArgs = args.parse("BinarySigmoidFocalLoss")?;
        Ok(Box::new(Self::new(parsed.alpha, parsed.gamma, parsed.reduction.parse()?)))
    }
}

impl LossFn for BinarySigmoidFocalLoss {
    fn forward(&self, input: &ArrayD<f32>, target: &Target) -> Result<LossValue> {
        let t = dense_targets(input, target)?;

        let mut loss = input.clone();
        ndarray::Zip::from(&mut loss).and(input).and(t).for_each(|out, &x, &y| {
            let p = sigmoid(x);
            let p_t = p * y + (1.0 - p) * (1.0 - y);
            let mut value = stable_bce(x, y) * (1.0 - p_t).powf(self.gamma);
            if self.alpha >= 0.0 {
                value *= self.alpha * y + (1.0 - self.alpha) * (1.0 - y);
            }
            *out = value;
        });

        Ok(self.reduction.reduce(loss))
    }

    fn name(&self) -> &'static str {
        "BinarySigmoidFocalLoss"
    }
}
