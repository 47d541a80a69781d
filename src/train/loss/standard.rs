//! Standard losses, the fallback namespace of the loss builder
//!
//! A name that is not in a [`LossRegistry`](super::LossRegistry) is looked up
//! here before the builder gives up.

use ndarray::{Array1, ArrayD, Axis};
use serde::Deserialize;

use super::args::LossArgs;
use super::binary_focal::stable_bce;
use super::cross_entropy::{nll_loss, CrossEntropyLoss};
use super::reduction::Reduction;
use super::registry::LossFactory;
use super::traits::{as_matrix, class_targets, dense_targets, LossFn, LossValue, Target};
use crate::error::{Error, Result};

#[derive(Debug, Deserialize)]
#[serde(deny_unknown_fields, default)]
struct ReductionArgs {
    reduction: String,
}

impl Default for ReductionArgs {
    fn default() -> Self {
        Self { reduction: "mean".into() }
    }
}

fn parse_reduction(args: &LossArgs, target: &str) -> Result<Reduction> {
    args.parse::<ReductionArgs>(target)?.reduction.parse()
}

/// Resolve a standard loss factory by exact name
pub fn lookup(name: &str) -> Option<LossFactory> {
    let factory: LossFactory = match name {
        "CrossEntropyLoss" => CrossEntropyLoss::from_args,
        "NLLLoss" => NLLLoss::from_args,
        "BCEWithLogitsLoss" => BCEWithLogitsLoss::from_args,
        "MSELoss" => MSELoss::from_args,
        "L1Loss" => L1Loss::from_args,
        _ => return None,
    };
    Some(factory)
}

/// Names served by [`lookup`]
pub const STANDARD_LOSSES: [&str; 5] =
    ["BCEWithLogitsLoss", "CrossEntropyLoss", "L1Loss", "MSELoss", "NLLLoss"];

/// Negative log-likelihood over `(N, C)` log-probabilities
#[derive(Debug, Clone, Default)]
pub struct NLLLoss {
    weight: Option<Array1<f32>>,
    reduction: Reduction,
}

impl NLLLoss {
    pub fn new(weight: Option<Array1<f32>>, reduction: Reduction) -> Self {
        Self { weight, reduction }
    }

    fn from_args(mut args: LossArgs) -> Result<Box<dyn LossFn>> {
        let reduction = parse_reduction(&args, "NLLLoss")?;
        Ok(Box::new(Self::new(args.take_weight(), reduction)))
    }
}

impl LossFn for NLLLoss {
    fn forward(&self, input: &ArrayD<f32>, target: &Target) -> Result<LossValue> {
        let x = as_matrix(input)?;
        let t = class_targets(&x, target)?;
        nll_loss(&x, t, self.weight.as_ref(), self.reduction)
    }

    fn name(&self) -> &'static str {
        "NLLLoss"
    }

    fn weight(&self) -> Option<&Array1<f32>> {
        self.weight.as_ref()
    }
}

/// Binary cross entropy on logits, per element
///
/// An optional `weight` rescales the last dimension (one entry per class in
/// the multi-label case).
#[derive(Debug, Clone, Default)]
pub struct BCEWithLogitsLoss {
    weight: Option<Array1<f32>>,
    reduction: Reduction,
}

impl BCEWithLogitsLoss {
    pub fn new(weight: Option<Array1<f32>>, reduction: Reduction) -> Self {
        Self { weight, reduction }
    }

    fn from_args(mut args: LossArgs) -> Result<Box<dyn LossFn>> {
        let reduction = parse_reduction(&args, "BCEWithLogitsLoss")?;
        Ok(Box::new(Self::new(args.take_weight(), reduction)))
    }
}

impl LossFn for BCEWithLogitsLoss {
    fn forward(&self, input: &ArrayD<f32>, target: &Target) -> Result<LossValue> {
        let t = dense_targets(input, target)?;
        let mut loss = input.clone();
        ndarray::Zip::from(&mut loss)
            .and(input)
            .and(t)
            .for_each(|out, &x, &y| *out = stable_bce(x, y));

        if let Some(w) = &self.weight {
            let last = input.ndim().checked_sub(1).map(|axis| input.len_of(Axis(axis)));
            if last != Some(w.len()) {
                return Err(Error::ShapeMismatch(format!(
                    "weight has {} entries but the last input dimension is {:?}",
                    w.len(),
                    last
                )));
            }
            for mut lane in loss.lanes_mut(Axis(input.ndim() - 1)) {
                lane *= w;
            }
        }

        Ok(self.reduction.reduce(loss))
    }

    fn name(&self) -> &'static str {
        "BCEWithLogitsLoss"
    }

    fn weight(&self) -> Option<&Array1<f32>> {
        self.weight.as_ref()
    }
}

/// Mean squared error, per element
#[derive(Debug, Clone, Copy, Default)]
pub struct MSELoss {
    reduction: Reduction,
}

impl MSELoss {
    pub fn new(reduction: Reduction) -> Self {
        Self { reduction }
    }

    fn from_args(args: LossArgs) -> Result<Box<dyn LossFn>> {
        args.reject_weight("MSELoss")?;
        Ok(Box::new(Self::new(parse_reduction(&args, "MSELoss")?)))
    }
}

impl LossFn for MSELoss {
    fn forward(&self, input: &ArrayD<f32>, target: &Target) -> Result<LossValue> {
        let t = dense_targets(input, target)?;
        let diff = input - t;
        Ok(self.reduction.reduce(diff.mapv(|d| d * d)))
    }

    fn name(&self) -> &'static str {
        "MSELoss"
    }
}

/// Mean absolute error, per element
#[derive(Debug, Clone, Copy, Default)]
pub struct L1Loss {
    reduction: Reduction,
}

impl L1Loss {
    pub fn new(reduction: Reduction) -> Self {
        Self { reduction }
    }

    fn from_args(args: LossArgs) -> Result<Box<dyn LossFn>> {
        args.reject_weight("L1Loss")?;
        Ok(Box::new(Self::new(parse_reduction(&args, "L1Loss")?)))
    }
}

impl LossFn for L1Loss {
    fn forward(&self, input: &ArrayD<f32>, target: &Target) -> Result<LossValue> {
        let t = dense_targets(input, target)?;
        Ok(self.reduction.reduce((input - t).mapv(f32::abs)))
    }

    fn name(&self) -> &'static str {
        "L1Loss"
    }
}
