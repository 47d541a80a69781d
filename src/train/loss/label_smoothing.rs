//! Cross entropy with label smoothing

use ndarray::{Array1, ArrayD};
use serde::Deserialize;

use super::args::LossArgs;
use super::cross_entropy::{log_softmax, neg_log_sum, nll_loss};
use super::reduction::Reduction;
use super::traits::{as_matrix, class_targets, LossFn, LossValue, Target};
use crate::error::Result;

#[derive(Debug, Deserialize)]
#[serde(deny_unknown_fields, default)]
struct LabelSmoothingArgs {
    eps: f32,
    reduction: String,
}

impl Default for LabelSmoothingArgs {
    fn default() -> Self {
        Self { eps: 0.1, reduction: "mean".into() }
    }
}

/// Cross Entropy Loss with Label Smoothing
///
/// Blends plain cross entropy with a uniform-label term:
///
/// L = eps / C * (-sum_c log_softmax(x)_c) + (1 - eps) * nll(log_softmax(x), target, weight)
///
/// Input `(N, C)` logits, target `(N)` class indices. With `reduction = none`
/// the result has shape `(N)`.
#[derive(Debug, Clone)]
pub struct LabelSmoothingCrossEntropy {
    eps: f32,
    reduction: Reduction,
    weight: Option<Array1<f32>>,
}

impl Default for LabelSmoothingCrossEntropy {
    fn default() -> Self {
        Self::new(0.1, Reduction::Mean, None)
    }
}

impl LabelSmoothingCrossEntropy {
    pub fn new(eps: f32, reduction: Reduction, weight: Option<Array1<f32>>) -> Self {
        Self { eps, reduction, weight }
    }

    pub fn eps(&self) -> f32 {
        self.eps
    }

    pub(crate) fn from_args(mut args: LossArgs) -> Result<Box<dyn LossFn>> {
        let parsed: LabelSmoothingArgs = args.parse("LabelSmoothingCrossEntropy")?;
        Ok(Box::new(Self::new(parsed.eps, parsed.reduction.parse()?, args.take_weight())))
    }
}

impl LossFn for LabelSmoothingCrossEntropy {
    fn forward(&self, input: &ArrayD<f32>, target: &Target) -> Result<LossValue> {
        let x = as_matrix(input)?;
        let t = class_targets(&x, target)?;
        let c = x.ncols() as f32;
        let log_pred = log_softmax(&x);

        let smooth = match self.reduction {
            Reduction::Sum => LossValue::Scalar(-log_pred.sum()),
            Reduction::Mean => LossValue::Scalar(neg_log_sum(&log_pred).mean().unwrap_or(f32::NAN)),
            Reduction::None => LossValue::Unreduced(neg_log_sum(&log_pred).into_dyn()),
        };
        let nll = nll_loss(&log_pred.view(), t, self.weight.as_ref(), self.reduction)?;

        smooth.blend(self.eps / c, nll, 1.0 - self.eps)
    }

    fn name(&self) -> &'static str {
        "LabelSmoothingCrossEntropy"
    }

    fn weight(&self) -> Option<&Array1<f32>> {
        self.weight.as_ref()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::train::loss::CrossEntropyLoss;
    use approx::assert_relative_eq;
    use ndarray::array;
    use proptest::prelude::*;

    fn logits() -> ArrayD<f32> {
        array![[2.0f32, 1.0, 0.1], [0.5, 2.5, -1.0], [0.0, 0.0, 3.0]].into_dyn()
    }

    #[test]
    fn test_matches_hand_computation() {
        let x = array![[1.0f32, 0.0]].into_dyn();
        let loss = LabelSmoothingCrossEntropy::new(0.2, Reduction::Mean, None)
            .forward(&x, &Target::classes(vec![0]))
            .unwrap()
            .scalar()
            .unwrap();

        let lse = (1.0f32.exp() + 1.0).ln();
        let lp0 = 1.0 - lse;
        let lp1 = -lse;
        let expected = 0.2 / 2.0 * -(lp0 + lp1) + 0.8 * -lp0;
        assert_relative_eq!(loss, expected, epsilon = 1e-6);
    }

    #[test]
    fn test_reduction_none_shape() {
        let loss = LabelSmoothingCrossEntropy::new(0.1, Reduction::None, None)
            .forward(&logits(), &Target::classes(vec![0, 1, 2]))
            .unwrap();
        assert_eq!(loss.unreduced().unwrap().shape(), &[3]);
    }

    #[test]
    fn test_sum_is_n_times_mean_without_weight() {
        let target = Target::classes(vec![0, 1, 2]);
        let mean = LabelSmoothingCrossEntropy::new(0.3, Reduction::Mean, None)
            .forward(&logits(), &target)
            .unwrap()
            .scalar()
            .unwrap();
        let sum = LabelSmoothingCrossEntropy::new(0.3, Reduction::Sum, None)
            .forward(&logits(), &target)
            .unwrap()
            .scalar()
            .unwrap();
        assert_relative_eq!(sum, 3.0 * mean, epsilon = 1e-5);
    }

    #[test]
    fn test_keeps_weight() {
        let loss = LabelSmoothingCrossEntropy::new(0.1, Reduction::Mean, Some(array![1.0, 2.0, 3.0]));
        assert_eq!(loss.weight().unwrap().to_vec(), vec![1.0, 2.0, 3.0]);
        assert!(loss.forward(&logits(), &Target::classes(vec![2, 1, 0])).is_ok());
    }

    proptest! {
        #![proptest_config(ProptestConfig::with_cases(100))]

        #[test]
        fn prop_zero_eps_is_cross_entropy(
            values in proptest::collection::vec(-20.0f32..20.0, 12),
            targets in proptest::collection::vec(0usize..4, 3),
        ) {
            let x = ArrayD::from_shape_vec(vec![3, 4], values).unwrap();
            let target = Target::classes(targets);
            for reduction in [Reduction::Mean, Reduction::Sum] {
                let smoothed = LabelSmoothingCrossEntropy::new(0.0, reduction, None)
                    .forward(&x, &target)
                    .unwrap()
                    .scalar()
                    .unwrap();
                let ce = CrossEntropyLoss::new(None, reduction)
                    .forward(&x, &target)
                    .unwrap()
                    .scalar()
                    .unwrap();
                prop_assert!((smoothed - ce).abs() <= 1e-4 * (1.0 + ce.abs()));
            }
        }
    }
}
