//! Multi-class focal loss

use ndarray::{Array2, ArrayD};
use serde::Deserialize;

use super::args::LossArgs;
use super::cross_entropy::softmax;
use super::reduction::Reduction;
use super::traits::{as_matrix, LossFn, LossValue, Target};
use crate::error::{Error, Result};

#[derive(Debug, Deserialize)]
#[serde(deny_unknown_fields, default)]
struct FocalArgs {
    alpha: f32,
    gamma: f32,
    reduction: String,
    eps: f32,
}

impl Default for FocalArgs {
    fn default() -> Self {
        Self { alpha: 1.0, gamma: 2.0, reduction: "mean".into(), eps: 1e-8 }
    }
}

/// Focal Loss (RetinaNet, <https://arxiv.org/abs/1708.02002>)
///
/// Cross entropy with a `(1 - p)^gamma` factor that down-weights
/// well-classified samples:
///
/// FL(p_t) = -alpha * (1 - p_t)^gamma * log(p_t)
///
/// Input `(N, C)` logits; target `(N)` class indices, or an `(N, C)` one-hot
/// matrix used as is.
#[derive(Debug, Clone)]
pub struct FocalLoss {
    alpha: f32,
    gamma: f32,
    reduction: Reduction,
    eps: f32,
}

impl Default for FocalLoss {
    fn default() -> Self {
        Self::new(1.0, 2.0, Reduction::Mean, 1e-8)
    }
}

impl FocalLoss {
    pub fn new(alpha: f32, gamma: f32, reduction: Reduction, eps: f32) -> Self {
        Self { alpha, gamma, reduction, eps }
    }

    pub(crate) fn from_args(args: LossArgs) -> Result<Box<dyn LossFn>> {
        args.reject_weight("FocalLoss")?;
        let parsed: FocalArgs = args.parse("FocalLoss")?;
        Ok(Box::new(Self::new(parsed.alpha, parsed.gamma, parsed.reduction.parse()?, parsed.eps)))
    }
}

/// One-hot encode class targets, or pass through targets that already have the input's shape
fn one_hot(target: &Target, n: usize, c: usize) -> Result<Array2<f32>> {
    match target {
        Target::Classes(t) => {
            let mut out = Array2::zeros((n, c));
            for (i, &k) in t.iter().enumerate() {
                if k >= c {
                    return Err(Error::ShapeMismatch(format!(
                        "target {k} is out of bounds for {c} classes"
                    )));
                }
                out[[i, k]] = 1.0;
            }
            Ok(out)
        }
        Target::Dense(t) if t.shape() == [n, c] => Ok(t
            .view()
            .into_dimensionality::<ndarray::Ix2>()
            .map_err(|e| Error::ShapeMismatch(e.to_string()))?
            .to_owned()),
        Target::Dense(t) => Err(Error::ShapeMismatch(format!(
            "one-hot target shape {:?} does not match input shape [{n}, {c}]",
            t.shape()
        ))),
    }
}

impl LossFn for FocalLoss {
    fn forward(&self, input: &ArrayD<f32>, target: &Target) -> Result<LossValue> {
        let x = as_matrix(input)?;
        let (n, c) = x.dim();
        if target.batch_size() != n {
            return Err(Error::ShapeMismatch(format!(
                "Expected input batch_size ({n}) to match target batch_size ({}).",
                target.batch_size()
            )));
        }

        let probs = softmax(&x) + self.eps;
        let targets = one_hot(target, n, c)?;

        let factor = probs.mapv(|p| -self.alpha * (1.0 - p).powf(self.gamma) * p.ln());
        let loss = (&targets * &factor).sum_axis(ndarray::Axis(1));

        Ok(self.reduction.reduce(loss.into_dyn()))
    }

    fn name(&self) -> &'static str {
        "FocalLoss"
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::train::loss::cross_entropy::{log_softmax, nll_loss};
    use approx::assert_relative_eq;
    use ndarray::array;
    use proptest::prelude::*;

    #[test]
    fn test_rank_one_input() {
        let x = array![1.0f32, 2.0].into_dyn();
        let err = FocalLoss::default().forward(&x, &Target::classes(vec![0])).unwrap_err();
        assert!(matches!(err, Error::ShapeMismatch(_)));
    }

    #[test]
    fn test_batch_mismatch() {
        let x = array![[1.0f32, 2.0], [0.0, 1.0]].into_dyn();
        let err = FocalLoss::default().forward(&x, &Target::classes(vec![0])).unwrap_err();
        assert!(err.to_string().contains("to match target batch_size (1)"));
    }

    #[test]
    fn test_focal_below_cross_entropy_for_confident_predictions() {
        let x = array![[4.0f32, 0.0, 0.0]].into_dyn();
        let t = Target::classes(vec![0]);
        let focal = FocalLoss::default().forward(&x, &t).unwrap().scalar().unwrap();
        let ce = FocalLoss::new(1.0, 0.0, Reduction::Mean, 1e-8)
            .forward(&x, &t)
            .unwrap()
            .scalar()
            .unwrap();
        assert!(focal < ce);
        assert!(focal > 0.0);
    }

    #[test]
    fn test_one_hot_dense_target_matches_indices() {
        let x = array![[0.2f32, 1.5, -0.3], [2.0, 0.1, 0.0]].into_dyn();
        let by_index = FocalLoss::default().forward(&x, &Target::classes(vec![1, 0])).unwrap();
        let dense = Target::Dense(array![[0.0f32, 1.0, 0.0], [1.0, 0.0, 0.0]].into_dyn());
        let by_one_hot = FocalLoss::default().forward(&x, &dense).unwrap();
        assert_relative_eq!(by_index.scalar().unwrap(), by_one_hot.scalar().unwrap());
    }

    #[test]
    fn test_reduction_none() {
        let x = array![[0.2f32, 1.5], [2.0, 0.1], [0.0, 0.0]].into_dyn();
        let loss = FocalLoss::new(0.5, 2.0, Reduction::None, 1e-8)
            .forward(&x, &Target::classes(vec![1, 0, 1]))
            .unwrap();
        assert_eq!(loss.unreduced().unwrap().len(), 3);
    }

    #[test]
    fn test_alpha_scales_linearly() {
        let x = array![[0.2f32, 1.5], [2.0, 0.1]].into_dyn();
        let t = Target::classes(vec![0, 1]);
        let one = FocalLoss::new(1.0, 2.0, Reduction::Sum, 1e-8).forward(&x, &t).unwrap();
        let quarter = FocalLoss::new(0.25, 2.0, Reduction::Sum, 1e-8).forward(&x, &t).unwrap();
        assert_relative_eq!(quarter.scalar().unwrap() * 4.0, one.scalar().unwrap(), epsilon = 1e-5);
    }

    proptest! {
        #![proptest_config(ProptestConfig::with_cases(100))]

        #[test]
        fn prop_gamma_zero_is_nll_of_softmax(
            values in proptest::collection::vec(-3.0f32..3.0, 8),
            targets in proptest::collection::vec(0usize..4, 2),
        ) {
            let x = ArrayD::from_shape_vec(vec![2, 4], values).unwrap();
            let t = Target::classes(targets.clone());
            let focal = FocalLoss::new(1.0, 0.0, Reduction::Mean, 1e-8)
                .forward(&x, &t)
                .unwrap()
                .scalar()
                .unwrap();

            let m = as_matrix(&x).unwrap();
            let nll = nll_loss(&log_softmax(&m).view(), &ndarray::Array1::from(targets), None, Reduction::Mean)
                .unwrap()
                .scalar()
                .unwrap();
            prop_assert!((focal - nll).abs() <= 1e-3 * (1.0 + nll.abs()));
        }
    }
}
