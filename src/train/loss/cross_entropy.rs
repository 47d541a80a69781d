//! Cross Entropy Loss for classification

use ndarray::{Array1, Array2, ArrayD, ArrayView2, Axis};
use serde::Deserialize;

use super::args::LossArgs;
use super::reduction::Reduction;
use super::traits::{as_matrix, check_weight, class_targets, LossFn, LossValue, Target};
use crate::error::Result;

/// Row-wise softmax of an `(N, C)` matrix
pub(crate) fn softmax(x: &ArrayView2<'_, f32>) -> Array2<f32> {
    let mut out = x.to_owned();
    for mut row in out.rows_mut() {
        let max = row.iter().fold(f32::NEG_INFINITY, |a, &b| a.max(b));
        row.mapv_inplace(|v| (v - max).exp());
        let sum: f32 = row.sum();
        row.mapv_inplace(|v| v / sum);
    }
    out
}

/// Row-wise log-softmax of an `(N, C)` matrix
pub(crate) fn log_softmax(x: &ArrayView2<'_, f32>) -> Array2<f32> {
    let mut out = x.to_owned();
    for mut row in out.rows_mut() {
        let max = row.iter().fold(f32::NEG_INFINITY, |a, &b| a.max(b));
        let log_sum = row.iter().map(|&v| (v - max).exp()).sum::<f32>().ln() + max;
        row.mapv_inplace(|v| v - log_sum);
    }
    out
}

/// Negative log-likelihood of log-probabilities `log_pred` at `target`.
///
/// With a class weight `w`, each sample contributes `-w[t] * log_pred[t]` and
/// `mean` divides by the summed weights of the targets rather than by `N`.
pub(crate) fn nll_loss(
    log_pred: &ArrayView2<'_, f32>,
    target: &Array1<usize>,
    weight: Option<&Array1<f32>>,
    reduction: Reduction,
) -> Result<LossValue> {
    check_weight(weight, log_pred.ncols())?;
    let w = |k: usize| weight.map_or(1.0, |w| w[k]);

    let losses: Array1<f32> = target
        .iter()
        .enumerate()
        .map(|(i, &k)| -w(k) * log_pred[[i, k]])
        .collect();

    Ok(match reduction {
        Reduction::Mean => {
            let total_weight: f32 = target.iter().map(|&k| w(k)).sum();
            LossValue::Scalar(losses.sum() / total_weight)
        }
        other => other.reduce(losses.into_dyn()),
    })
}

#[derive(Debug, Deserialize)]
#[serde(deny_unknown_fields, default)]
struct CrossEntropyArgs {
    reduction: String,
}

impl Default for CrossEntropyArgs {
    fn default() -> Self {
        Self { reduction: "mean".into() }
    }
}

/// Cross Entropy Loss (for classification)
///
/// L = nll(log_softmax(input), target), optionally weighted per class
///
/// # Example
///
/// ```
/// use ndarray::array;
/// use vendaval::train::{CrossEntropyLoss, LossFn, Target};
///
/// let loss_fn = CrossEntropyLoss::default();
/// let logits = array![[2.0f32, 1.0, 0.5]].into_dyn();
/// let loss = loss_fn.forward(&logits, &Target::classes(vec![0])).unwrap();
/// assert!(loss.scalar().unwrap() > 0.0);
/// ```
#[derive(Debug, Clone, Default)]
pub struct CrossEntropyLoss {
    weight: Option<Array1<f32>>,
    reduction: Reduction,
}

impl CrossEntropyLoss {
    pub fn new(weight: Option<Array1<f32>>, reduction: Reduction) -> Self {
        Self { weight, reduction }
    }

    pub(crate) fn from_args(mut args: LossArgs) -> Result<Box<dyn LossFn>> {
        let parsed: CrossEntropyArgs = args.parse("CrossEntropyLoss")?;
        Ok(Box::new(Self::new(args.take_weight(), parsed.reduction.parse()?)))
    }
}

impl LossFn for CrossEntropyLoss {
    fn forward(&self, input: &ArrayD<f32>, target: &Target) -> Result<LossValue> {
        let x = as_matrix(input)?;
        let t = class_targets(&x, target)?;
        let log_pred = log_softmax(&x);
        nll_loss(&log_pred.view(), t, self.weight.as_ref(), self.reduction)
    }

    fn name(&self) -> &'static str {
        "CrossEntropyLoss"
    }

    fn weight(&self) -> Option<&Array1<f32>> {
        self.weight.as_ref()
    }
}

/// Sum of `-log_pred` over the class axis, one value per sample
pub(crate) fn neg_log_sum(log_pred: &Array2<f32>) -> Array1<f32> {
    -log_pred.sum_axis(Axis(1))
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;
    use ndarray::array;
    use proptest::prelude::*;

    #[test]
    fn test_softmax_rows_sum_to_one() {
        let x = array![[1.0f32, 2.0, 3.0], [1000.0, 1001.0, 1002.0]];
        let probs = softmax(&x.view());
        for row in probs.rows() {
            assert_relative_eq!(row.sum(), 1.0, epsilon = 1e-5);
            assert!(row.iter().all(|p| p.is_finite() && *p >= 0.0));
        }
    }

    #[test]
    fn test_log_softmax_matches_softmax() {
        let x = array![[0.3f32, -1.2, 2.5]];
        let ls = log_softmax(&x.view());
        let s = softmax(&x.view());
        for (a, b) in ls.iter().zip(s.iter()) {
            assert_relative_eq!(a.exp(), *b, epsilon = 1e-6);
        }
    }

    #[test]
    fn test_uniform_logits_give_log_c() {
        let loss_fn = CrossEntropyLoss::default();
        for nc in [2usize, 3, 5, 10] {
            let logits = ArrayD::from_elem(vec![1, nc], 1.0f32);
            let loss = loss_fn.forward(&logits, &Target::classes(vec![0])).unwrap();
            assert_relative_eq!(loss.scalar().unwrap(), (nc as f32).ln(), epsilon = 1e-5);
        }
    }

    #[test]
    fn test_weighted_mean_divides_by_weight_sum() {
        let logits = array![[2.0f32, 0.0], [0.0, 2.0]].into_dyn();
        let target = Target::classes(vec![0, 1]);
        let weight = array![1.0f32, 3.0];

        let per_sample = CrossEntropyLoss::new(None, Reduction::None)
            .forward(&logits, &target)
            .unwrap();
        let per_sample = per_sample.unreduced().unwrap();
        let expected = (per_sample[0] * 1.0 + per_sample[1] * 3.0) / 4.0;

        let weighted = CrossEntropyLoss::new(Some(weight), Reduction::Mean)
            .forward(&logits, &target)
            .unwrap();
        assert_relative_eq!(weighted.scalar().unwrap(), expected, epsilon = 1e-6);
    }

    #[test]
    fn test_weight_length_checked() {
        let logits = array![[2.0f32, 0.0, 1.0]].into_dyn();
        let loss_fn = CrossEntropyLoss::new(Some(array![1.0, 1.0]), Reduction::Mean);
        assert!(loss_fn.forward(&logits, &Target::classes(vec![0])).is_err());
    }

    #[test]
    fn test_dense_targets_rejected() {
        let logits = array![[2.0f32, 0.0]].into_dyn();
        let target = Target::Dense(array![[1.0f32, 0.0]].into_dyn());
        assert!(CrossEntropyLoss::default().forward(&logits, &target).is_err());
    }

    proptest! {
        #![proptest_config(ProptestConfig::with_cases(200))]

        #[test]
        fn prop_ce_non_negative_and_finite(
            nc in 2..=10usize,
            target in 0..10usize,
            scale in 0.1f32..100.0,
            seed in 0..1000u32,
        ) {
            let target = target % nc;
            let logits: Vec<f32> = (0..nc)
                .map(|i| ((i as f32 + seed as f32) * 0.73).cos() * scale)
                .collect();
            let logits = ArrayD::from_shape_vec(vec![1, nc], logits).unwrap();
            let loss = CrossEntropyLoss::default()
                .forward(&logits, &Target::classes(vec![target]))
                .unwrap()
                .scalar()
                .unwrap();
            prop_assert!(loss.is_finite());
            prop_assert!(loss >= -1e-6);
        }
    }
}
