//! Cross entropy against soft (probability) targets

use ndarray::ArrayD;
use serde::Deserialize;

use super::args::LossArgs;
use super::cross_entropy::log_softmax;
use super::traits::{as_matrix, dense_targets, LossFn, LossValue, Target};
use crate::error::Result;

#[derive(Debug, Default, Deserialize)]
#[serde(deny_unknown_fields)]
struct NoArgs {}

/// Soft-target cross entropy, as used with mixup and cutmix
///
/// L = mean_n sum_c -t[n, c] * log_softmax(x)[n, c]
#[derive(Debug, Clone, Copy, Default)]
pub struct SoftTargetCrossEntropy;

impl SoftTargetCrossEntropy {
    pub(crate) fn from_args(args: LossArgs) -> Result<Box<dyn LossFn>> {
        args.reject_weight("SoftTargetCrossEntropy")?;
        let _: NoArgs = args.parse("SoftTargetCrossEntropy")?;
        Ok(Box::new(Self))
    }
}

impl LossFn for SoftTargetCrossEntropy {
    fn forward(&self, input: &ArrayD<f32>, target: &Target) -> Result<LossValue> {
        let x = as_matrix(input)?;
        let t = dense_targets(input, target)?;
        let log_pred = log_softmax(&x).into_dyn();
        let per_sample = (-(t * &log_pred)).sum_axis(ndarray::Axis(1));
        Ok(LossValue::Scalar(per_sample.mean().unwrap_or(f32::NAN)))
    }

    fn name(&self) -> &'static str {
        "SoftTargetCrossEntropy"
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::train::loss::CrossEntropyLoss;
    use approx::assert_relative_eq;
    use ndarray::array;

    #[test]
    fn test_one_hot_matches_cross_entropy() {
        let x = array![[1.0f32, 2.0, 0.5], [0.1, 0.1, 3.0]].into_dyn();
        let soft = Target::Dense(array![[0.0f32, 1.0, 0.0], [0.0, 0.0, 1.0]].into_dyn());
        let hard = Target::classes(vec![1, 2]);

        let a = SoftTargetCrossEntropy.forward(&x, &soft).unwrap().scalar().unwrap();
        let b = CrossEntropyLoss::default().forward(&x, &hard).unwrap().scalar().unwrap();
        assert_relative_eq!(a, b, epsilon = 1e-6);
    }

    #[test]
    fn test_uniform_target_on_uniform_logits() {
        let x = ArrayD::from_elem(vec![2, 4], 0.0f32);
        let t = Target::Dense(ArrayD::from_elem(vec![2, 4], 0.25f32));
        let loss = SoftTargetCrossEntropy.forward(&x, &t).unwrap().scalar().unwrap();
        assert_relative_eq!(loss, 4.0f32.ln(), epsilon = 1e-6);
    }

    #[test]
    fn test_class_targets_rejected() {
        let x = array![[1.0f32, 2.0]].into_dyn();
        assert!(SoftTargetCrossEntropy.forward(&x, &Target::classes(vec![0])).is_err());
    }

    #[test]
    fn test_unexpected_argument() {
        let args = serde_json::json!({"smoothing": 0.1});
        let args = LossArgs::from_init_args(args.as_object()).unwrap();
        assert!(SoftTargetCrossEntropy::from_args(args).is_err());
    }
}
